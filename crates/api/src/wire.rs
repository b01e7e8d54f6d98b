//! JSON shapes exposed to clients. Field names are camelCase and
//! timestamps are RFC 3339 strings; internal models stay snake_case
//! with epoch-millisecond timestamps.

use kormo_domain::applications::{Application, ApplicationStatus};
use kormo_domain::jobs::{Job, JobStatus};
use kormo_domain::messaging::{ConversationSummary, Message};
use kormo_domain::users::{User, UserRole};
use kormo_domain::util::format_ms_rfc3339;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub phone: String,
    pub role: UserRole,
    pub name: String,
    pub business_name: Option<String>,
    pub location: String,
    pub languages: Vec<String>,
    pub skills: Vec<String>,
    pub free_jobs_remaining: i64,
    pub created_at: String,
}

impl UserView {
    pub fn from_user(user: User) -> Self {
        Self {
            id: user.user_id,
            phone: user.phone,
            role: user.role,
            name: user.name,
            business_name: user.business_name,
            location: user.location,
            languages: user.languages,
            skills: user.skills,
            free_jobs_remaining: user.free_jobs_remaining,
            created_at: format_ms_rfc3339(user.created_at_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub salary: String,
    pub location: String,
    pub job_type: String,
    pub experience: String,
    pub education: String,
    pub languages: Vec<String>,
    pub skills: Vec<String>,
    pub employer_id: String,
    pub employer_name: String,
    pub employer_phone: String,
    pub business_name: Option<String>,
    pub posted_at: String,
    pub status: JobStatus,
    pub is_paid: bool,
    pub applications_count: i64,
}

impl JobView {
    pub fn from_job(job: Job) -> Self {
        Self {
            id: job.job_id,
            title: job.title,
            category: job.category,
            description: job.description,
            salary: job.salary,
            location: job.location,
            job_type: job.job_type,
            experience: job.experience,
            education: job.education,
            languages: job.languages,
            skills: job.skills,
            employer_id: job.employer_id,
            employer_name: job.employer_name,
            employer_phone: job.employer_phone,
            business_name: job.business_name,
            posted_at: format_ms_rfc3339(job.posted_at_ms),
            status: job.status,
            is_paid: job.is_paid,
            applications_count: job.applications_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub id: String,
    pub job_id: String,
    pub cover_letter: Option<String>,
    pub seeker_id: String,
    pub seeker_name: String,
    pub seeker_phone: String,
    pub seeker_skills: Vec<String>,
    pub status: ApplicationStatus,
    pub applied_at: String,
}

impl ApplicationView {
    pub fn from_application(application: Application) -> Self {
        Self {
            id: application.application_id,
            job_id: application.job_id,
            cover_letter: application.cover_letter,
            seeker_id: application.seeker_id,
            seeker_name: application.seeker_name,
            seeker_phone: application.seeker_phone,
            seeker_skills: application.seeker_skills,
            status: application.status,
            applied_at: format_ms_rfc3339(application.applied_at_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub job_id: String,
    pub message: String,
    pub timestamp: String,
    pub read: bool,
}

impl MessageView {
    pub fn from_message(message: &Message) -> Self {
        Self {
            id: message.message_id.clone(),
            sender_id: message.sender_id.clone(),
            receiver_id: message.receiver_id.clone(),
            job_id: message.job_id.clone(),
            message: message.body.clone(),
            timestamp: format_ms_rfc3339(message.sent_at_ms),
            read: message.read,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub user_id: String,
    pub user_name: String,
    pub last_message: MessageView,
}

impl ConversationView {
    pub fn from_summary(summary: ConversationSummary) -> Self {
        Self {
            user_id: summary.counterpart_id,
            user_name: summary.counterpart_name,
            last_message: MessageView::from_message(&summary.last_message),
        }
    }
}

/// Frames pushed to a live socket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WsServerEvent {
    NewMessage(MessageView),
    Pong,
}

/// Frames accepted from a live socket. Anything else is discarded.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsClientEvent {
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> Message {
        Message {
            message_id: "m1".into(),
            sender_id: "alice".into(),
            receiver_id: "bob".into(),
            job_id: "job1".into(),
            body: "hello".into(),
            sent_at_ms: 0,
            read: false,
        }
    }

    #[test]
    fn message_view_uses_camel_case_and_rfc3339() {
        let view = MessageView::from_message(&sample_message());
        let value = serde_json::to_value(&view).expect("serialized");
        assert_eq!(value["senderId"], "alice");
        assert_eq!(value["receiverId"], "bob");
        assert_eq!(value["jobId"], "job1");
        assert_eq!(value["message"], "hello");
        assert_eq!(value["timestamp"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn new_message_frame_is_enveloped() {
        let frame = WsServerEvent::NewMessage(MessageView::from_message(&sample_message()));
        let value = serde_json::to_value(&frame).expect("serialized");
        assert_eq!(value["type"], "new_message");
        assert_eq!(value["payload"]["senderId"], "alice");
    }

    #[test]
    fn pong_frame_has_no_payload() {
        let value = serde_json::to_value(&WsServerEvent::Pong).expect("serialized");
        assert_eq!(value, serde_json::json!({ "type": "pong" }));
    }

    #[test]
    fn ping_frame_parses_and_unknown_frames_do_not() {
        let ping: WsClientEvent = serde_json::from_str(r#"{"type":"ping"}"#).expect("parsed");
        assert_eq!(ping, WsClientEvent::Ping);
        assert!(serde_json::from_str::<WsClientEvent>(r#"{"type":"shout"}"#).is_err());
        assert!(serde_json::from_str::<WsClientEvent>("not json").is_err());
    }
}
