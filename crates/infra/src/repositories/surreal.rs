//! SurrealDB-backed repositories. Timestamps are stored as native
//! datetimes and travel over the wire as RFC 3339 strings; rows decode
//! through serde into per-table row structs.

use std::sync::Arc;

use kormo_domain::DomainResult;
use kormo_domain::applications::{Application, ApplicationStatus};
use kormo_domain::error::DomainError;
use kormo_domain::jobs::{Job, JobFilter, JobStatus};
use kormo_domain::messaging::Message;
use kormo_domain::payments::Transaction;
use kormo_domain::ports::BoxFuture;
use kormo_domain::ports::applications::ApplicationRepository;
use kormo_domain::ports::jobs::JobRepository;
use kormo_domain::ports::messages::MessageRepository;
use kormo_domain::ports::payments::TransactionRepository;
use kormo_domain::ports::users::UserRepository;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use surrealdb::{
    Surreal,
    engine::remote::ws::{Client, Ws},
    opt::auth::Root,
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::db::DbConfig;

/// Shared connection for all Surreal repositories.
pub async fn connect(db_config: &DbConfig) -> anyhow::Result<Arc<Surreal<Client>>> {
    let db = Surreal::<Client>::init();
    db.connect::<Ws>(&db_config.endpoint).await?;
    db.signin(Root {
        username: &db_config.username,
        password: &db_config.password,
    })
    .await?;
    db.use_ns(&db_config.namespace)
        .use_db(&db_config.database)
        .await?;
    Ok(Arc::new(db))
}

fn to_rfc3339(epoch_ms: i64) -> DomainResult<String> {
    let instant = OffsetDateTime::from_unix_timestamp_nanos(epoch_ms as i128 * 1_000_000)
        .map_err(|err| DomainError::Validation(format!("invalid timestamp: {err}")))?;
    Ok(instant
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string()))
}

fn parse_datetime(value: &str) -> DomainResult<i64> {
    let datetime = OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|err| DomainError::Validation(format!("invalid datetime: {err}")))?;
    Ok((datetime.unix_timestamp_nanos() / 1_000_000) as i64)
}

fn map_surreal_error(err: surrealdb::Error) -> DomainError {
    let error_message = err.to_string().to_lowercase();
    if error_message.contains("already exists")
        || error_message.contains("duplicate")
        || error_message.contains("unique")
        || error_message.contains("conflict")
    {
        return DomainError::Conflict("record already exists".into());
    }
    DomainError::Validation(format!("surreal query failed: {error_message}"))
}

fn take_rows(mut response: surrealdb::Response) -> DomainResult<Vec<Value>> {
    response
        .take(0)
        .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))
}

pub struct SurrealUserRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealUserRepository {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct UserRow {
    user_id: String,
    phone: String,
    role: kormo_domain::users::UserRole,
    name: String,
    business_name: Option<String>,
    location: String,
    languages: Vec<String>,
    skills: Vec<String>,
    free_jobs_remaining: i64,
    created_at: String,
}

fn decode_users(rows: Vec<Value>) -> DomainResult<Vec<kormo_domain::users::User>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value::<UserRow>(row)
                .map_err(|err| DomainError::Validation(format!("invalid user row: {err}")))
                .and_then(|row| {
                    Ok(kormo_domain::users::User {
                        user_id: row.user_id,
                        phone: row.phone,
                        role: row.role,
                        name: row.name,
                        business_name: row.business_name,
                        location: row.location,
                        languages: row.languages,
                        skills: row.skills,
                        free_jobs_remaining: row.free_jobs_remaining,
                        created_at_ms: parse_datetime(&row.created_at)?,
                    })
                })
        })
        .collect()
}

const USER_FIELDS: &str = "user_id,\n\
    phone,\n\
    role,\n\
    name,\n\
    business_name,\n\
    location,\n\
    languages,\n\
    skills,\n\
    free_jobs_remaining,\n\
    type::string(created_at) AS created_at";

impl UserRepository for SurrealUserRepository {
    fn create(
        &self,
        user: &kormo_domain::users::User,
    ) -> BoxFuture<'_, DomainResult<kormo_domain::users::User>> {
        let created_at = match to_rfc3339(user.created_at_ms) {
            Ok(value) => value,
            Err(err) => return Box::pin(async move { Err(err) }),
        };
        let client = self.client.clone();
        let user = user.clone();
        let row = user.clone();
        Box::pin(async move {
            let response = client
                .query(
                    "CREATE user CONTENT {\n\
                        user_id: $user_id,\n\
                        phone: $phone,\n\
                        role: $role,\n\
                        name: $name,\n\
                        business_name: $business_name,\n\
                        location: $location,\n\
                        languages: $languages,\n\
                        skills: $skills,\n\
                        free_jobs_remaining: $free_jobs_remaining,\n\
                        created_at: <datetime>$created_at\n\
                    };",
                )
                .bind(("user_id", row.user_id))
                .bind(("phone", row.phone))
                .bind(("role", row.role))
                .bind(("name", row.name))
                .bind(("business_name", row.business_name))
                .bind(("location", row.location))
                .bind(("languages", row.languages))
                .bind(("skills", row.skills))
                .bind(("free_jobs_remaining", row.free_jobs_remaining))
                .bind(("created_at", created_at))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(user)
        })
    }

    fn get(
        &self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<kormo_domain::users::User>>> {
        let user_id = user_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query(format!(
                    "SELECT {USER_FIELDS} FROM user WHERE user_id = $user_id LIMIT 1"
                ))
                .bind(("user_id", user_id))
                .await
                .map_err(map_surreal_error)?;
            Ok(decode_users(take_rows(response)?)?.into_iter().next())
        })
    }

    fn update(
        &self,
        user: &kormo_domain::users::User,
    ) -> BoxFuture<'_, DomainResult<kormo_domain::users::User>> {
        let client = self.client.clone();
        let user = user.clone();
        let row = user.clone();
        Box::pin(async move {
            let response = client
                .query(
                    "UPDATE user SET\n\
                        phone = $phone,\n\
                        role = $role,\n\
                        name = $name,\n\
                        business_name = $business_name,\n\
                        location = $location,\n\
                        languages = $languages,\n\
                        skills = $skills\n\
                     WHERE user_id = $user_id RETURN AFTER;",
                )
                .bind(("user_id", row.user_id))
                .bind(("phone", row.phone))
                .bind(("role", row.role))
                .bind(("name", row.name))
                .bind(("business_name", row.business_name))
                .bind(("location", row.location))
                .bind(("languages", row.languages))
                .bind(("skills", row.skills))
                .await
                .map_err(map_surreal_error)?;
            let rows = take_rows(response)?;
            if rows.is_empty() {
                return Err(DomainError::NotFound);
            }
            Ok(user)
        })
    }

    fn find_by_phone(
        &self,
        phone: &str,
    ) -> BoxFuture<'_, DomainResult<Option<kormo_domain::users::User>>> {
        let phone = phone.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query(format!(
                    "SELECT {USER_FIELDS} FROM user WHERE phone = $phone LIMIT 1"
                ))
                .bind(("phone", phone))
                .await
                .map_err(map_surreal_error)?;
            Ok(decode_users(take_rows(response)?)?.into_iter().next())
        })
    }

    fn adjust_free_jobs(
        &self,
        user_id: &str,
        delta: i64,
    ) -> BoxFuture<'_, DomainResult<kormo_domain::users::User>> {
        let user_id = user_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query(
                    "UPDATE user SET free_jobs_remaining += $delta \
                     WHERE user_id = $user_id RETURN AFTER;",
                )
                .bind(("user_id", user_id.clone()))
                .bind(("delta", delta))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            let response = client
                .query(format!(
                    "SELECT {USER_FIELDS} FROM user WHERE user_id = $user_id LIMIT 1"
                ))
                .bind(("user_id", user_id))
                .await
                .map_err(map_surreal_error)?;
            decode_users(take_rows(response)?)?
                .into_iter()
                .next()
                .ok_or(DomainError::NotFound)
        })
    }
}

pub struct SurrealJobRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealJobRepository {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JobRow {
    job_id: String,
    title: String,
    category: String,
    description: String,
    salary: String,
    location: String,
    job_type: String,
    experience: String,
    education: String,
    languages: Vec<String>,
    skills: Vec<String>,
    employer_id: String,
    employer_name: String,
    employer_phone: String,
    business_name: Option<String>,
    posted_at: String,
    status: JobStatus,
    is_paid: bool,
    applications_count: i64,
}

fn decode_jobs(rows: Vec<Value>) -> DomainResult<Vec<Job>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value::<JobRow>(row)
                .map_err(|err| DomainError::Validation(format!("invalid job row: {err}")))
                .and_then(|row| {
                    Ok(Job {
                        job_id: row.job_id,
                        title: row.title,
                        category: row.category,
                        description: row.description,
                        salary: row.salary,
                        location: row.location,
                        job_type: row.job_type,
                        experience: row.experience,
                        education: row.education,
                        languages: row.languages,
                        skills: row.skills,
                        employer_id: row.employer_id,
                        employer_name: row.employer_name,
                        employer_phone: row.employer_phone,
                        business_name: row.business_name,
                        posted_at_ms: parse_datetime(&row.posted_at)?,
                        status: row.status,
                        is_paid: row.is_paid,
                        applications_count: row.applications_count,
                    })
                })
        })
        .collect()
}

const JOB_FIELDS: &str = "job_id,\n\
    title,\n\
    category,\n\
    description,\n\
    salary,\n\
    location,\n\
    job_type,\n\
    experience,\n\
    education,\n\
    languages,\n\
    skills,\n\
    employer_id,\n\
    employer_name,\n\
    employer_phone,\n\
    business_name,\n\
    type::string(posted_at) AS posted_at,\n\
    status,\n\
    is_paid,\n\
    applications_count";

impl JobRepository for SurrealJobRepository {
    fn create(&self, job: &Job) -> BoxFuture<'_, DomainResult<Job>> {
        let posted_at = match to_rfc3339(job.posted_at_ms) {
            Ok(value) => value,
            Err(err) => return Box::pin(async move { Err(err) }),
        };
        let client = self.client.clone();
        let job = job.clone();
        let row = job.clone();
        Box::pin(async move {
            let response = client
                .query(
                    "CREATE job CONTENT {\n\
                        job_id: $job_id,\n\
                        title: $title,\n\
                        category: $category,\n\
                        description: $description,\n\
                        salary: $salary,\n\
                        location: $location,\n\
                        job_type: $job_type,\n\
                        experience: $experience,\n\
                        education: $education,\n\
                        languages: $languages,\n\
                        skills: $skills,\n\
                        employer_id: $employer_id,\n\
                        employer_name: $employer_name,\n\
                        employer_phone: $employer_phone,\n\
                        business_name: $business_name,\n\
                        posted_at: <datetime>$posted_at,\n\
                        status: $status,\n\
                        is_paid: $is_paid,\n\
                        applications_count: $applications_count\n\
                    };",
                )
                .bind(("job_id", row.job_id))
                .bind(("title", row.title))
                .bind(("category", row.category))
                .bind(("description", row.description))
                .bind(("salary", row.salary))
                .bind(("location", row.location))
                .bind(("job_type", row.job_type))
                .bind(("experience", row.experience))
                .bind(("education", row.education))
                .bind(("languages", row.languages))
                .bind(("skills", row.skills))
                .bind(("employer_id", row.employer_id))
                .bind(("employer_name", row.employer_name))
                .bind(("employer_phone", row.employer_phone))
                .bind(("business_name", row.business_name))
                .bind(("posted_at", posted_at))
                .bind(("status", row.status))
                .bind(("is_paid", row.is_paid))
                .bind(("applications_count", row.applications_count))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(job)
        })
    }

    fn get(&self, job_id: &str) -> BoxFuture<'_, DomainResult<Option<Job>>> {
        let job_id = job_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query(format!(
                    "SELECT {JOB_FIELDS} FROM job WHERE job_id = $job_id LIMIT 1"
                ))
                .bind(("job_id", job_id))
                .await
                .map_err(map_surreal_error)?;
            Ok(decode_jobs(take_rows(response)?)?.into_iter().next())
        })
    }

    fn list_active(
        &self,
        filter: &JobFilter,
        limit: usize,
    ) -> BoxFuture<'_, DomainResult<Vec<Job>>> {
        let filter = filter.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let mut conditions = vec!["status = \"active\"".to_string()];
            if filter.category.is_some() {
                conditions.push("category = $category".to_string());
            }
            if filter.location.is_some() {
                conditions.push(
                    "string::contains(string::lowercase(location), string::lowercase($location))"
                        .to_string(),
                );
            }
            if filter.job_type.is_some() {
                conditions.push("job_type = $job_type".to_string());
            }
            if filter.experience.is_some() {
                conditions.push("experience = $experience".to_string());
            }
            if filter.education.is_some() {
                conditions.push("education = $education".to_string());
            }
            if filter.language.is_some() {
                conditions.push("$language IN languages".to_string());
            }
            if filter.skill.is_some() {
                conditions.push(
                    "string::contains(string::lowercase(array::join(skills, \",\")), string::lowercase($skill))"
                        .to_string(),
                );
            }
            if filter.search.is_some() {
                conditions.push(
                    "(string::contains(string::lowercase(title), string::lowercase($search)) \
                     OR string::contains(string::lowercase(description), string::lowercase($search)))"
                        .to_string(),
                );
            }

            let query_sql = format!(
                "SELECT {JOB_FIELDS} FROM job WHERE {} \
                 ORDER BY posted_at DESC, job_id DESC LIMIT $limit",
                conditions.join(" AND ")
            );

            let mut query_handle = client.query(query_sql).bind(("limit", limit as i64));
            if let Some(category) = filter.category {
                query_handle = query_handle.bind(("category", category));
            }
            if let Some(location) = filter.location {
                query_handle = query_handle.bind(("location", location));
            }
            if let Some(job_type) = filter.job_type {
                query_handle = query_handle.bind(("job_type", job_type));
            }
            if let Some(experience) = filter.experience {
                query_handle = query_handle.bind(("experience", experience));
            }
            if let Some(education) = filter.education {
                query_handle = query_handle.bind(("education", education));
            }
            if let Some(language) = filter.language {
                query_handle = query_handle.bind(("language", language));
            }
            if let Some(skill) = filter.skill {
                query_handle = query_handle.bind(("skill", skill));
            }
            if let Some(search) = filter.search {
                query_handle = query_handle.bind(("search", search));
            }

            let response = query_handle.await.map_err(map_surreal_error)?;
            decode_jobs(take_rows(response)?)
        })
    }

    fn list_by_employer(&self, employer_id: &str) -> BoxFuture<'_, DomainResult<Vec<Job>>> {
        let employer_id = employer_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query(format!(
                    "SELECT {JOB_FIELDS} FROM job WHERE employer_id = $employer_id \
                     ORDER BY posted_at DESC, job_id DESC"
                ))
                .bind(("employer_id", employer_id))
                .await
                .map_err(map_surreal_error)?;
            decode_jobs(take_rows(response)?)
        })
    }

    fn set_status(&self, job_id: &str, status: JobStatus) -> BoxFuture<'_, DomainResult<bool>> {
        let job_id = job_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query("UPDATE job SET status = $status WHERE job_id = $job_id RETURN AFTER;")
                .bind(("job_id", job_id))
                .bind(("status", status))
                .await
                .map_err(map_surreal_error)?;
            Ok(!take_rows(response)?.is_empty())
        })
    }

    fn increment_applications(&self, job_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let job_id = job_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query("UPDATE job SET applications_count += 1 WHERE job_id = $job_id;")
                .bind(("job_id", job_id))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(())
        })
    }
}

pub struct SurrealApplicationRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealApplicationRepository {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ApplicationRow {
    application_id: String,
    job_id: String,
    cover_letter: Option<String>,
    seeker_id: String,
    seeker_name: String,
    seeker_phone: String,
    seeker_skills: Vec<String>,
    status: ApplicationStatus,
    applied_at: String,
}

fn decode_applications(rows: Vec<Value>) -> DomainResult<Vec<Application>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value::<ApplicationRow>(row)
                .map_err(|err| {
                    DomainError::Validation(format!("invalid application row: {err}"))
                })
                .and_then(|row| {
                    Ok(Application {
                        application_id: row.application_id,
                        job_id: row.job_id,
                        cover_letter: row.cover_letter,
                        seeker_id: row.seeker_id,
                        seeker_name: row.seeker_name,
                        seeker_phone: row.seeker_phone,
                        seeker_skills: row.seeker_skills,
                        status: row.status,
                        applied_at_ms: parse_datetime(&row.applied_at)?,
                    })
                })
        })
        .collect()
}

const APPLICATION_FIELDS: &str = "application_id,\n\
    job_id,\n\
    cover_letter,\n\
    seeker_id,\n\
    seeker_name,\n\
    seeker_phone,\n\
    seeker_skills,\n\
    status,\n\
    type::string(applied_at) AS applied_at";

impl ApplicationRepository for SurrealApplicationRepository {
    fn create(&self, application: &Application) -> BoxFuture<'_, DomainResult<Application>> {
        let applied_at = match to_rfc3339(application.applied_at_ms) {
            Ok(value) => value,
            Err(err) => return Box::pin(async move { Err(err) }),
        };
        let client = self.client.clone();
        let application = application.clone();
        let row = application.clone();
        Box::pin(async move {
            let response = client
                .query(
                    "CREATE application CONTENT {\n\
                        application_id: $application_id,\n\
                        job_id: $job_id,\n\
                        cover_letter: $cover_letter,\n\
                        seeker_id: $seeker_id,\n\
                        seeker_name: $seeker_name,\n\
                        seeker_phone: $seeker_phone,\n\
                        seeker_skills: $seeker_skills,\n\
                        status: $status,\n\
                        applied_at: <datetime>$applied_at\n\
                    };",
                )
                .bind(("application_id", row.application_id))
                .bind(("job_id", row.job_id))
                .bind(("cover_letter", row.cover_letter))
                .bind(("seeker_id", row.seeker_id))
                .bind(("seeker_name", row.seeker_name))
                .bind(("seeker_phone", row.seeker_phone))
                .bind(("seeker_skills", row.seeker_skills))
                .bind(("status", row.status))
                .bind(("applied_at", applied_at))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(application)
        })
    }

    fn find_by_job_and_seeker(
        &self,
        job_id: &str,
        seeker_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Application>>> {
        let job_id = job_id.to_string();
        let seeker_id = seeker_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query(format!(
                    "SELECT {APPLICATION_FIELDS} FROM application \
                     WHERE job_id = $job_id AND seeker_id = $seeker_id LIMIT 1"
                ))
                .bind(("job_id", job_id))
                .bind(("seeker_id", seeker_id))
                .await
                .map_err(map_surreal_error)?;
            Ok(decode_applications(take_rows(response)?)?
                .into_iter()
                .next())
        })
    }

    fn list_by_job(&self, job_id: &str) -> BoxFuture<'_, DomainResult<Vec<Application>>> {
        let job_id = job_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query(format!(
                    "SELECT {APPLICATION_FIELDS} FROM application WHERE job_id = $job_id \
                     ORDER BY applied_at DESC, application_id DESC"
                ))
                .bind(("job_id", job_id))
                .await
                .map_err(map_surreal_error)?;
            decode_applications(take_rows(response)?)
        })
    }

    fn list_by_seeker(&self, seeker_id: &str) -> BoxFuture<'_, DomainResult<Vec<Application>>> {
        let seeker_id = seeker_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query(format!(
                    "SELECT {APPLICATION_FIELDS} FROM application WHERE seeker_id = $seeker_id \
                     ORDER BY applied_at DESC, application_id DESC"
                ))
                .bind(("seeker_id", seeker_id))
                .await
                .map_err(map_surreal_error)?;
            decode_applications(take_rows(response)?)
        })
    }

    fn set_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
    ) -> BoxFuture<'_, DomainResult<bool>> {
        let application_id = application_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query(
                    "UPDATE application SET status = $status \
                     WHERE application_id = $application_id RETURN AFTER;",
                )
                .bind(("application_id", application_id))
                .bind(("status", status))
                .await
                .map_err(map_surreal_error)?;
            Ok(!take_rows(response)?.is_empty())
        })
    }
}

pub struct SurrealMessageRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealMessageRepository {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MessageRow {
    message_id: String,
    sender_id: String,
    receiver_id: String,
    job_id: String,
    body: String,
    sent_at: String,
    read: bool,
}

fn decode_messages(rows: Vec<Value>) -> DomainResult<Vec<Message>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value::<MessageRow>(row)
                .map_err(|err| DomainError::Validation(format!("invalid message row: {err}")))
                .and_then(|row| {
                    Ok(Message {
                        message_id: row.message_id,
                        sender_id: row.sender_id,
                        receiver_id: row.receiver_id,
                        job_id: row.job_id,
                        body: row.body,
                        sent_at_ms: parse_datetime(&row.sent_at)?,
                        read: row.read,
                    })
                })
        })
        .collect()
}

const MESSAGE_FIELDS: &str = "message_id,\n\
    sender_id,\n\
    receiver_id,\n\
    job_id,\n\
    body,\n\
    type::string(sent_at) AS sent_at,\n\
    read";

impl MessageRepository for SurrealMessageRepository {
    fn create(&self, message: &Message) -> BoxFuture<'_, DomainResult<Message>> {
        let sent_at = match to_rfc3339(message.sent_at_ms) {
            Ok(value) => value,
            Err(err) => return Box::pin(async move { Err(err) }),
        };
        let client = self.client.clone();
        let message = message.clone();
        let row = message.clone();
        Box::pin(async move {
            let response = client
                .query(
                    "CREATE message CONTENT {\n\
                        message_id: $message_id,\n\
                        sender_id: $sender_id,\n\
                        receiver_id: $receiver_id,\n\
                        job_id: $job_id,\n\
                        body: $body,\n\
                        sent_at: <datetime>$sent_at,\n\
                        read: $read\n\
                    };",
                )
                .bind(("message_id", row.message_id))
                .bind(("sender_id", row.sender_id))
                .bind(("receiver_id", row.receiver_id))
                .bind(("job_id", row.job_id))
                .bind(("body", row.body))
                .bind(("sent_at", sent_at))
                .bind(("read", row.read))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(message)
        })
    }

    fn list_between(
        &self,
        user_id: &str,
        other_user_id: &str,
        limit: usize,
    ) -> BoxFuture<'_, DomainResult<Vec<Message>>> {
        let a = user_id.to_string();
        let b = other_user_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query(format!(
                    "SELECT {MESSAGE_FIELDS} FROM message WHERE \
                     (sender_id = $a AND receiver_id = $b) OR \
                     (sender_id = $b AND receiver_id = $a) \
                     ORDER BY sent_at ASC, message_id ASC LIMIT $limit"
                ))
                .bind(("a", a))
                .bind(("b", b))
                .bind(("limit", limit as i64))
                .await
                .map_err(map_surreal_error)?;
            decode_messages(take_rows(response)?)
        })
    }

    fn list_involving(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Message>>> {
        let user_id = user_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query(format!(
                    "SELECT {MESSAGE_FIELDS} FROM message WHERE \
                     sender_id = $user_id OR receiver_id = $user_id \
                     ORDER BY sent_at DESC, message_id DESC"
                ))
                .bind(("user_id", user_id))
                .await
                .map_err(map_surreal_error)?;
            decode_messages(take_rows(response)?)
        })
    }
}

pub struct SurrealTransactionRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealTransactionRepository {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }
}

impl TransactionRepository for SurrealTransactionRepository {
    fn create(&self, transaction: &Transaction) -> BoxFuture<'_, DomainResult<Transaction>> {
        let created_at = match to_rfc3339(transaction.created_at_ms) {
            Ok(value) => value,
            Err(err) => return Box::pin(async move { Err(err) }),
        };
        let client = self.client.clone();
        let transaction = transaction.clone();
        let row = transaction.clone();
        Box::pin(async move {
            let response = client
                .query(
                    "CREATE payment_txn CONTENT {\n\
                        transaction_id: $transaction_id,\n\
                        employer_id: $employer_id,\n\
                        amount: $amount,\n\
                        order_id: $order_id,\n\
                        payment_id: $payment_id,\n\
                        status: $status,\n\
                        created_at: <datetime>$created_at\n\
                    };",
                )
                .bind(("transaction_id", row.transaction_id))
                .bind(("employer_id", row.employer_id))
                .bind(("amount", row.amount))
                .bind(("order_id", row.order_id))
                .bind(("payment_id", row.payment_id))
                .bind(("status", row.status))
                .bind(("created_at", created_at))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(transaction)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_round_trip_preserves_millis() {
        let formatted = to_rfc3339(1_700_000_000_123).expect("formatted");
        assert_eq!(parse_datetime(&formatted).expect("parsed"), 1_700_000_000_123);
    }

    #[test]
    fn parse_datetime_rejects_garbage() {
        assert!(parse_datetime("not-a-date").is_err());
    }
}
