use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::{
    Json, Router,
    response::Response,
    routing::{get, post, put},
};
use futures_util::{SinkExt, StreamExt};
use kormo_domain::{
    applications::{ApplicationCreate, ApplicationService, ApplicationStatus},
    jobs::{JobCreate, JobFilter, JobService, JobStatus},
    messaging::{MessageSendInput, MessageService},
    payments::{PaymentService, PaymentVerifyInput},
    users::{UserCreate, UserRole, UserService},
    util::{format_ms_rfc3339, now_ms},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use validator::Validate;

use crate::error::{ApiError, map_domain_error};
use crate::wire::{
    ApplicationView, ConversationView, JobView, MessageView, UserView, WsClientEvent,
    WsServerEvent,
};
use crate::{middleware as app_middleware, state::AppState, validation};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/send-otp", post(send_otp))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/users", post(create_user))
        .route("/api/users/:user_id", get(get_user).put(update_user))
        .route("/api/jobs", post(create_job).get(list_jobs))
        .route("/api/jobs/:job_id", get(get_job))
        .route("/api/jobs/:job_id/status", put(update_job_status))
        .route("/api/jobs/employer/:employer_id", get(list_employer_jobs))
        .route("/api/applications", post(create_application))
        .route("/api/applications/job/:job_id", get(list_job_applications))
        .route(
            "/api/applications/seeker/:seeker_id",
            get(list_seeker_applications),
        )
        .route(
            "/api/applications/:application_id/status",
            put(update_application_status),
        )
        .route("/api/messages", post(create_message))
        .route("/api/messages/:user_id", get(list_user_messages))
        .route(
            "/api/messages/conversations/:user_id",
            get(list_conversations),
        )
        .route("/api/payments/create-order", post(create_payment_order))
        .route("/api/payments/verify", post(verify_payment))
        .route("/ws/:user_id", get(live_socket))
        .layer(app_middleware::timeout_layer())
        .layer(app_middleware::trace_layer())
        .layer(app_middleware::set_request_id_layer())
        .layer(app_middleware::propagate_request_id_layer())
        .layer(app_middleware::cors_layer())
        .with_state(state)
}

fn user_service(state: &AppState) -> UserService {
    UserService::new(state.users.clone())
}

fn job_service(state: &AppState) -> JobService {
    JobService::new(state.jobs.clone(), state.users.clone())
}

fn application_service(state: &AppState) -> ApplicationService {
    ApplicationService::new(
        state.applications.clone(),
        state.jobs.clone(),
        state.users.clone(),
    )
}

fn message_service(state: &AppState) -> MessageService {
    MessageService::new(
        state.messages.clone(),
        state.users.clone(),
        Arc::new(state.registry.clone()),
    )
}

fn payment_service(state: &AppState) -> PaymentService {
    PaymentService::new(state.users.clone(), state.transactions.clone())
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match state.adapter.health_check().await {
        Ok(()) => "connected",
        Err(err) => {
            tracing::warn!(adapter = state.adapter.name(), error = %err, "store unreachable");
            "disconnected"
        }
    };
    Json(json!({
        "status": if database == "connected" { "healthy" } else { "degraded" },
        "database": database,
        "service": env!("CARGO_PKG_NAME"),
        "timestamp": format_ms_rfc3339(now_ms()),
    }))
}

#[derive(Debug, Deserialize, Validate)]
struct OtpSendRequest {
    #[validate(length(min = 1, max = 20))]
    phone: String,
}

/// Mock OTP: nothing is dispatched, any six-digit code verifies.
async fn send_otp(Json(payload): Json<OtpSendRequest>) -> Result<Json<Value>, ApiError> {
    validation::validate(&payload)?;
    Ok(Json(json!({
        "success": true,
        "message": "OTP sent successfully. Use 123456 for testing",
    })))
}

#[derive(Debug, Deserialize)]
struct OtpVerifyRequest {
    phone: String,
    otp: String,
}

async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<OtpVerifyRequest>,
) -> Result<Json<Value>, ApiError> {
    if payload.otp.chars().count() != 6 {
        return Ok(Json(json!({ "success": false, "message": "Invalid OTP" })));
    }
    let user = user_service(&state)
        .find_by_phone(&payload.phone)
        .await
        .map_err(map_domain_error)?;
    match user {
        Some(user) => Ok(Json(json!({
            "success": true,
            "user": UserView::from_user(user),
            "isNewUser": false,
        }))),
        None => Ok(Json(json!({ "success": true, "isNewUser": true }))),
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UserRequest {
    #[validate(length(min = 1, max = 20))]
    phone: String,
    role: UserRole,
    #[validate(length(min = 1, max = 100))]
    name: String,
    business_name: Option<String>,
    #[serde(default)]
    location: String,
    #[serde(default)]
    languages: Vec<String>,
    #[serde(default)]
    skills: Vec<String>,
}

impl UserRequest {
    fn into_input(self) -> UserCreate {
        UserCreate {
            phone: self.phone,
            role: self.role,
            name: self.name,
            business_name: self.business_name,
            location: self.location,
            languages: self.languages,
            skills: self.skills,
        }
    }
}

async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserRequest>,
) -> Result<Json<UserView>, ApiError> {
    validation::validate(&payload)?;
    let user = user_service(&state)
        .register(payload.into_input())
        .await
        .map_err(map_domain_error)?;
    Ok(Json(UserView::from_user(user)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    let user = user_service(&state)
        .get(&user_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(UserView::from_user(user)))
}

async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<UserRequest>,
) -> Result<Json<UserView>, ApiError> {
    validation::validate(&payload)?;
    let user = user_service(&state)
        .update(&user_id, payload.into_input())
        .await
        .map_err(map_domain_error)?;
    Ok(Json(UserView::from_user(user)))
}

#[derive(Debug, Deserialize)]
struct EmployerQuery {
    employer_id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct JobRequest {
    #[validate(length(min = 1, max = 200))]
    title: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    salary: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    job_type: String,
    #[serde(default)]
    experience: String,
    #[serde(default)]
    education: String,
    #[serde(default)]
    languages: Vec<String>,
    #[serde(default)]
    skills: Vec<String>,
}

impl JobRequest {
    fn into_input(self) -> JobCreate {
        JobCreate {
            title: self.title,
            category: self.category,
            description: self.description,
            salary: self.salary,
            location: self.location,
            job_type: self.job_type,
            experience: self.experience,
            education: self.education,
            languages: self.languages,
            skills: self.skills,
        }
    }
}

async fn create_job(
    State(state): State<AppState>,
    Query(query): Query<EmployerQuery>,
    Json(payload): Json<JobRequest>,
) -> Result<Json<JobView>, ApiError> {
    validation::validate(&payload)?;
    let job = job_service(&state)
        .post(&query.employer_id, payload.into_input())
        .await
        .map_err(map_domain_error)?;
    Ok(Json(JobView::from_job(job)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobListQuery {
    category: Option<String>,
    location: Option<String>,
    job_type: Option<String>,
    experience: Option<String>,
    education: Option<String>,
    language: Option<String>,
    skill: Option<String>,
    search: Option<String>,
}

impl JobListQuery {
    fn into_filter(self) -> JobFilter {
        JobFilter {
            category: self.category,
            location: self.location,
            job_type: self.job_type,
            experience: self.experience,
            education: self.education,
            language: self.language,
            skill: self.skill,
            search: self.search,
        }
    }
}

async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Result<Json<Vec<JobView>>, ApiError> {
    let jobs = job_service(&state)
        .list(query.into_filter())
        .await
        .map_err(map_domain_error)?;
    Ok(Json(jobs.into_iter().map(JobView::from_job).collect()))
}

async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    let job = job_service(&state)
        .get(&job_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(JobView::from_job(job)))
}

async fn list_employer_jobs(
    State(state): State<AppState>,
    Path(employer_id): Path<String>,
) -> Result<Json<Vec<JobView>>, ApiError> {
    let jobs = job_service(&state)
        .list_by_employer(&employer_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(jobs.into_iter().map(JobView::from_job).collect()))
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    status: String,
}

fn parse_job_status(status: &str) -> Result<JobStatus, ApiError> {
    match status {
        "active" => Ok(JobStatus::Active),
        "filled" => Ok(JobStatus::Filled),
        "closed" => Ok(JobStatus::Closed),
        other => Err(ApiError::Validation(format!("unknown job status: {other}"))),
    }
}

async fn update_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Value>, ApiError> {
    let status = parse_job_status(&query.status)?;
    job_service(&state)
        .set_status(&job_id, status)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
struct SeekerQuery {
    seeker_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationRequest {
    job_id: String,
    cover_letter: Option<String>,
}

async fn create_application(
    State(state): State<AppState>,
    Query(query): Query<SeekerQuery>,
    Json(payload): Json<ApplicationRequest>,
) -> Result<Json<ApplicationView>, ApiError> {
    let application = application_service(&state)
        .apply(
            &query.seeker_id,
            ApplicationCreate {
                job_id: payload.job_id,
                cover_letter: payload.cover_letter,
            },
        )
        .await
        .map_err(map_domain_error)?;
    Ok(Json(ApplicationView::from_application(application)))
}

async fn list_job_applications(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Vec<ApplicationView>>, ApiError> {
    let applications = application_service(&state)
        .list_by_job(&job_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(
        applications
            .into_iter()
            .map(ApplicationView::from_application)
            .collect(),
    ))
}

async fn list_seeker_applications(
    State(state): State<AppState>,
    Path(seeker_id): Path<String>,
) -> Result<Json<Vec<ApplicationView>>, ApiError> {
    let applications = application_service(&state)
        .list_by_seeker(&seeker_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(
        applications
            .into_iter()
            .map(ApplicationView::from_application)
            .collect(),
    ))
}

fn parse_application_status(status: &str) -> Result<ApplicationStatus, ApiError> {
    match status {
        "pending" => Ok(ApplicationStatus::Pending),
        "shortlisted" => Ok(ApplicationStatus::Shortlisted),
        "rejected" => Ok(ApplicationStatus::Rejected),
        other => Err(ApiError::Validation(format!(
            "unknown application status: {other}"
        ))),
    }
}

async fn update_application_status(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Value>, ApiError> {
    let status = parse_application_status(&query.status)?;
    application_service(&state)
        .set_status(&application_id, status)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
struct SenderQuery {
    sender_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRequest {
    receiver_id: String,
    #[serde(default)]
    job_id: String,
    message: String,
}

async fn create_message(
    State(state): State<AppState>,
    Query(query): Query<SenderQuery>,
    Json(payload): Json<MessageRequest>,
) -> Result<Json<MessageView>, ApiError> {
    let message = message_service(&state)
        .send(MessageSendInput {
            sender_id: query.sender_id,
            receiver_id: payload.receiver_id,
            job_id: payload.job_id,
            body: payload.message,
        })
        .await
        .map_err(map_domain_error)?;
    Ok(Json(MessageView::from_message(&message)))
}

#[derive(Debug, Deserialize)]
struct OtherUserQuery {
    other_user_id: String,
}

async fn list_user_messages(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<OtherUserQuery>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let messages = message_service(&state)
        .history(&user_id, &query.other_user_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(
        messages.iter().map(MessageView::from_message).collect(),
    ))
}

async fn list_conversations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ConversationView>>, ApiError> {
    let conversations = message_service(&state)
        .conversations(&user_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(
        conversations
            .into_iter()
            .map(ConversationView::from_summary)
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
struct PaymentOrderRequest {
    amount: i64,
}

async fn create_payment_order(
    State(state): State<AppState>,
    Query(_query): Query<EmployerQuery>,
    Json(payload): Json<PaymentOrderRequest>,
) -> Result<Json<Value>, ApiError> {
    if payload.amount <= 0 {
        return Err(ApiError::Validation("amount must be positive".into()));
    }
    let order = payment_service(&state).create_order(payload.amount);
    Ok(Json(json!({
        "id": order.order_id,
        "amount": order.amount,
        "currency": order.currency,
        "status": order.status,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentVerifyRequest {
    razorpay_order_id: String,
    razorpay_payment_id: String,
    razorpay_signature: String,
}

async fn verify_payment(
    State(state): State<AppState>,
    Query(query): Query<EmployerQuery>,
    Json(payload): Json<PaymentVerifyRequest>,
) -> Result<Json<Value>, ApiError> {
    payment_service(&state)
        .verify(
            &query.employer_id,
            PaymentVerifyInput {
                order_id: payload.razorpay_order_id,
                payment_id: payload.razorpay_payment_id,
                signature: payload.razorpay_signature,
            },
        )
        .await
        .map_err(map_domain_error)?;
    Ok(Json(json!({ "success": true, "message": "Payment verified" })))
}

async fn live_socket(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_live_socket(socket, state, user_id))
}

/// One socket per user. The writer task owns the sink and drains the
/// registry channel, so pushes from other request handlers never block
/// on a slow client. The read loop acknowledges pings through the
/// registry and silently discards anything it cannot parse.
async fn handle_live_socket(socket: WebSocket, state: AppState, user_id: String) {
    let (mut sink, mut incoming) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsServerEvent>();
    let conn_id = state.registry.register(&user_id, tx).await;
    tracing::debug!(user_id, conn_id, "live socket connected");

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(_) => continue,
            };
            if sink.send(WsMessage::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = incoming.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => {
                if let Ok(WsClientEvent::Ping) = serde_json::from_str::<WsClientEvent>(&text) {
                    // Acked via the registry: after a reconnect the pong
                    // lands on whichever connection owns the entry now.
                    state.registry.push(&user_id, WsServerEvent::Pong).await;
                }
            }
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(_) => break,
        }
    }

    // If this connection was replaced, the registry entry belongs to the
    // successor and the guarded deregister leaves it alone. The registry
    // held this connection's only sender, so once the entry is gone the
    // writer drains out and exits.
    state.registry.deregister(&user_id, conn_id).await;
    let _ = writer.await;
    tracing::debug!(user_id, conn_id, "live socket closed");
}
