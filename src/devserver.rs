//! In-memory stand-in for the registry and complaint-storage services, for local runs and
//! integration tests.

use crate::complaint::{Complaint, ComplaintStatus, StatusUpdate};
use crate::license::LicenseRecord;
use crate::report::AttachmentLimits;
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Room for the text fields and multipart framing on top of the attachments themselves.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub licenses: Vec<LicenseRecord>,
    #[serde(default)]
    pub complaints: Vec<Complaint>,
}

impl Fixtures {
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures: {}", path.display()))?;
        serde_json::from_str(&source)
            .with_context(|| format!("Invalid fixtures file: {}", path.display()))
    }

    pub fn sample() -> Self {
        Self {
            licenses: vec![
                sample_license("100999999999", "Acme Foods", true, false),
                sample_license("100555555555", "Sunrise Sweets", false, false),
                sample_license("100666666666", "Golden Spoon Caterers", true, true),
                sample_license("100777777777", "Quick Bite Stall", false, true),
            ],
            complaints: vec![
                Complaint {
                    id: "1".to_string(),
                    establishment_name: "Burger Place".to_string(),
                    issue_date: date(2023, 5, 15),
                    issue_type: "food-quality".to_string(),
                    status: ComplaintStatus::UnderReview,
                    submitted_at: date(2023, 5, 16),
                    resolved_at: None,
                    resolution: None,
                    user_id: Some("user_demo".to_string()),
                },
                Complaint {
                    id: "2".to_string(),
                    establishment_name: "Pizza Corner".to_string(),
                    issue_date: date(2023, 4, 20),
                    issue_type: "hygiene".to_string(),
                    status: ComplaintStatus::Resolved,
                    submitted_at: date(2023, 4, 21),
                    resolved_at: Some(date(2023, 5, 5)),
                    resolution: Some(
                        "The establishment was inspected and required to implement improved cleanliness protocols."
                            .to_string(),
                    ),
                    user_id: Some("user_demo".to_string()),
                },
            ],
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn sample_license(number: &str, name: &str, is_valid: bool, is_misused: bool) -> LicenseRecord {
    LicenseRecord {
        record_id: None,
        fssai_number: number.to_string(),
        business_name: name.to_string(),
        owner_name: None,
        address: "14 Station Road, Pune".to_string(),
        state: "Maharashtra".to_string(),
        contact_email: None,
        contact_phone: None,
        issued_date: date(2021, 4, 1),
        expiry_date: date(2026, 3, 31),
        license_type: "State".to_string(),
        is_valid,
        is_misused,
        last_checked: None,
    }
}

/// A multipart submission as received, kept so callers can inspect what was sent.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub fields: HashMap<String, String>,
    pub documents: Vec<String>,
}

#[derive(Clone, Default)]
pub struct DevState {
    licenses: Arc<Mutex<HashMap<String, LicenseRecord>>>,
    complaints: Arc<Mutex<Vec<Complaint>>>,
    submissions: Arc<Mutex<Vec<Submission>>>,
}

impl DevState {
    pub fn new(fixtures: Fixtures) -> Self {
        Self {
            licenses: Arc::new(Mutex::new(
                fixtures
                    .licenses
                    .into_iter()
                    .map(|l| (l.fssai_number.clone(), l))
                    .collect(),
            )),
            complaints: Arc::new(Mutex::new(fixtures.complaints)),
            submissions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().await.clone()
    }
}

#[derive(Deserialize)]
struct ComplaintQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

pub fn router(state: DevState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/fssai/check/{identifier}", get(check_license))
        .route(
            "/complaints",
            get(list_complaints).post(create_complaint),
        )
        .route("/complaints/{id}", patch(update_complaint))
        .layer(DefaultBodyLimit::max(upload_body_limit()));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(state)
}

/// Large enough for a full set of attachments at the default caps.
pub fn upload_body_limit() -> usize {
    AttachmentLimits::default().max_upload_bytes() as usize + FORM_OVERHEAD_BYTES
}

pub async fn serve(listener: TcpListener, state: DevState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "Development server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub async fn main(port: u16, fixtures: Fixtures) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    println!("Development API listening on http://0.0.0.0:{port}");
    serve(listener, DevState::new(fixtures)).await
}

async fn check_license(
    Path(identifier): Path<String>,
    State(state): State<DevState>,
) -> Result<Json<LicenseRecord>, StatusCode> {
    let licenses = state.licenses.lock().await;
    match licenses.get(&identifier) {
        Some(record) => {
            let mut record = record.clone();
            record.last_checked = Some(Utc::now().to_rfc3339());
            Ok(Json(record))
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn list_complaints(
    Query(query): Query<ComplaintQuery>,
    State(state): State<DevState>,
) -> Json<Vec<Complaint>> {
    let complaints = state.complaints.lock().await;
    let selected = complaints
        .iter()
        .filter(|c| match &query.user_id {
            Some(user_id) => c.user_id.as_deref() == Some(user_id.as_str()),
            None => true,
        })
        .cloned()
        .collect();
    Json(selected)
}

async fn create_complaint(
    State(state): State<DevState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Complaint>), (StatusCode, String)> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        error!(error = ?err, "Malformed multipart body");
        (StatusCode::BAD_REQUEST, format!("Malformed form data: {err}"))
    })? {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_string) {
            field
                .bytes()
                .await
                .map_err(|err| (StatusCode::BAD_REQUEST, format!("Failed to read {file_name}: {err}")))?;
            submission.documents.push(file_name);
        } else {
            let value = field
                .text()
                .await
                .map_err(|err| (StatusCode::BAD_REQUEST, format!("Failed to read {name}: {err}")))?;
            submission.fields.insert(name, value);
        }
    }

    if submission.documents.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "At least one document must be uploaded".to_string(),
        ));
    }

    let field = |name: &str| {
        submission
            .fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    };
    let today = Utc::now().date_naive();
    let complaint = Complaint {
        id: uuid::Uuid::new_v4().simple().to_string(),
        establishment_name: field("establishmentName")
            .or(field("fssaiNumber"))
            .unwrap_or("Unknown establishment")
            .to_string(),
        issue_date: field("issueDate")
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .unwrap_or(today),
        issue_type: field("issueType").unwrap_or("license-issue").to_string(),
        status: ComplaintStatus::Submitted,
        submitted_at: today,
        resolved_at: None,
        resolution: None,
        user_id: field("userId").map(str::to_string),
    };

    info!(id = %complaint.id, documents = submission.documents.len(), "Complaint received");
    state.complaints.lock().await.push(complaint.clone());
    state.submissions.lock().await.push(submission);

    Ok((StatusCode::OK, Json(complaint)))
}

async fn update_complaint(
    Path(id): Path<String>,
    State(state): State<DevState>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Complaint>, (StatusCode, String)> {
    let mut complaints = state.complaints.lock().await;
    let complaint = complaints
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or((StatusCode::NOT_FOUND, format!("Complaint {id} not found")))?;

    update
        .validate_against(complaint.status)
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;

    complaint.status = update.status;
    if update.status.is_final() {
        complaint.resolved_at = Some(Utc::now().date_naive());
        complaint.resolution = update.resolution.clone();
    }

    Ok(Json(complaint.clone()))
}
