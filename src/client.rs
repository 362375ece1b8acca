use crate::complaint::{Complaint, ComplaintDraft, StatusUpdate};
use crate::config::PortalConfig;
use crate::error::{PortalError, PortalResult};
use crate::license::{
    LicenseCheckOutcome, LookupResponse, classify, error_body_or_reason, normalize_identifier,
};
use crate::report::ReportDraft;
use anyhow::{Context, Result};
use reqwest::{Client, Response, Url, multipart::Form};
use std::future::Future;
use tracing::{info, warn};

pub const CHECK_CONNECT_FAILURE: &str =
    "Failed to connect to the verification service. Please try again later.";
pub const SUBMIT_FAILURE: &str =
    "An error occurred while submitting the complaint. Please try again.";

/// Source of registry answers. The HTTP client is the production implementation.
pub trait LicenseRegistry {
    fn lookup(&self, identifier: &str)
    -> impl Future<Output = PortalResult<LookupResponse>> + Send;
}

/// Trims and validates the identifier, issues exactly one lookup, and classifies the answer.
/// An empty identifier never reaches the registry.
pub async fn check_license<R: LicenseRegistry + ?Sized>(
    registry: &R,
    raw_identifier: &str,
) -> PortalResult<LicenseCheckOutcome> {
    let identifier = normalize_identifier(raw_identifier)?;
    let response = registry.lookup(&identifier).await?;
    let outcome = classify(&identifier, response)?;
    info!(
        identifier = %identifier,
        clean = !outcome.shows_report_form(),
        "License check completed"
    );
    Ok(outcome)
}

#[derive(Debug, Clone)]
pub struct PortalClient {
    http: Client,
    base_url: Url,
}

impl PortalClient {
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_base_url)
            .with_context(|| format!("Invalid api_base_url: {}", config.api_base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow::anyhow!(
                "api_base_url must be an http(s) URL: {}",
                config.api_base_url
            ));
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn check_license(&self, raw_identifier: &str) -> PortalResult<LicenseCheckOutcome> {
        check_license(self, raw_identifier).await
    }

    pub async fn submit_report(&self, draft: &ReportDraft) -> PortalResult<()> {
        let form = draft.to_multipart()?;
        info!(
            identifier = %draft.license_identifier,
            attachments = draft.attachments.len(),
            "Submitting license report"
        );
        self.post_complaint(form).await
    }

    pub async fn submit_complaint(&self, draft: &ComplaintDraft) -> PortalResult<()> {
        let form = draft.to_multipart()?;
        info!(
            category = %draft.category,
            attachments = draft.attachments.len(),
            "Submitting complaint"
        );
        self.post_complaint(form).await
    }

    async fn post_complaint(&self, form: Form) -> PortalResult<()> {
        let response = self
            .http
            .post(self.endpoint(&["api", "complaints"]))
            .multipart(form)
            .send()
            .await
            .map_err(|e| request_failure(e, SUBMIT_FAILURE))?;

        ensure_success(response).await.map(|_| ())
    }

    pub async fn list_complaints(&self, user_id: &str) -> PortalResult<Vec<Complaint>> {
        let mut url = self.endpoint(&["api", "complaints"]);
        url.query_pairs_mut().append_pair("userId", user_id);
        self.get_json(url).await
    }

    pub async fn list_all_complaints(&self) -> PortalResult<Vec<Complaint>> {
        self.get_json(self.endpoint(&["api", "complaints"])).await
    }

    pub async fn update_complaint_status(
        &self,
        complaint_id: &str,
        update: &StatusUpdate,
    ) -> PortalResult<Complaint> {
        let response = self
            .http
            .patch(self.endpoint(&["api", "complaints", complaint_id]))
            .json(update)
            .send()
            .await
            .map_err(|e| request_failure(e, SUBMIT_FAILURE))?;

        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> PortalResult<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| request_failure(e, CHECK_CONNECT_FAILURE))?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

impl LicenseRegistry for PortalClient {
    async fn lookup(&self, identifier: &str) -> PortalResult<LookupResponse> {
        let url = self.endpoint(&["api", "fssai", "check", identifier]);
        info!(identifier = %identifier, "Looking up FSSAI license");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| request_failure(e, CHECK_CONNECT_FAILURE))?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(LookupResponse { status, body })
    }
}

fn request_failure(err: reqwest::Error, fallback: &str) -> PortalError {
    if err.is_timeout() {
        warn!("Request timed out");
        return PortalError::TimedOut;
    }
    warn!(error = %err, "Request failed");
    PortalError::Transport {
        status: None,
        message: fallback.to_string(),
    }
}

async fn ensure_success(response: Response) -> PortalResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "Portal API returned an error");
    Err(PortalError::Transport {
        status: Some(status.as_u16()),
        message: error_body_or_reason(status.as_u16(), &body),
    })
}
