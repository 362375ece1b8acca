//! Display state for the license check and follow-up report.
//!
//! Every check bumps a generation counter. Results carry the generation of the check that
//! produced them and are dropped if a newer check has started since, so the state always
//! reflects the most recently initiated check regardless of response order.

use crate::client::{LicenseRegistry, check_license};
use crate::error::{PortalError, PortalResult};
use crate::identity::Reporter;
use crate::license::{LicenseCheckOutcome, LicenseRecord, draft_for_record, normalize_identifier};
use crate::report::{AttachmentLimits, ReportDraft};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    Idle,
    Checking {
        identifier: String,
    },
    Clean(LicenseRecord),
    Flagged {
        record: LicenseRecord,
        reason: String,
        draft: ReportDraft,
    },
    NotFound {
        identifier: String,
        draft: ReportDraft,
    },
    CheckFailed(PortalError),
    ReportEditing {
        context: LicenseCheckOutcome,
        draft: ReportDraft,
        error: Option<PortalError>,
    },
    Submitting {
        context: LicenseCheckOutcome,
        draft: ReportDraft,
    },
    ReportSubmitted {
        identifier: String,
    },
}

impl DisplayState {
    pub fn shows_report_form(&self) -> bool {
        matches!(
            self,
            Self::Flagged { .. }
                | Self::NotFound { .. }
                | Self::ReportEditing { .. }
                | Self::Submitting { .. }
        )
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Checking { .. } | Self::Submitting { .. })
    }

    pub fn draft(&self) -> Option<&ReportDraft> {
        match self {
            Self::Flagged { draft, .. }
            | Self::NotFound { draft, .. }
            | Self::ReportEditing { draft, .. }
            | Self::Submitting { draft, .. } => Some(draft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    generation: u64,
    pub identifier: String,
}

#[derive(Debug, Clone)]
pub struct SubmitTicket {
    generation: u64,
    pub draft: ReportDraft,
}

#[derive(Debug)]
pub struct VerificationFlow {
    state: DisplayState,
    generation: u64,
    reporter: Reporter,
    limits: AttachmentLimits,
}

impl VerificationFlow {
    pub fn new(reporter: Reporter, limits: AttachmentLimits) -> Self {
        Self {
            state: DisplayState::Idle,
            generation: 0,
            reporter,
            limits,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Starts a check, superseding whatever was on screen. A blank identifier is rejected
    /// without touching the current state.
    pub fn begin_check(&mut self, raw_identifier: &str) -> PortalResult<CheckTicket> {
        let identifier = normalize_identifier(raw_identifier)?;
        self.generation += 1;
        self.state = DisplayState::Checking {
            identifier: identifier.clone(),
        };
        Ok(CheckTicket {
            generation: self.generation,
            identifier,
        })
    }

    /// Applies a check result. Returns `false` when the result was stale and discarded.
    pub fn finish_check(
        &mut self,
        ticket: CheckTicket,
        result: PortalResult<LicenseCheckOutcome>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                identifier = %ticket.identifier,
                "Discarding stale license check result"
            );
            return false;
        }

        self.state = match result {
            Ok(LicenseCheckOutcome::Clean(record)) => DisplayState::Clean(record),
            Ok(LicenseCheckOutcome::Flagged { record, reason }) => {
                let draft = draft_for_record(&record, self.reporter.clone(), self.limits);
                DisplayState::Flagged {
                    record,
                    reason,
                    draft,
                }
            }
            Ok(LicenseCheckOutcome::NotFound { identifier }) => {
                let draft = ReportDraft::new(&identifier, self.reporter.clone(), self.limits);
                DisplayState::NotFound { identifier, draft }
            }
            Err(err) => DisplayState::CheckFailed(err),
        };
        true
    }

    fn take_report(
        &mut self,
    ) -> PortalResult<(LicenseCheckOutcome, ReportDraft, Option<PortalError>)> {
        match std::mem::replace(&mut self.state, DisplayState::Idle) {
            DisplayState::Flagged {
                record,
                reason,
                draft,
            } => Ok((LicenseCheckOutcome::Flagged { record, reason }, draft, None)),
            DisplayState::NotFound { identifier, draft } => {
                Ok((LicenseCheckOutcome::NotFound { identifier }, draft, None))
            }
            DisplayState::ReportEditing {
                context,
                draft,
                error,
            } => Ok((context, draft, error)),
            other => {
                self.state = other;
                Err(PortalError::validation("no report is being edited"))
            }
        }
    }

    /// Mutates the report draft, moving into `ReportEditing` on first edit.
    pub fn edit_report(&mut self, edit: impl FnOnce(&mut ReportDraft)) -> PortalResult<()> {
        let (context, mut draft, error) = self.take_report()?;
        edit(&mut draft);
        self.state = DisplayState::ReportEditing {
            context,
            draft,
            error,
        };
        Ok(())
    }

    /// Validates the draft and moves to `Submitting`. On a validation failure the draft stays
    /// editable and carries the error.
    pub fn begin_submit(&mut self) -> PortalResult<SubmitTicket> {
        let (context, draft, _) = self.take_report()?;

        if let Err(err) = draft.validate() {
            self.state = DisplayState::ReportEditing {
                context,
                draft,
                error: Some(err.clone()),
            };
            return Err(err);
        }

        let ticket = SubmitTicket {
            generation: self.generation,
            draft: draft.clone(),
        };
        self.state = DisplayState::Submitting { context, draft };
        Ok(ticket)
    }

    /// Success discards the draft; failure returns to editing with the draft intact.
    pub fn finish_submit(&mut self, ticket: SubmitTicket, result: PortalResult<()>) -> bool {
        if ticket.generation != self.generation
            || !matches!(self.state, DisplayState::Submitting { .. })
        {
            debug!("Discarding stale report submission result");
            return false;
        }

        let DisplayState::Submitting { context, draft } =
            std::mem::replace(&mut self.state, DisplayState::Idle)
        else {
            return false;
        };

        self.state = match result {
            Ok(()) => DisplayState::ReportSubmitted {
                identifier: draft.license_identifier,
            },
            Err(err) => DisplayState::ReportEditing {
                context,
                draft,
                error: Some(err),
            },
        };
        true
    }
}

/// Submission side of the portal, split out so the flow can run against a fake backend.
pub trait ReportSink {
    fn submit(&self, draft: &ReportDraft) -> impl Future<Output = PortalResult<()>> + Send;
}

impl ReportSink for crate::client::PortalClient {
    async fn submit(&self, draft: &ReportDraft) -> PortalResult<()> {
        self.submit_report(draft).await
    }
}

/// Drives a [`VerificationFlow`] from concurrent tasks. The lock is never held across a
/// network call.
pub struct SharedFlow<B> {
    flow: Arc<Mutex<VerificationFlow>>,
    backend: Arc<B>,
}

impl<B> Clone for SharedFlow<B> {
    fn clone(&self) -> Self {
        Self {
            flow: Arc::clone(&self.flow),
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B> SharedFlow<B>
where
    B: LicenseRegistry + ReportSink + Send + Sync + 'static,
{
    pub fn new(flow: VerificationFlow, backend: Arc<B>) -> Self {
        Self {
            flow: Arc::new(Mutex::new(flow)),
            backend,
        }
    }

    pub async fn snapshot(&self) -> DisplayState {
        self.flow.lock().await.state().clone()
    }

    /// Runs one check. `Ok(false)` means a newer check superseded this one.
    pub async fn check(&self, raw_identifier: &str) -> PortalResult<bool> {
        let ticket = self.flow.lock().await.begin_check(raw_identifier)?;
        let result = check_license(self.backend.as_ref(), &ticket.identifier).await;
        Ok(self.flow.lock().await.finish_check(ticket, result))
    }

    pub fn spawn_check(&self, raw_identifier: impl Into<String>) -> JoinHandle<PortalResult<bool>> {
        let this = self.clone();
        let raw_identifier = raw_identifier.into();
        tokio::spawn(async move { this.check(&raw_identifier).await })
    }

    pub async fn edit_report(&self, edit: impl FnOnce(&mut ReportDraft)) -> PortalResult<()> {
        self.flow.lock().await.edit_report(edit)
    }

    /// Submits the current draft once. The returned error is the submission failure, if any;
    /// the flow is already back in `ReportEditing` with the draft intact when it is.
    pub async fn submit(&self) -> PortalResult<()> {
        let ticket = self.flow.lock().await.begin_submit()?;
        let result = self.backend.submit(&ticket.draft).await;
        self.flow.lock().await.finish_submit(ticket, result.clone());
        result
    }
}
