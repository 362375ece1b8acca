use super::CommandContext;
use crate::flow::{DisplayState, SharedFlow, VerificationFlow};
use crate::report::{ReportDraft, load_attachments};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    /// FSSAI license number being reported
    #[arg(long = "license")]
    pub license: String,
    /// Establishment name, if known
    #[arg(long)]
    pub establishment: Option<String>,
    /// Location or address where the license was seen
    #[arg(long)]
    pub location: Option<String>,
    /// State
    #[arg(long)]
    pub state: Option<String>,
    /// District
    #[arg(long)]
    pub district: Option<String>,
    /// Why the license should be reported
    #[arg(long)]
    pub description: String,
    /// Short description of the attached documents
    #[arg(long)]
    pub document_description: Option<String>,
    /// Supporting documents (PDF, JPG, PNG; at most 5)
    #[arg(long = "attach", required = true, num_args = 1..)]
    pub attachments: Vec<PathBuf>,
}

impl ReportArgs {
    /// Overlays the values given on the command line onto the pre-filled draft.
    pub fn apply_to(&self, draft: &mut ReportDraft) {
        if let Some(name) = &self.establishment {
            draft.establishment_name = name.clone();
        }
        if let Some(location) = &self.location {
            draft.location = location.clone();
        }
        if let Some(state) = &self.state {
            draft.region = state.clone();
        }
        if let Some(district) = &self.district {
            draft.sub_region = district.clone();
        }
        if let Some(description) = &self.document_description {
            draft.attachment_description = description.clone();
        }
        draft.narrative = self.description.clone();
    }
}

pub async fn execute_report(context: &CommandContext, args: &ReportArgs) -> Result<()> {
    let limits = context.config.attachment_limits();
    let (files, dropped) = load_attachments(&args.attachments, &limits)?;

    let flow = VerificationFlow::new(context.reporter(), limits);
    let shared = SharedFlow::new(flow, Arc::new(context.client.clone()));
    shared.check(&args.license).await?;

    match shared.snapshot().await {
        DisplayState::Clean(record) => {
            return Err(anyhow::anyhow!(
                "License {} ({}) is valid and not flagged; no report needed",
                record.fssai_number,
                record.business_name
            ));
        }
        DisplayState::CheckFailed(err) => return Err(err.into()),
        DisplayState::Flagged { reason, .. } => {
            println!("License is marked as {reason}. Filing report...");
        }
        DisplayState::NotFound { .. } => {
            println!("License not found in registry. Filing report...");
        }
        _ => {}
    }

    shared
        .edit_report(|draft| {
            args.apply_to(draft);
            draft.attachments.add(files);
        })
        .await?;
    if dropped > 0 {
        println!(
            "⚠ Only the first {} documents were attached ({dropped} dropped)",
            limits.max_files
        );
    }

    shared.submit().await?;
    println!("✓ Complaint about FSSAI license submitted successfully!");
    println!("  Track it with: trustbite status");
    Ok(())
}
