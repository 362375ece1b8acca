use super::CommandContext;
use super::status::render_complaints;
use crate::complaint::{ComplaintStatus, StatusUpdate};
use crate::identity::require_admin;
use anyhow::Result;
use std::collections::BTreeMap;

fn ensure_admin(context: &CommandContext) -> Result<()> {
    require_admin(&context.config.session, &context.config.admin_policy())?;
    Ok(())
}

pub async fn execute_admin_list(context: &CommandContext, status: Option<ComplaintStatus>) -> Result<()> {
    ensure_admin(context)?;
    let complaints: Vec<_> = context
        .client
        .list_all_complaints()
        .await?
        .into_iter()
        .filter(|c| status.is_none_or(|s| c.status == s))
        .collect();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for complaint in &complaints {
        *counts.entry(complaint.status.label()).or_default() += 1;
    }
    let summary: Vec<String> = counts
        .iter()
        .map(|(label, count)| format!("{label}: {count}"))
        .collect();

    println!("{} complaints ({})\n", complaints.len(), summary.join(", "));
    print!("{}", render_complaints(&complaints));
    Ok(())
}

pub async fn execute_admin_update(
    context: &CommandContext,
    complaint_id: &str,
    status: ComplaintStatus,
    resolution: Option<String>,
) -> Result<()> {
    ensure_admin(context)?;

    let current = context
        .client
        .list_all_complaints()
        .await?
        .into_iter()
        .find(|c| c.id == complaint_id)
        .ok_or_else(|| anyhow::anyhow!("Complaint '{}' not found", complaint_id))?;

    let update = StatusUpdate { status, resolution };
    update.validate_against(current.status)?;

    let updated = context
        .client
        .update_complaint_status(complaint_id, &update)
        .await?;
    println!(
        "✓ Complaint {} moved from {} to {}",
        updated.id, current.status, updated.status
    );
    Ok(())
}
