use super::CommandContext;
use crate::license::{LicenseCheckOutcome, LicenseRecord};
use anyhow::Result;

pub async fn execute_check(context: &CommandContext, identifier: &str, strict: bool) -> Result<()> {
    let outcome = context.client.check_license(identifier).await?;
    print!("{}", render_outcome(&outcome));

    if strict {
        outcome.require_clean()?;
    }
    Ok(())
}

pub fn render_outcome(outcome: &LicenseCheckOutcome) -> String {
    let mut lines = Vec::new();
    if let Some(message) = outcome.message() {
        lines.push(format!("⚠ {message}"));
    }

    match outcome {
        LicenseCheckOutcome::Clean(record) => lines.extend(license_lines(record)),
        LicenseCheckOutcome::Flagged { record, .. } => {
            lines.push(format!("  Business Name: {}", record.business_name));
            lines.push(format!("  State: {}", record.state));
            lines.push(format!("  Address: {}", record.address));
            lines.push(report_hint(&record.fssai_number));
        }
        LicenseCheckOutcome::NotFound { identifier } => lines.push(report_hint(identifier)),
    }

    lines.join("\n") + "\n"
}

fn report_hint(identifier: &str) -> String {
    format!("\nFile a report with: trustbite report --license {identifier} ...")
}

fn license_lines(record: &LicenseRecord) -> Vec<String> {
    let mut lines = vec![
        "✓ License Details (Valid)".to_string(),
        format!("  FSSAI Number: {}", record.fssai_number),
        format!("  Business Name: {}", record.business_name),
    ];
    if let Some(owner) = &record.owner_name {
        lines.push(format!("  Owner Name: {owner}"));
    }
    lines.extend([
        format!("  License Type: {}", record.license_type),
        format!("  State: {}", record.state),
        format!("  Address: {}", record.address),
        format!("  Issued Date: {}", record.issued_date.format("%d %b %Y")),
        format!("  Expiry Date: {}", record.expiry_date.format("%d %b %Y")),
    ]);
    if let Some(email) = &record.contact_email {
        lines.push(format!("  Contact Email: {email}"));
    }
    if let Some(phone) = &record.contact_phone {
        lines.push(format!("  Contact Phone: {phone}"));
    }
    lines
}
