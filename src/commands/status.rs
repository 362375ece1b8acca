use super::CommandContext;
use crate::complaint::Complaint;
use anyhow::Result;

pub async fn execute_status(context: &CommandContext) -> Result<()> {
    let complaints = context.client.list_complaints(&context.user.id).await?;
    print!("{}", render_complaints(&complaints));
    Ok(())
}

pub fn render_complaints(complaints: &[Complaint]) -> String {
    if complaints.is_empty() {
        return "No complaints yet\nYou haven't submitted any food safety complaints.\n"
            .to_string();
    }

    complaints.iter().map(render_complaint).collect()
}

fn render_complaint(complaint: &Complaint) -> String {
    let mut lines = vec![
        format!("{}  [{}]", complaint.establishment_name, complaint.status),
        format!("  ID: {}", complaint.id),
        format!("  Issue Date: {}", complaint.issue_date),
        format!("  Issue Type: {}", complaint.issue_type_label()),
        format!("  Submitted On: {}", complaint.submitted_at),
    ];
    if let Some(resolved_at) = complaint.resolved_at {
        lines.push(format!("  Resolved On: {resolved_at}"));
    }
    if let Some(resolution) = &complaint.resolution {
        lines.push(format!("  Resolution: {resolution}"));
    }
    lines.join("\n") + "\n\n"
}
