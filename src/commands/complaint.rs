use super::CommandContext;
use crate::catalog;
use crate::complaint::ComplaintDraft;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct ComplaintArgs {
    /// Complaint category (see `trustbite categories`)
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub sub_category: String,
    #[arg(long)]
    pub concern: String,
    #[arg(long)]
    pub establishment: Option<String>,
    #[arg(long)]
    pub brand: Option<String>,
    #[arg(long)]
    pub product: Option<String>,
    #[arg(long)]
    pub batch: Option<String>,
    /// FSSAI license number printed on the product or premises
    #[arg(long)]
    pub license: Option<String>,
    #[arg(long)]
    pub location: String,
    #[arg(long)]
    pub state: String,
    #[arg(long)]
    pub district: Option<String>,
    #[arg(long)]
    pub sub_district: Option<String>,
    #[arg(long)]
    pub pin_code: Option<String>,
    /// Date of the incident (YYYY-MM-DD)
    #[arg(long)]
    pub issue_date: NaiveDate,
    #[arg(long, default_value = "food-quality")]
    pub issue_type: String,
    #[arg(long)]
    pub description: String,
    #[arg(long)]
    pub document_description: Option<String>,
    #[arg(long = "attach", required = true, num_args = 1..)]
    pub attachments: Vec<PathBuf>,
}

impl ComplaintArgs {
    pub fn fill(&self, draft: &mut ComplaintDraft) {
        draft.set_category(self.category.clone());
        draft.sub_category = self.sub_category.clone();
        draft.concern_type = self.concern.clone();
        draft.establishment_name = self.establishment.clone().unwrap_or_default();
        draft.brand_name = self.brand.clone().unwrap_or_default();
        draft.product_name = self.product.clone().unwrap_or_default();
        draft.batch_no = self.batch.clone().unwrap_or_default();
        draft.license_no = self.license.clone().unwrap_or_default();
        draft.location = self.location.clone();
        draft.state = self.state.clone();
        draft.district = self.district.clone().unwrap_or_default();
        draft.sub_district = self.sub_district.clone().unwrap_or_default();
        draft.pin_code = self.pin_code.clone().unwrap_or_default();
        draft.issue_date = Some(self.issue_date);
        draft.issue_type = self.issue_type.clone();
        draft.description = self.description.clone();
        draft.document_description = self.document_description.clone().unwrap_or_default();
    }
}

pub async fn execute_complaint(context: &CommandContext, args: &ComplaintArgs) -> Result<()> {
    let limits = context.config.attachment_limits();
    let mut draft = ComplaintDraft::new(context.reporter(), limits);
    args.fill(&mut draft);

    let dropped = draft.attachments.add_paths(&args.attachments)?;
    if dropped > 0 {
        println!(
            "⚠ Only the first {} documents were attached ({dropped} dropped)",
            limits.max_files
        );
    }

    context.client.submit_complaint(&draft).await?;
    println!("✓ Complaint submitted successfully!");
    println!("  Track it with: trustbite status");
    Ok(())
}

pub fn execute_list_categories() {
    for category in catalog::categories() {
        println!("{category}");
        for sub in catalog::sub_categories(category).unwrap_or_default() {
            println!("  - {sub}");
        }
    }
    println!("\nConcerns:");
    for concern in catalog::CONCERN_TYPES {
        println!("  - {concern}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Reporter;
    use crate::report::AttachmentLimits;

    #[test]
    fn test_fill_maps_every_field() {
        let args = ComplaintArgs {
            category: "Package Food".to_string(),
            sub_category: "Bakery products".to_string(),
            concern: "Expired Product".to_string(),
            establishment: Some("Corner Bakery".to_string()),
            brand: Some("CrustCo".to_string()),
            product: Some("Milk bread".to_string()),
            batch: Some("B-2291".to_string()),
            license: None,
            location: "Koramangala, Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            district: None,
            sub_district: None,
            pin_code: Some("560034".to_string()),
            issue_date: NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            issue_type: "food-quality".to_string(),
            description: "Sold two weeks past expiry".to_string(),
            document_description: None,
            attachments: vec![],
        };

        let mut draft = ComplaintDraft::new(Reporter::default(), AttachmentLimits::default());
        args.fill(&mut draft);

        assert_eq!(draft.sub_category, "Bakery products");
        assert_eq!(draft.batch_no, "B-2291");
        assert_eq!(draft.pin_code, "560034");
        assert!(draft.license_no.is_empty());
        assert_eq!(draft.issue_date, NaiveDate::from_ymd_opt(2024, 2, 3));
        assert!(draft.validate().unwrap_err().to_string().contains("attachments"));
    }
}
