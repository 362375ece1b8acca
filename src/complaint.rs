use crate::catalog;
use crate::error::{PortalError, PortalResult};
use crate::identity::Reporter;
use crate::report::{AttachmentLimits, AttachmentSet, COMPLAINT_FILE_TYPES};
use chrono::NaiveDate;
use regex::Regex;
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static PIN_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-9][0-9]{5}$").unwrap());

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ComplaintStatus {
    Submitted,
    UnderReview,
    Investigating,
    Resolved,
    Rejected,
}

impl ComplaintStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::UnderReview => "Under Review",
            Self::Investigating => "Investigating",
            Self::Resolved => "Resolved",
            Self::Rejected => "Rejected",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Submitted => 0,
            Self::UnderReview => 1,
            Self::Investigating => 2,
            Self::Resolved | Self::Rejected => 3,
        }
    }

    /// Complaints only move forward; a final status never changes.
    pub fn can_transition_to(&self, next: ComplaintStatus) -> bool {
        !self.is_final() && next.rank() > self.rank()
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ComplaintStatus {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(Self::Submitted),
            "under-review" => Ok(Self::UnderReview),
            "investigating" => Ok(Self::Investigating),
            "resolved" => Ok(Self::Resolved),
            "rejected" => Ok(Self::Rejected),
            other => Err(PortalError::validation(format!(
                "unknown complaint status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: String,
    pub establishment_name: String,
    pub issue_date: NaiveDate,
    pub issue_type: String,
    pub status: ComplaintStatus,
    pub submitted_at: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Complaint {
    /// `food-quality` → `food quality`
    pub fn issue_type_label(&self) -> String {
        self.issue_type.replace('-', " ")
    }
}

/// Body of `PATCH /api/complaints/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ComplaintStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl StatusUpdate {
    pub fn validate_against(&self, current: ComplaintStatus) -> PortalResult<()> {
        if !current.can_transition_to(self.status) {
            return Err(PortalError::validation(format!(
                "cannot move complaint from {current} to {}",
                self.status
            )));
        }
        let has_resolution = self
            .resolution
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty());
        if self.status == ComplaintStatus::Resolved && !has_resolution {
            return Err(PortalError::validation(
                "resolution: a resolution note is required to resolve a complaint",
            ));
        }
        Ok(())
    }
}

/// General food-safety complaint about an establishment or product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintDraft {
    pub category: String,
    pub sub_category: String,
    pub establishment_name: String,
    pub brand_name: String,
    pub product_name: String,
    pub batch_no: String,
    pub license_no: String,
    pub location: String,
    pub state: String,
    pub district: String,
    pub sub_district: String,
    pub pin_code: String,
    pub issue_date: Option<NaiveDate>,
    pub issue_type: String,
    pub concern_type: String,
    pub description: String,
    pub document_description: String,
    pub attachments: AttachmentSet,
    reporter: Reporter,
}

impl ComplaintDraft {
    /// The complaint form accepts documents and video besides the report types; the count and
    /// size caps of `limits` still apply.
    pub fn new(reporter: Reporter, limits: AttachmentLimits) -> Self {
        Self {
            category: String::new(),
            sub_category: String::new(),
            establishment_name: String::new(),
            brand_name: String::new(),
            product_name: String::new(),
            batch_no: String::new(),
            license_no: String::new(),
            location: String::new(),
            state: String::new(),
            district: String::new(),
            sub_district: String::new(),
            pin_code: String::new(),
            issue_date: None,
            issue_type: "food-quality".to_string(),
            concern_type: String::new(),
            description: String::new(),
            document_description: String::new(),
            attachments: AttachmentSet::new(limits.with_types(COMPLAINT_FILE_TYPES)),
            reporter,
        }
    }

    /// Changing the category clears a sub-category that no longer belongs to it.
    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
        self.sub_category.clear();
    }

    pub fn validate(&self) -> PortalResult<()> {
        if self.attachments.is_empty() {
            return Err(PortalError::validation(
                "attachments: at least one document must be uploaded",
            ));
        }

        let subs = catalog::sub_categories(&self.category).ok_or_else(|| {
            PortalError::validation(format!("category: unknown category '{}'", self.category))
        })?;
        if !subs.contains(&self.sub_category.as_str()) {
            return Err(PortalError::validation(format!(
                "sub_category: '{}' is not a sub-category of '{}'",
                self.sub_category, self.category
            )));
        }
        if !catalog::is_known_concern(&self.concern_type) {
            return Err(PortalError::validation(format!(
                "concern_type: unknown concern '{}'",
                self.concern_type
            )));
        }
        if !catalog::is_known_state(&self.state) {
            return Err(PortalError::validation(format!(
                "state: unknown state '{}'",
                self.state
            )));
        }
        if self.location.trim().is_empty() {
            return Err(PortalError::validation("location: address is required"));
        }
        if self.issue_date.is_none() {
            return Err(PortalError::validation("issue_date: date of issue is required"));
        }
        if !self.pin_code.is_empty() && !PIN_CODE.is_match(&self.pin_code) {
            return Err(PortalError::validation(
                "pin_code: must be a 6-digit Indian PIN code",
            ));
        }
        if self.description.trim().is_empty() {
            return Err(PortalError::validation(
                "description: describe the issue you encountered",
            ));
        }
        Ok(())
    }

    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("category", self.category.clone()),
            ("subCategory", self.sub_category.clone()),
            ("establishmentName", self.establishment_name.clone()),
            ("brandName", self.brand_name.clone()),
            ("productName", self.product_name.clone()),
            ("batchNo", self.batch_no.clone()),
            ("licenseNo", self.license_no.clone()),
            ("location", self.location.clone()),
            ("state", self.state.clone()),
            ("district", self.district.clone()),
            ("subDistrict", self.sub_district.clone()),
            ("pinCode", self.pin_code.clone()),
            (
                "issueDate",
                self.issue_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
            ("issueType", self.issue_type.clone()),
            ("concernType", self.concern_type.clone()),
            ("description", self.description.clone()),
            ("documentDescription", self.document_description.clone()),
            ("userId", self.reporter.id.clone()),
            ("userName", self.reporter.name.clone()),
            ("userEmail", self.reporter.email.clone()),
        ]
    }

    pub fn to_multipart(&self) -> PortalResult<Form> {
        self.validate()?;
        let form = self
            .fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));
        self.attachments.append_to(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::png;
    use rstest::rstest;

    fn reporter() -> Reporter {
        Reporter {
            id: "user_7".to_string(),
            name: "Meera Iyer".to_string(),
            email: "meera@example.in".to_string(),
        }
    }

    fn complete_draft() -> ComplaintDraft {
        let mut draft = ComplaintDraft::new(reporter(), AttachmentLimits::default());
        draft.set_category("Food Catering Premises");
        draft.sub_category = "Restaurant".to_string();
        draft.concern_type = "Hygiene Issues".to_string();
        draft.state = "Kerala".to_string();
        draft.location = "MG Road, Kochi".to_string();
        draft.issue_date = NaiveDate::from_ymd_opt(2024, 1, 12);
        draft.description = "Cockroaches in the kitchen area".to_string();
        draft.attachments.add([png("kitchen.png")]);
        draft
    }

    #[test]
    fn test_status_serde_is_kebab_case() {
        let json = serde_json::to_string(&ComplaintStatus::UnderReview).unwrap();
        assert_eq!(json, "\"under-review\"");
        let status: ComplaintStatus = "investigating".parse().unwrap();
        assert_eq!(status, ComplaintStatus::Investigating);
        assert!("pending".parse::<ComplaintStatus>().is_err());
    }

    #[rstest]
    #[case(ComplaintStatus::Submitted, ComplaintStatus::UnderReview, true)]
    #[case(ComplaintStatus::Submitted, ComplaintStatus::Rejected, true)]
    #[case(ComplaintStatus::UnderReview, ComplaintStatus::Investigating, true)]
    #[case(ComplaintStatus::Investigating, ComplaintStatus::Resolved, true)]
    #[case(ComplaintStatus::Investigating, ComplaintStatus::Submitted, false)]
    #[case(ComplaintStatus::UnderReview, ComplaintStatus::UnderReview, false)]
    #[case(ComplaintStatus::Resolved, ComplaintStatus::Rejected, false)]
    fn test_transitions(
        #[case] from: ComplaintStatus,
        #[case] to: ComplaintStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_resolution_required_to_resolve() {
        let update = StatusUpdate {
            status: ComplaintStatus::Resolved,
            resolution: Some(" ".to_string()),
        };
        assert!(update.validate_against(ComplaintStatus::Investigating).is_err());

        let update = StatusUpdate {
            status: ComplaintStatus::Resolved,
            resolution: Some("Inspected and fined".to_string()),
        };
        assert!(update.validate_against(ComplaintStatus::Investigating).is_ok());
    }

    #[test]
    fn test_complaint_json_contract() {
        let complaint: Complaint = serde_json::from_str(
            r#"{
                "id": "2",
                "establishmentName": "Pizza Corner",
                "issueDate": "2023-04-20",
                "issueType": "food-quality",
                "status": "resolved",
                "submittedAt": "2023-04-21",
                "resolvedAt": "2023-05-05",
                "resolution": "Inspected"
            }"#,
        )
        .unwrap();
        assert_eq!(complaint.status, ComplaintStatus::Resolved);
        assert_eq!(complaint.resolved_at, NaiveDate::from_ymd_opt(2023, 5, 5));
        assert_eq!(complaint.issue_type_label(), "food quality");
    }

    #[test]
    fn test_complete_draft_is_valid() {
        let draft = complete_draft();
        assert!(draft.validate().is_ok());
        assert!(draft.to_multipart().is_ok());
        let fields = draft.fields();
        assert!(fields.contains(&("issueDate", "2024-01-12".to_string())));
        assert!(fields.contains(&("userEmail", "meera@example.in".to_string())));
    }

    #[test]
    fn test_set_category_clears_sub_category() {
        let mut draft = complete_draft();
        draft.set_category("Retailer Premises");
        assert!(draft.sub_category.is_empty());
        assert!(draft.validate().unwrap_err().to_string().contains("sub_category"));
    }

    #[rstest]
    #[case("411001", true)]
    #[case("", true)]
    #[case("01100", false)]
    #[case("4110012", false)]
    #[case("41100a", false)]
    fn test_pin_code(#[case] pin: &str, #[case] valid: bool) {
        let mut draft = complete_draft();
        draft.pin_code = pin.to_string();
        assert_eq!(draft.validate().is_ok(), valid);
    }

    #[rstest]
    #[case("statement.docx")]
    #[case("counter.mp4")]
    #[case("counter.wmv")]
    fn test_complaint_accepts_documents_and_video(#[case] name: &str) -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join(name);
        std::fs::write(&path, [0u8; 16])?;

        let mut draft = complete_draft();
        assert_eq!(draft.attachments.add_paths(&[&path])?, 0);
        assert_eq!(draft.attachments.len(), 2);
        assert!(draft.to_multipart().is_ok());
        Ok(())
    }

    #[test]
    fn test_complaint_rejects_unlisted_type() {
        let draft = complete_draft();
        let limits = *draft.attachments.limits();
        let err = crate::report::Attachment::from_bytes("archive.zip", vec![1], &limits).unwrap_err();
        assert!(err.to_string().contains("docx"));
    }

    #[test]
    fn test_draft_without_attachments_fails_first() {
        let draft = ComplaintDraft::new(reporter(), AttachmentLimits::default());
        assert!(draft.validate().unwrap_err().to_string().contains("attachments"));
    }
}
