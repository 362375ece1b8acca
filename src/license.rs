use crate::error::{PortalError, PortalResult};
use crate::identity::Reporter;
use crate::report::{AttachmentLimits, ReportDraft};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const NOT_FOUND_ADVISORY: &str = "FSSAI number not found in our records. It might be invalid or fake. Please file a report if you encountered this license.";

/// A registry entry as returned by `GET /api/fssai/check/{id}`. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub fssai_number: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(with = "calendar_date")]
    pub issued_date: NaiveDate,
    #[serde(with = "calendar_date")]
    pub expiry_date: NaiveDate,
    #[serde(default)]
    pub license_type: String,
    pub is_valid: bool,
    pub is_misused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<String>,
}

impl LicenseRecord {
    /// Clean iff the registry says valid and not misused. Expiry is not consulted.
    pub fn is_clean(&self) -> bool {
        self.is_valid && !self.is_misused
    }

    pub fn flag_reason(&self) -> Option<String> {
        let mut parts = Vec::new();
        if !self.is_valid {
            parts.push("INVALID");
        }
        if self.is_misused {
            parts.push("MISUSED");
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" and "))
        }
    }
}

/// Registry dates arrive either as `YYYY-MM-DD` or as full RFC 3339 timestamps.
mod calendar_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveDate, String> {
        if let Ok(date) = NaiveDate::parse_from_str(raw, FORMAT) {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.date_naive())
            .map_err(|e| format!("invalid date '{raw}': {e}"))
    }
}

/// Raw registry answer before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResponse {
    pub status: u16,
    pub body: String,
}

impl LookupResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseCheckOutcome {
    Clean(LicenseRecord),
    Flagged {
        record: LicenseRecord,
        reason: String,
    },
    NotFound {
        identifier: String,
    },
}

impl LicenseCheckOutcome {
    pub fn shows_report_form(&self) -> bool {
        !matches!(self, Self::Clean(_))
    }

    pub fn record(&self) -> Option<&LicenseRecord> {
        match self {
            Self::Clean(record) | Self::Flagged { record, .. } => Some(record),
            Self::NotFound { .. } => None,
        }
    }

    /// Text shown above the report form. `None` for a clean record.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Clean(_) => None,
            Self::Flagged { reason, .. } => Some(format!(
                "License found but is marked as {reason}. Please report if you suspect an issue."
            )),
            Self::NotFound { .. } => Some(NOT_FOUND_ADVISORY.to_string()),
        }
    }

    /// Draft for the follow-up report. Flagged records pre-fill establishment, state and
    /// address; a missing record pre-fills only the identifier that was checked.
    pub fn report_draft(&self, reporter: Reporter, limits: AttachmentLimits) -> Option<ReportDraft> {
        match self {
            Self::Clean(_) => None,
            Self::Flagged { record, .. } => Some(draft_for_record(record, reporter, limits)),
            Self::NotFound { identifier } => Some(ReportDraft::new(identifier, reporter, limits)),
        }
    }

    pub fn require_clean(&self) -> PortalResult<&LicenseRecord> {
        match self {
            Self::Clean(record) => Ok(record),
            Self::Flagged { record, reason } => Err(PortalError::Flagged {
                identifier: record.fssai_number.clone(),
                reason: reason.clone(),
            }),
            Self::NotFound { identifier } => Err(PortalError::NotFound {
                identifier: identifier.clone(),
            }),
        }
    }
}

pub fn draft_for_record(
    record: &LicenseRecord,
    reporter: Reporter,
    limits: AttachmentLimits,
) -> ReportDraft {
    let mut draft = ReportDraft::new(&record.fssai_number, reporter, limits);
    draft.establishment_name = record.business_name.clone();
    draft.region = record.state.clone();
    draft.location = record.address.clone();
    draft
}

pub fn normalize_identifier(raw: &str) -> PortalResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PortalError::validation("empty identifier"));
    }
    Ok(trimmed.to_string())
}

/// Sorts a registry response into the three outcomes. Anything other than 2xx or 404 is a
/// transport failure carrying the status and body.
pub fn classify(identifier: &str, response: LookupResponse) -> PortalResult<LicenseCheckOutcome> {
    match response.status {
        200..=299 => {
            let record: LicenseRecord =
                serde_json::from_str(&response.body).map_err(|e| PortalError::Transport {
                    status: Some(response.status),
                    message: format!("Invalid registry response: {e}"),
                })?;
            Ok(match record.flag_reason() {
                None => LicenseCheckOutcome::Clean(record),
                Some(reason) => LicenseCheckOutcome::Flagged { record, reason },
            })
        }
        404 => Ok(LicenseCheckOutcome::NotFound {
            identifier: identifier.to_string(),
        }),
        status => Err(PortalError::Transport {
            status: Some(status),
            message: error_body_or_reason(status, &response.body),
        }),
    }
}

pub(crate) fn error_body_or_reason(status: u16, body: &str) -> String {
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown error")
        .to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;

    pub(crate) fn record_json(is_valid: bool, is_misused: bool) -> String {
        serde_json::json!({
            "_id": "65f0c0ffee",
            "fssaiNumber": "100999999999",
            "businessName": "Acme Foods",
            "ownerName": "R. Mehta",
            "address": "12 MG Road, Pune",
            "state": "Maharashtra",
            "issuedDate": "2022-04-01T00:00:00.000Z",
            "expiryDate": "2027-03-31",
            "licenseType": "State",
            "isValid": is_valid,
            "isMisused": is_misused
        })
        .to_string()
    }

    fn reporter() -> Reporter {
        Reporter {
            id: "user_1".to_string(),
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
        }
    }

    #[test]
    fn test_empty_identifier_is_rejected() {
        assert_eq!(
            normalize_identifier("   \t"),
            Err(PortalError::validation("empty identifier"))
        );
        assert_eq!(normalize_identifier(" 100123 ").unwrap(), "100123");
    }

    #[test]
    fn test_record_dates_accept_both_formats() {
        let record: LicenseRecord = serde_json::from_str(&record_json(true, false)).unwrap();
        assert_eq!(record.issued_date, NaiveDate::from_ymd_opt(2022, 4, 1).unwrap());
        assert_eq!(record.expiry_date, NaiveDate::from_ymd_opt(2027, 3, 31).unwrap());
        assert_eq!(record.record_id.as_deref(), Some("65f0c0ffee"));
        assert_eq!(record.contact_email, None);
    }

    #[test]
    fn test_clean_record_outcome() {
        let outcome = classify("100999999999", LookupResponse::new(200, record_json(true, false)))
            .unwrap();
        assert!(matches!(outcome, LicenseCheckOutcome::Clean(ref r) if r.business_name == "Acme Foods"));
        assert!(!outcome.shows_report_form());
        assert_eq!(outcome.message(), None);
        assert!(outcome.report_draft(reporter(), AttachmentLimits::default()).is_none());
    }

    #[rstest]
    #[case(false, false, "INVALID")]
    #[case(true, true, "MISUSED")]
    #[case(false, true, "INVALID and MISUSED")]
    fn test_flagged_reasons(#[case] is_valid: bool, #[case] is_misused: bool, #[case] reason: &str) {
        let outcome = classify(
            "100999999999",
            LookupResponse::new(200, record_json(is_valid, is_misused)),
        )
        .unwrap();
        match &outcome {
            LicenseCheckOutcome::Flagged { reason: actual, .. } => assert_eq!(actual, reason),
            other => panic!("expected flagged outcome, got {other:?}"),
        }
        assert!(outcome.shows_report_form());
        assert!(outcome.message().unwrap().contains(reason));
    }

    #[test]
    fn test_flagged_draft_is_prefilled_from_record() {
        let outcome = classify("100999999999", LookupResponse::new(200, record_json(false, true)))
            .unwrap();
        let draft = outcome
            .report_draft(reporter(), AttachmentLimits::default())
            .unwrap();
        assert_eq!(draft.license_identifier, "100999999999");
        assert_eq!(draft.establishment_name, "Acme Foods");
        assert_eq!(draft.region, "Maharashtra");
        assert_eq!(draft.location, "12 MG Road, Pune");
        assert!(draft.narrative.is_empty());
    }

    #[test]
    fn test_flagged_record_with_missing_details_still_opens_report() {
        let body = serde_json::json!({
            "fssaiNumber": "100888888888",
            "issuedDate": "2022-04-01",
            "expiryDate": "2027-03-31",
            "isValid": false,
            "isMisused": true
        })
        .to_string();

        let outcome = classify("100888888888", LookupResponse::new(200, body)).unwrap();
        assert!(matches!(outcome, LicenseCheckOutcome::Flagged { ref reason, .. } if reason == "INVALID and MISUSED"));

        let draft = outcome
            .report_draft(reporter(), AttachmentLimits::default())
            .unwrap();
        assert_eq!(draft.license_identifier, "100888888888");
        assert!(draft.establishment_name.is_empty());
        assert!(draft.location.is_empty());
        assert!(draft.region.is_empty());
    }

    #[test]
    fn test_not_found_outcome() {
        let outcome = classify("100123456789", LookupResponse::new(404, "")).unwrap();
        assert_eq!(
            outcome,
            LicenseCheckOutcome::NotFound {
                identifier: "100123456789".to_string()
            }
        );
        assert_eq!(outcome.message().as_deref(), Some(NOT_FOUND_ADVISORY));

        let draft = outcome
            .report_draft(reporter(), AttachmentLimits::default())
            .unwrap();
        assert_eq!(draft.license_identifier, "100123456789");
        assert!(draft.establishment_name.is_empty());
        assert!(draft.location.is_empty());
        assert!(draft.region.is_empty());
        assert!(draft.sub_region.is_empty());
        assert!(draft.narrative.is_empty());
        assert!(draft.attachments.is_empty());
    }

    #[rstest]
    #[case(500, "database unavailable", "database unavailable")]
    #[case(503, "", "Service Unavailable")]
    #[case(401, "  ", "Unauthorized")]
    fn test_other_statuses_are_transport_errors(
        #[case] status: u16,
        #[case] body: &str,
        #[case] message: &str,
    ) {
        let err = classify("100", LookupResponse::new(status, body)).unwrap_err();
        assert_eq!(
            err,
            PortalError::Transport {
                status: Some(status),
                message: message.to_string()
            }
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_malformed_body_is_transport_error() {
        let err = classify("100", LookupResponse::new(200, "{not json")).unwrap_err();
        assert!(matches!(err, PortalError::Transport { status: Some(200), .. }));
    }

    #[test]
    fn test_require_clean() {
        let flagged = classify("100", LookupResponse::new(200, record_json(false, false))).unwrap();
        assert_eq!(
            flagged.require_clean(),
            Err(PortalError::Flagged {
                identifier: "100999999999".to_string(),
                reason: "INVALID".to_string()
            })
        );

        let missing = classify("100123", LookupResponse::new(404, "")).unwrap();
        assert_eq!(
            missing.require_clean(),
            Err(PortalError::NotFound {
                identifier: "100123".to_string()
            })
        );
    }
}
