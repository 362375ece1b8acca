use crate::error::{PortalError, PortalResult};
use crate::identity::Reporter;
use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use std::fs;
use std::path::Path;

pub const LICENSE_CATEGORY: &str = "FSSAI License Issue";
pub const LICENSE_CONCERN_TYPE: &str = "Invalid/Fake/Misused License Report";
pub const DEFAULT_DOCUMENT_DESCRIPTION: &str = "Evidence for FSSAI license issue";
pub const DOCUMENTS_FIELD: &str = "documents";

/// File types accepted on the license report form.
pub const REPORT_FILE_TYPES: &[&str] = &["pdf", "jpg", "jpeg", "png"];

/// File types accepted on the general complaint form, which also takes documents and video.
pub const COMPLAINT_FILE_TYPES: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "doc", "docx", "mp4", "webm", "avi", "wmv",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentLimits {
    pub max_files: usize,
    pub max_bytes: u64,
    /// Lower-case extensions; the content type is derived from the extension.
    pub allowed_types: &'static [&'static str],
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self {
            max_files: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_types: REPORT_FILE_TYPES,
        }
    }
}

impl AttachmentLimits {
    pub fn with_types(self, allowed_types: &'static [&'static str]) -> Self {
        Self {
            allowed_types,
            ..self
        }
    }

    /// Upper bound on a multipart body carrying a full set of attachments.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_bytes * self.max_files as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn from_bytes(
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        limits: &AttachmentLimits,
    ) -> PortalResult<Self> {
        let file_name = file_name.into();
        let content_type = allowed_content_type(&file_name, limits.allowed_types)
            .ok_or_else(|| {
                PortalError::validation(format!(
                    "{file_name}: file type not allowed (accepted: {})",
                    limits.allowed_types.join(", ")
                ))
            })?;

        if bytes.len() as u64 > limits.max_bytes {
            return Err(PortalError::validation(format!(
                "{file_name}: exceeds the {} KB size limit",
                limits.max_bytes / 1024
            )));
        }

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    pub fn from_path(path: &Path, limits: &AttachmentLimits) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| anyhow::anyhow!("Not a file: {}", path.display()))?;

        let size = fs::metadata(path)
            .with_context(|| format!("Failed to read attachment: {}", path.display()))?
            .len();
        if size > limits.max_bytes {
            return Err(PortalError::validation(format!(
                "{file_name}: exceeds the {} KB size limit",
                limits.max_bytes / 1024
            ))
            .into());
        }

        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read attachment: {}", path.display()))?;
        Ok(Self::from_bytes(file_name, bytes, limits)?)
    }

    pub fn size_kb(&self) -> u64 {
        (self.bytes.len() as u64).div_ceil(1024)
    }

    fn to_part(&self) -> PortalResult<Part> {
        Ok(Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)?)
    }
}

fn allowed_content_type(file_name: &str, allowed_types: &[&str]) -> Option<String> {
    let extension = Path::new(file_name)
        .extension()?
        .to_string_lossy()
        .to_ascii_lowercase();
    allowed_types
        .contains(&extension.as_str())
        .then(|| mime_guess::from_ext(&extension).first_or_octet_stream().to_string())
}

/// Reads at most `limits.max_files` of `paths`, in order. Paths past the cap are never
/// opened; their count is returned alongside the files.
pub fn load_attachments<P: AsRef<Path>>(
    paths: &[P],
    limits: &AttachmentLimits,
) -> Result<(Vec<Attachment>, usize)> {
    let kept = paths.len().min(limits.max_files);
    let files = paths[..kept]
        .iter()
        .map(|p| Attachment::from_path(p.as_ref(), limits))
        .collect::<Result<Vec<_>>>()?;
    let dropped = paths.len() - kept;
    if dropped > 0 {
        tracing::warn!(
            dropped,
            max = limits.max_files,
            "Attachment limit reached, extra files dropped"
        );
    }
    Ok((files, dropped))
}

/// Selected files, in selection order, never more than `limits.max_files`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttachmentSet {
    items: Vec<Attachment>,
    limits: AttachmentLimits,
}

impl AttachmentSet {
    pub fn new(limits: AttachmentLimits) -> Self {
        Self {
            items: Vec::new(),
            limits,
        }
    }

    pub fn limits(&self) -> &AttachmentLimits {
        &self.limits
    }

    /// Appends files up to the cap. Files past the cap are dropped; the count of dropped
    /// files is returned.
    pub fn add(&mut self, files: impl IntoIterator<Item = Attachment>) -> usize {
        let mut dropped = 0;
        for file in files {
            if self.items.len() < self.limits.max_files {
                self.items.push(file);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::warn!(
                dropped,
                max = self.limits.max_files,
                "Attachment limit reached, extra files dropped"
            );
        }
        dropped
    }

    /// Reads and appends files up to the cap. Paths that would not fit are dropped without
    /// being read, so they cannot fail the call.
    pub fn add_paths<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<usize> {
        let remaining = self.limits.max_files.saturating_sub(self.items.len());
        let limits = AttachmentLimits {
            max_files: remaining,
            ..self.limits
        };
        let (files, skipped) = load_attachments(paths, &limits)?;
        Ok(self.add(files) + skipped)
    }

    pub fn remove(&mut self, index: usize) -> Option<Attachment> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.items.iter()
    }

    pub(crate) fn append_to(&self, mut form: Form) -> PortalResult<Form> {
        for attachment in &self.items {
            form = form.part(DOCUMENTS_FIELD, attachment.to_part()?);
        }
        Ok(form)
    }
}

/// Follow-up report for a missing or flagged license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDraft {
    pub license_identifier: String,
    pub establishment_name: String,
    pub location: String,
    pub region: String,
    pub sub_region: String,
    pub narrative: String,
    pub attachment_description: String,
    pub attachments: AttachmentSet,
    reporter: Reporter,
}

impl ReportDraft {
    pub fn new(license_identifier: &str, reporter: Reporter, limits: AttachmentLimits) -> Self {
        Self {
            license_identifier: license_identifier.to_string(),
            establishment_name: String::new(),
            location: String::new(),
            region: String::new(),
            sub_region: String::new(),
            narrative: String::new(),
            attachment_description: String::new(),
            attachments: AttachmentSet::new(limits),
            reporter,
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Attachments are checked first so an empty upload is reported regardless of the
    /// other fields.
    pub fn validate(&self) -> PortalResult<()> {
        if self.attachments.is_empty() {
            return Err(PortalError::validation(
                "attachments: at least one supporting document is required",
            ));
        }
        if self.narrative.trim().is_empty() {
            return Err(PortalError::validation(
                "narrative: describe why the license should be reported",
            ));
        }
        if self.license_identifier.trim().is_empty() {
            return Err(PortalError::validation(
                "license_identifier: FSSAI number is required",
            ));
        }
        if self.location.trim().is_empty() {
            return Err(PortalError::validation(
                "location: where the license was seen is required",
            ));
        }
        if self.region.trim().is_empty() {
            return Err(PortalError::validation("region: state is required"));
        }
        Ok(())
    }

    /// Scalar multipart fields, in submission order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let document_description = if self.attachment_description.trim().is_empty() {
            DEFAULT_DOCUMENT_DESCRIPTION.to_string()
        } else {
            self.attachment_description.clone()
        };

        vec![
            ("fssaiNumber", self.license_identifier.clone()),
            ("establishmentName", self.establishment_name.clone()),
            ("location", self.location.clone()),
            ("state", self.region.clone()),
            ("district", self.sub_region.clone()),
            ("category", LICENSE_CATEGORY.to_string()),
            ("concernType", LICENSE_CONCERN_TYPE.to_string()),
            ("description", self.narrative.clone()),
            ("documentDescription", document_description),
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
