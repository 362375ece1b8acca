use crate::identity::{AdminPolicy, DEFAULT_ADMIN_ROLE, Session};
use crate::report::AttachmentLimits;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "TRUSTBITE_CONFIG";
pub const API_URL_ENV: &str = "TRUSTBITE_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub api_base_url: String,
    pub timeout_secs: u64,
    pub max_attachments: usize,
    pub max_attachment_bytes: u64,
    pub admin_role: String,
    pub session: Session,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            timeout_secs: 30,
            max_attachments: 5,
            max_attachment_bytes: 5 * 1024 * 1024,
            admin_role: DEFAULT_ADMIN_ROLE.to_string(),
            session: Session::default(),
        }
    }
}

impl PortalConfig {
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(explicit)? {
            Some(path) => {
                let source = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                Self::from_yaml_str(&source)
                    .with_context(|| format!("Invalid config file: {}", path.display()))?
            }
            None => Self::default(),
        };

        config.apply_overrides(env::var(API_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let mut value: serde_yml::Value = serde_yml::from_str(source)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        expand_value(&mut value, &|name| env::var(name).ok())?;
        let config: PortalConfig = serde_yml::from_value(value)?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.api_base_url)
            .with_context(|| format!("Invalid api_base_url: {}", self.api_base_url))?;

        if self.timeout_secs == 0 {
            return Err(anyhow::anyhow!("timeout_secs must be greater than zero"));
        }
        if self.max_attachments == 0 {
            return Err(anyhow::anyhow!("max_attachments must be at least 1"));
        }
        if self.max_attachment_bytes == 0 {
            return Err(anyhow::anyhow!("max_attachment_bytes must be greater than zero"));
        }
        if self.admin_role.trim().is_empty() {
            return Err(anyhow::anyhow!("admin_role cannot be empty"));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn admin_policy(&self) -> AdminPolicy {
        AdminPolicy {
            role: self.admin_role.clone(),
        }
    }

    pub fn attachment_limits(&self) -> AttachmentLimits {
        AttachmentLimits {
            max_files: self.max_attachments,
            max_bytes: self.max_attachment_bytes,
            ..AttachmentLimits::default()
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yml::to_string(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(path, self.to_yaml()?)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("trustbite").join("config.yml"))
        .ok_or_else(|| anyhow::anyhow!("Config directory not found"))
}

/// Explicit path, then `$TRUSTBITE_CONFIG`, then the per-user config file. A missing
/// explicit or env-provided file is an error; a missing default file means defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    let requested = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var(CONFIG_ENV).ok().map(PathBuf::from));

    if let Some(path) = requested {
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Config file not found: {}",
                path.display()
            ));
        }
        return Ok(Some(path));
    }

    let default_path = default_config_path()?;
    Ok(default_path.exists().then_some(default_path))
}

fn expand_value(
    value: &mut serde_yml::Value,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<()> {
    match value {
        serde_yml::Value::String(s) => {
            *s = expand_env_vars(s, lookup).map_err(|e| anyhow::anyhow!(e))?;
        }
        serde_yml::Value::Sequence(items) => {
            for item in items {
                expand_value(item, lookup)?;
            }
        }
        serde_yml::Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                expand_value(item, lookup)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn expand_env_vars(value: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Result<String, String> {
    let mut result = value.to_string();
    let mut cursor = 0;

    while let Some(offset) = result[cursor..].find("${") {
        let start = cursor + offset;
        let end = result[start..]
            .find('}')
            .ok_or_else(|| format!("Unclosed environment variable reference in: {value}"))?;
        let end = start + end;

        let var_name = &result[start + 2..end];
        let env_value =
            lookup(var_name).ok_or_else(|| format!("Environment variable not found: {var_name}"))?;

        result.replace_range(start..end + 1, &env_value);
        cursor = start + env_value.len();
    }

    Ok(result)
}
