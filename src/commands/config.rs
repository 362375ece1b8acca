use crate::config::{PortalConfig, default_config_path};
use anyhow::Result;
use std::path::{Path, PathBuf};

pub fn execute_config_init(path: Option<&Path>, force: bool) -> Result<PathBuf> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        ));
    }

    PortalConfig::default().save(&path)?;
    println!("✓ Wrote default config to {}", path.display());
    println!("  Add your signed-in identity under `session.user` before using the portal.");
    Ok(path)
}

pub fn execute_config_show(path: Option<&Path>) -> Result<()> {
    let config = PortalConfig::load(path)?;
    print!("{}", config.to_yaml()?);
    Ok(())
}
