pub mod admin;
pub mod check;
pub mod complaint;
pub mod config;
pub mod report;
pub mod status;

use crate::client::PortalClient;
use crate::config::PortalConfig;
use crate::identity::{Reporter, UserIdentity, require_signed_in};
use anyhow::Result;

/// Everything a signed-in command needs.
pub struct CommandContext {
    pub config: PortalConfig,
    pub client: PortalClient,
    pub user: UserIdentity,
}

impl CommandContext {
    /// The one sign-in guard for every command that talks to the portal.
    pub fn signed_in(config: PortalConfig) -> Result<Self> {
        let user = require_signed_in(&config.session)?.clone();
        let client = PortalClient::new(&config)?;
        Ok(Self {
            config,
            client,
            user,
        })
    }

    pub fn reporter(&self) -> Reporter {
        Reporter::from(&self.user)
    }
}
