use crate::error::{PortalError, PortalResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ADMIN_ROLE: &str = "Admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMembership {
    pub organization: String,
    pub role: String,
}

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub memberships: Vec<OrgMembership>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserIdentity>,
}

impl Session {
    pub fn signed_in(user: UserIdentity) -> Self {
        Self { user: Some(user) }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPolicy {
    pub role: String,
}

impl Default for AdminPolicy {
    fn default() -> Self {
        Self {
            role: DEFAULT_ADMIN_ROLE.to_string(),
        }
    }
}

/// Reporter details attached to every submission. Copied from the identity, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reporter {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&UserIdentity> for Reporter {
    fn from(user: &UserIdentity) -> Self {
        Self {
            id: user.id.clone(),
            name: user.full_name.clone(),
            email: user.email.clone(),
        }
    }
}

pub fn require_signed_in(session: &Session) -> PortalResult<&UserIdentity> {
    session.user.as_ref().ok_or(PortalError::Unauthenticated)
}

/// Role-claim check: a user is an administrator iff one of their organization memberships
/// carries the policy's role.
pub fn is_admin(user: &UserIdentity, policy: &AdminPolicy) -> bool {
    user.memberships.iter().any(|m| m.role == policy.role)
}

pub fn require_admin<'a>(
    session: &'a Session,
    policy: &AdminPolicy,
) -> PortalResult<&'a UserIdentity> {
    let user = require_signed_in(session)?;
    if is_admin(user, policy) {
        Ok(user)
    } else {
        Err(PortalError::Forbidden)
    }
}
