use anyhow::Result;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use trustbite::client::PortalClient;
use trustbite::config::PortalConfig;
use trustbite::devserver::{DevState, Fixtures, serve};
use trustbite::identity::{OrgMembership, Reporter, Session, UserIdentity};
use typed_builder::TypedBuilder;

#[macro_export]
macro_rules! assert_error_contains {
    ($result:expr, $expected_substring:expr) => {
        match $result {
            Ok(_) => panic!("Expected an error, but got Ok"),
            Err(e) => assert!(
                e.to_string().contains($expected_substring),
                "Error message should contain '{}', but got: '{}'",
                $expected_substring,
                e.to_string()
            ),
        }
    };
}

#[allow(dead_code)]
#[derive(TypedBuilder)]
pub struct TestUser {
    #[builder(default = "user_demo".to_string(), setter(into))]
    id: String,
    #[builder(default = "Demo User".to_string(), setter(into))]
    full_name: String,
    #[builder(default = "demo@example.in".to_string(), setter(into))]
    email: String,
    #[builder(default = vec![])]
    roles: Vec<&'static str>,
}

#[allow(dead_code)]
impl TestUser {
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            memberships: self
                .roles
                .iter()
                .map(|role| OrgMembership {
                    organization: "trustbite".to_string(),
                    role: role.to_string(),
                })
                .collect(),
        }
    }

    pub fn reporter(&self) -> Reporter {
        Reporter::from(&self.identity())
    }

    pub fn config(&self, base_url: &str) -> PortalConfig {
        PortalConfig {
            api_base_url: base_url.to_string(),
            timeout_secs: 5,
            session: Session::signed_in(self.identity()),
            ..PortalConfig::default()
        }
    }
}

/// Dev server on an ephemeral port; it stops with the test's runtime.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: DevState,
}

#[allow(dead_code)]
impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(Fixtures::sample()).await
    }

    pub async fn start_with(fixtures: Fixtures) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = DevState::new(fixtures);
        let server_state = state.clone();
        tokio::spawn(async move { serve(listener, server_state).await });
        Ok(Self { addr, state })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> Result<PortalClient> {
        PortalClient::new(&TestUser::builder().build().config(&self.base_url()))
    }
}

/// Serves an arbitrary router, for failure modes the dev server never produces.
#[allow(dead_code)]
pub async fn serve_router(router: axum::Router) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, router).await });
    Ok(format!("http://{addr}"))
}

#[allow(dead_code)]
pub fn write_png(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])?;
    Ok(path)
}
