//! One-shot platform operations shared by the strategies.

use tracing::{debug, warn};

use zdd_core::{PlatformClient, PlatformError, PlatformResult, base_app_name};

/// The simple operations strategies compose. Kept behind a trait so a
/// strategy can be exercised against a stub.
pub trait Operations {
    /// First deployed app sharing `name`'s base name, if any.
    fn is_application_deployed(&self, name: &str) -> Option<String>;

    /// Every deployed app sharing `name`'s base name, in platform order.
    fn deployed_versions(&self, name: &str) -> Vec<String>;

    fn push_application(
        &self,
        name: &str,
        artifact: Option<&str>,
        manifest: Option<&str>,
        extra: &[&str],
    ) -> PlatformResult<()>;

    fn rename_application(&self, from: &str, to: &str) -> PlatformResult<()>;

    /// Move every route of `from` onto `to`.
    fn remap_routes(&self, from: &str, to: &str) -> PlatformResult<()>;

    fn remove_application(&self, name: &str) -> PlatformResult<()>;

    /// Shared domain of the platform, derived from its authorization endpoint.
    fn default_domain(&self) -> PlatformResult<String>;
}

pub struct CommonCommands<'a> {
    platform: &'a dyn PlatformClient,
}

impl<'a> CommonCommands<'a> {
    pub fn new(platform: &'a dyn PlatformClient) -> Self {
        Self { platform }
    }
}

impl Operations for CommonCommands<'_> {
    fn is_application_deployed(&self, name: &str) -> Option<String> {
        self.deployed_versions(name).into_iter().next()
    }

    fn deployed_versions(&self, name: &str) -> Vec<String> {
        let base = base_app_name(name);
        match self.platform.get_apps() {
            Ok(apps) => apps
                .into_iter()
                .map(|a| a.name)
                .filter(|n| n.starts_with(base))
                .collect(),
            Err(e) => {
                warn!(error = %e, "could not list applications");
                Vec::new()
            }
        }
    }

    fn push_application(
        &self,
        name: &str,
        artifact: Option<&str>,
        manifest: Option<&str>,
        extra: &[&str],
    ) -> PlatformResult<()> {
        if name.is_empty() {
            return Err(PlatformError::InvalidArgument(
                "appname must be specified".to_string(),
            ));
        }
        let mut args = vec!["push", name];
        if let Some(m) = manifest {
            args.extend(["-f", m]);
        }
        if let Some(p) = artifact {
            args.extend(["-p", p]);
        }
        args.extend_from_slice(extra);
        self.platform.cli_command(&args)?;
        Ok(())
    }

    fn rename_application(&self, from: &str, to: &str) -> PlatformResult<()> {
        if from.is_empty() || to.is_empty() {
            return Err(PlatformError::InvalidArgument(
                "appname and new appname must be specified".to_string(),
            ));
        }
        self.platform.cli_command(&["rename", from, to])?;
        Ok(())
    }

    fn remap_routes(&self, from: &str, to: &str) -> PlatformResult<()> {
        let model = self.platform.get_app(from)?;
        let mut last_err = None;

        for route in &model.routes {
            if let Err(e) = self
                .platform
                .cli_command(&["map-route", to, &route.domain, "-n", &route.host])
            {
                warn!(route = %route.url(), app = %to, error = %e, "map-route failed");
                last_err = Some(e);
            }
        }
        for route in &model.routes {
            if let Err(e) = self
                .platform
                .cli_command(&["unmap-route", from, &route.domain, "-n", &route.host])
            {
                warn!(route = %route.url(), app = %from, error = %e, "unmap-route failed");
                last_err = Some(e);
            }
        }

        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn remove_application(&self, name: &str) -> PlatformResult<()> {
        if name.is_empty() {
            return Err(PlatformError::InvalidArgument(
                "appname must be specified".to_string(),
            ));
        }
        self.platform.cli_command(&["delete", name, "-f"])?;
        Ok(())
    }

    fn default_domain(&self) -> PlatformResult<String> {
        let output = self.platform.cli_command_silent(&["curl", "/v2/info"])?;
        let info: serde_json::Value = serde_json::from_str(&output.join(""))?;
        let endpoint = info
            .get("authorization_endpoint")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PlatformError::Decode("authorization_endpoint missing from /v2/info".to_string())
            })?;
        let domain = domain_of(endpoint).ok_or_else(|| {
            PlatformError::Decode(format!("cannot derive a domain from {endpoint}"))
        })?;
        debug!(%domain, "resolved default domain");
        Ok(domain.to_string())
    }
}

/// Everything after the first `.`: `https://login.sys.example.com` gives
/// `sys.example.com`.
fn domain_of(endpoint: &str) -> Option<&str> {
    endpoint
        .split_once('.')
        .map(|(_, rest)| rest)
        .filter(|rest| !rest.is_empty())
}
