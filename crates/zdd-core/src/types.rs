//! Shared types used across cf-zdd crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a deployed application as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Started,
    Stopped,
    Unknown,
}

impl LifecycleState {
    /// Map a platform state string (`STARTED`, `stopped`, ...) to a state.
    pub fn from_platform(state: &str) -> Self {
        match state.to_ascii_lowercase().as_str() {
            "started" => LifecycleState::Started,
            "stopped" => LifecycleState::Stopped,
            _ => LifecycleState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Started => "started",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A host + domain binding mapped to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteModel {
    pub host: String,
    pub domain: String,
}

impl RouteModel {
    pub fn new(host: &str, domain: &str) -> Self {
        Self {
            host: host.to_string(),
            domain: domain.to_string(),
        }
    }

    /// `host.domain`, or the bare domain for a host-less route.
    pub fn url(&self) -> String {
        if self.host.is_empty() {
            self.domain.clone()
        } else {
            format!("{}.{}", self.host, self.domain)
        }
    }
}

/// Full description of one application, as fetched from the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppModel {
    pub name: String,
    pub guid: String,
    pub state: LifecycleState,
    /// Instances requested by the app's configuration.
    pub instance_count: u32,
    /// Instances the platform currently reports as running.
    pub running_instances: u32,
    pub routes: Vec<RouteModel>,
}

/// Entry of the application listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSummary {
    pub name: String,
}

/// Base name of a versioned application: everything before the first `#`.
///
/// `my-app#1.2.3` and `my-app#1.2.4` share the base name `my-app`.
pub fn base_app_name(name: &str) -> &str {
    name.split('#').next().unwrap_or(name)
}
