//! [`PlatformClient`] backed by the `cf` command-line tool.
//!
//! Commands are executed as child processes. Application lookups go through
//! `cf curl` against the v2 API of the currently targeted space, whose GUID
//! is read from `$CF_HOME/.cf/config.json`.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::config::ZddConfig;
use crate::error::{PlatformError, PlatformResult};
use crate::platform::PlatformClient;
use crate::types::{AppModel, AppSummary, LifecycleState, RouteModel};

pub struct CfCli {
    binary: String,
    home: Option<PathBuf>,
}

impl CfCli {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
            home: None,
        }
    }

    pub fn from_config(config: &ZddConfig) -> Self {
        Self {
            binary: config.cf_binary(),
            home: config.cf.home.clone(),
        }
    }

    fn run(&self, args: &[&str], echo: bool) -> PlatformResult<Vec<String>> {
        debug!(binary = %self.binary, ?args, "running platform command");
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|source| PlatformError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines: Vec<String> = stdout.lines().map(str::to_string).collect();
        if echo {
            for line in &lines {
                println!("{line}");
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // cf reports most failures on stdout after a FAILED marker.
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(PlatformError::CommandFailed {
                command: format!("{} {}", self.binary, args.join(" ")),
                status: output.status.code().unwrap_or(-1),
                stderr: detail,
            });
        }
        Ok(lines)
    }

    fn curl<T: serde::de::DeserializeOwned>(&self, path: &str) -> PlatformResult<T> {
        let body = self.run(&["curl", path], false)?.join("\n");
        let value: serde_json::Value = serde_json::from_str(&body)?;
        if let Some(code) = value.get("error_code").and_then(|c| c.as_str()) {
            let description = value
                .get("description")
                .and_then(|d| d.as_str())
                .unwrap_or_default();
            return Err(PlatformError::Decode(format!("{code}: {description}")));
        }
        Ok(serde_json::from_value(value)?)
    }

    fn config_path(&self) -> PlatformResult<PathBuf> {
        let home = match &self.home {
            Some(h) => h.clone(),
            None => std::env::var_os("CF_HOME")
                .or_else(|| std::env::var_os("HOME"))
                .map(PathBuf::from)
                .ok_or_else(|| {
                    PlatformError::Config("neither CF_HOME nor HOME is set".to_string())
                })?,
        };
        Ok(home.join(".cf").join("config.json"))
    }

    fn space_guid(&self) -> PlatformResult<String> {
        let path = self.config_path()?;
        read_space_guid(&path)
    }

    fn find_app_guid(&self, space: &str, name: &str) -> PlatformResult<String> {
        let page: Page<AppEntity> = self.curl(&app_lookup_path(space, name))?;
        page.resources
            .into_iter()
            .next()
            .map(|r| r.metadata.guid)
            .ok_or_else(|| PlatformError::AppNotFound(name.to_string()))
    }
}

impl PlatformClient for CfCli {
    fn get_app(&self, name: &str) -> PlatformResult<AppModel> {
        let space = self.space_guid()?;
        let guid = self.find_app_guid(&space, name)?;
        let summary: AppSummaryBody = self.curl(&format!("/v2/apps/{guid}/summary"))?;
        Ok(summary.into_model())
    }

    fn get_apps(&self) -> PlatformResult<Vec<AppSummary>> {
        let space = self.space_guid()?;
        let mut next = Some(format!("/v2/spaces/{space}/apps?results-per-page=100"));
        let mut apps = Vec::new();
        while let Some(path) = next {
            let page: Page<AppEntity> = self.curl(&path)?;
            apps.extend(page.resources.into_iter().map(|r| AppSummary {
                name: r.entity.name,
            }));
            next = page.next_url;
        }
        Ok(apps)
    }

    fn cli_command(&self, args: &[&str]) -> PlatformResult<Vec<String>> {
        self.run(args, true)
    }

    fn cli_command_silent(&self, args: &[&str]) -> PlatformResult<Vec<String>> {
        self.run(args, false)
    }
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default)]
    next_url: Option<String>,
    #[serde(default = "Vec::new")]
    resources: Vec<Resource<T>>,
}

#[derive(Debug, Deserialize)]
struct Resource<T> {
    metadata: Metadata,
    entity: T,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    guid: String,
}

#[derive(Debug, Deserialize)]
struct AppEntity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AppSummaryBody {
    guid: String,
    name: String,
    state: String,
    #[serde(default)]
    instances: u32,
    #[serde(default)]
    running_instances: Option<u32>,
    #[serde(default)]
    routes: Vec<SummaryRoute>,
}

#[derive(Debug, Deserialize)]
struct SummaryRoute {
    #[serde(default)]
    host: String,
    domain: SummaryDomain,
}

#[derive(Debug, Deserialize)]
struct SummaryDomain {
    name: String,
}

impl AppSummaryBody {
    fn into_model(self) -> AppModel {
        AppModel {
            name: self.name,
            guid: self.guid,
            state: LifecycleState::from_platform(&self.state),
            instance_count: self.instances,
            running_instances: self.running_instances.unwrap_or(0),
            routes: self
                .routes
                .into_iter()
                .map(|r| RouteModel {
                    host: r.host,
                    domain: r.domain.name,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CfConfigFile {
    #[serde(rename = "SpaceFields", default)]
    space_fields: Option<SpaceFields>,
}

#[derive(Debug, Deserialize)]
struct SpaceFields {
    #[serde(rename = "GUID", default)]
    guid: String,
}

fn read_space_guid(path: &Path) -> PlatformResult<String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PlatformError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    let config: CfConfigFile = serde_json::from_str(&content)?;
    config
        .space_fields
        .map(|s| s.guid)
        .filter(|g| !g.is_empty())
        .ok_or(PlatformError::NotTargeted)
}

/// v2 lookup of `name` in `space`; app names may carry `#` and spaces.
fn app_lookup_path(space: &str, name: &str) -> String {
    format!("/v2/spaces/{space}/apps?q=name:{}", urlencoding::encode(name))
}
