//! The typed command record shared by every command.

/// Arguments of one invocation, as parsed from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandArgs {
    pub old_app: String,
    pub new_app: String,
    pub duration: Option<String>,
    pub application_path: Option<String>,
    pub manifest_path: Option<String>,
    pub custom_url: Option<String>,
    /// Accepted for compatibility; stepping always moves one instance.
    pub batch_size: u32,
    /// Require old and new app to share a route before scaling over.
    pub enforce_routes: bool,
}

impl Default for CommandArgs {
    fn default() -> Self {
        Self {
            old_app: String::new(),
            new_app: String::new(),
            duration: None,
            application_path: None,
            manifest_path: None,
            custom_url: None,
            batch_size: 1,
            enforce_routes: true,
        }
    }
}

impl CommandArgs {
    pub fn artifact(&self) -> Option<&str> {
        non_empty(self.application_path.as_deref())
    }

    pub fn manifest(&self) -> Option<&str> {
        non_empty(self.manifest_path.as_deref())
    }

    pub fn duration(&self) -> Option<&str> {
        non_empty(self.duration.as_deref())
    }

    pub fn custom_url(&self) -> Option<&str> {
        non_empty(self.custom_url.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
