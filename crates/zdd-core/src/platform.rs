//! The platform client seam.
//!
//! Everything cf-zdd does to the remote control plane goes through
//! [`PlatformClient`]. Production code uses [`crate::cf::CfCli`]; tests use
//! the recording fake in `fake`.

use crate::error::PlatformResult;
use crate::types::{AppModel, AppSummary};

pub trait PlatformClient {
    /// Fetch one application by name.
    fn get_app(&self, name: &str) -> PlatformResult<AppModel>;

    /// List the applications of the targeted space.
    fn get_apps(&self) -> PlatformResult<Vec<AppSummary>>;

    /// Run a platform CLI command, echoing its output to the operator.
    fn cli_command(&self, args: &[&str]) -> PlatformResult<Vec<String>>;

    /// Run a platform CLI command without terminal output.
    fn cli_command_silent(&self, args: &[&str]) -> PlatformResult<Vec<String>>;
}

impl<P: PlatformClient + ?Sized> PlatformClient for &P {
    fn get_app(&self, name: &str) -> PlatformResult<AppModel> {
        (**self).get_app(name)
    }

    fn get_apps(&self) -> PlatformResult<Vec<AppSummary>> {
        (**self).get_apps()
    }

    fn cli_command(&self, args: &[&str]) -> PlatformResult<Vec<String>> {
        (**self).cli_command(args)
    }

    fn cli_command_silent(&self, args: &[&str]) -> PlatformResult<Vec<String>> {
        (**self).cli_command_silent(args)
    }
}
