//! Static usage text for `zdd-help`.

use zdd_rollout::{BLUE_GREEN, CANARY_DEPLOY, CANARY_PROMOTE, SCALEOVER, ZDD_DEPLOY};

const ZDD_DEPLOY_HELP: &str = "deploy-zdd help
\t--old-app = The name of the existing application
\t--new-app = The name of the new application
\t--duration = The time for scaling over the application, default is 480s
\t-p = The path to the application file
\t-f = The path to the application manifest";

const CANARY_DEPLOY_HELP: &str = "deploy-canary help
\t--new-app = The name of the new application
\t-p = The path to the application file
\t-f = The path to the application manifest";

const CANARY_PROMOTE_HELP: &str = "promote-canary help
\t--old-app = The name of the existing application
\t--new-app = The name of the new application
\t--duration = The time for scaling over the application
\t--no-route-check = Do not require the applications to share a route";

const SCALEOVER_HELP: &str = "scaleover help
\t--old-app = The name of the existing application
\t--new-app = The name of the new application
\t--duration = The time for scaling over the application
\t--no-route-check = Do not require the applications to share a route";

const BLUE_GREEN_HELP: &str = "blue-green help
\t--new-app = The name of the new application
\t-p = The path to the application file
\t-f = The path to the application manifest";

const OVERVIEW: &str = "Help is available for the deployment types:
\t - deploy-canary
\t - promote-canary
\t - blue-green
\t - deploy-zdd
\t - scaleover
Use the command zdd-help <deploy command> for command specific help";

/// Usage text for `topic`, or the overview when the topic is absent or unknown.
pub fn help_text(topic: Option<&str>) -> &'static str {
    match topic {
        Some(ZDD_DEPLOY) => ZDD_DEPLOY_HELP,
        Some(CANARY_DEPLOY) => CANARY_DEPLOY_HELP,
        Some(CANARY_PROMOTE) => CANARY_PROMOTE_HELP,
        Some(SCALEOVER) => SCALEOVER_HELP,
        Some(BLUE_GREEN) => BLUE_GREEN_HELP,
        _ => OVERVIEW,
    }
}
