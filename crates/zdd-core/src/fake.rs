//! In-memory platform for tests.
//!
//! `FakePlatform` records every command it is asked to run and applies the
//! ones that change application state (`push`, `rename`, `delete`, `start`,
//! `stop`, `scale` and the route verbs) to its own app table, so a
//! test can assert on both the command sequence and the resulting state.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::error::{PlatformError, PlatformResult};
use crate::platform::PlatformClient;
use crate::types::{AppModel, AppSummary, LifecycleState, RouteModel};

/// One recorded command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<String>,
    pub silent: bool,
}

impl Invocation {
    pub fn line(&self) -> String {
        self.args.join(" ")
    }
}

#[derive(Default)]
pub struct FakePlatform {
    apps: RefCell<Vec<AppModel>>,
    invocations: RefCell<Vec<Invocation>>,
    /// Commands (by verb) that fail.
    failing_verbs: RefCell<Vec<String>>,
    /// Canned output per verb, e.g. `curl`.
    outputs: RefCell<HashMap<String, Vec<String>>>,
    /// Running-instance counts reported by successive `get_app` calls.
    running: RefCell<HashMap<String, VecDeque<u32>>>,
    get_app_calls: RefCell<HashMap<String, usize>>,
    list_fails: RefCell<bool>,
    /// Routes a `push` without `--no-route` gives the pushed app.
    manifest_routes: RefCell<Vec<RouteModel>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an app; `routes` are `(host, domain)` pairs.
    pub fn with_app(
        self,
        name: &str,
        state: LifecycleState,
        instances: u32,
        routes: &[(&str, &str)],
    ) -> Self {
        self.apps.borrow_mut().push(AppModel {
            name: name.to_string(),
            guid: format!("guid-{name}"),
            state,
            instance_count: instances,
            running_instances: if state == LifecycleState::Started {
                instances
            } else {
                0
            },
            routes: routes.iter().map(|(h, d)| RouteModel::new(h, d)).collect(),
        });
        self
    }

    /// Make every command whose first word is `verb` fail.
    pub fn failing(self, verb: &str) -> Self {
        self.failing_verbs.borrow_mut().push(verb.to_string());
        self
    }

    /// Canned output for commands whose first word is `verb`.
    pub fn with_output(self, verb: &str, lines: &[&str]) -> Self {
        self.outputs.borrow_mut().insert(
            verb.to_string(),
            lines.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    /// Running-instance counts returned by the next `get_app(name)` calls;
    /// once drained, the app's stored value is used.
    pub fn with_running_sequence(self, name: &str, counts: &[u32]) -> Self {
        self.running
            .borrow_mut()
            .insert(name.to_string(), counts.iter().copied().collect());
        self
    }

    /// Routes mapped by every `push` that does not pass `--no-route`, as a
    /// manifest's `routes:` would.
    pub fn with_manifest_routes(self, routes: &[(&str, &str)]) -> Self {
        *self.manifest_routes.borrow_mut() =
            routes.iter().map(|(h, d)| RouteModel::new(h, d)).collect();
        self
    }

    /// Make `get_apps` fail.
    pub fn failing_list(self) -> Self {
        *self.list_fails.borrow_mut() = true;
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Recorded command lines, space-joined.
    pub fn lines(&self) -> Vec<String> {
        self.invocations.borrow().iter().map(Invocation::line).collect()
    }

    /// Recorded commands whose first word is `verb`.
    pub fn lines_for(&self, verb: &str) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .filter(|i| i.args.first().map(String::as_str) == Some(verb))
            .map(Invocation::line)
            .collect()
    }

    pub fn get_app_calls(&self, name: &str) -> usize {
        self.get_app_calls.borrow().get(name).copied().unwrap_or(0)
    }

    /// Current state of an app, if it exists.
    pub fn app(&self, name: &str) -> Option<AppModel> {
        self.apps.borrow().iter().find(|a| a.name == name).cloned()
    }

    fn record(&self, args: &[&str], silent: bool) -> PlatformResult<Vec<String>> {
        self.invocations.borrow_mut().push(Invocation {
            args: args.iter().map(|a| a.to_string()).collect(),
            silent,
        });
        let verb = args.first().copied().unwrap_or_default();
        if self.failing_verbs.borrow().iter().any(|v| v == verb) {
            return Err(PlatformError::CommandFailed {
                command: args.join(" "),
                status: 1,
                stderr: format!("{verb} failed"),
            });
        }
        self.apply(args);
        Ok(self.outputs.borrow().get(verb).cloned().unwrap_or_default())
    }

    fn apply(&self, args: &[&str]) {
        let mut guard = self.apps.borrow_mut();
        let apps: &mut Vec<AppModel> = &mut guard;
        match args {
            ["push", name, rest @ ..] => {
                let instances = flag_value(rest, "-i")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1);
                let state = if rest.contains(&"--no-start") {
                    LifecycleState::Stopped
                } else {
                    LifecycleState::Started
                };
                let running = if state == LifecycleState::Started { instances } else { 0 };
                let i = match position(apps, name) {
                    Some(i) => {
                        apps[i].instance_count = instances;
                        apps[i].state = state;
                        apps[i].running_instances = running;
                        i
                    }
                    None => {
                        apps.push(AppModel {
                            name: name.to_string(),
                            guid: format!("guid-{name}"),
                            state,
                            instance_count: instances,
                            running_instances: running,
                            routes: Vec::new(),
                        });
                        apps.len() - 1
                    }
                };
                if !rest.contains(&"--no-route") {
                    for route in self.manifest_routes.borrow().iter() {
                        if !apps[i].routes.contains(route) {
                            apps[i].routes.push(route.clone());
                        }
                    }
                }
            }
            ["rename", from, to] => {
                if let Some(i) = position(apps, from) {
                    apps[i].name = to.to_string();
                }
            }
            ["delete", name, ..] => {
                apps.retain(|a| a.name != *name);
            }
            ["start", name] => {
                if let Some(i) = position(apps, name) {
                    apps[i].state = LifecycleState::Started;
                }
            }
            ["stop", name] => {
                if let Some(i) = position(apps, name) {
                    apps[i].state = LifecycleState::Stopped;
                }
            }
            ["scale", "-i", count, name] => {
                if let (Some(i), Ok(n)) = (position(apps, name), count.parse()) {
                    apps[i].instance_count = n;
                }
            }
            ["map-route", name, domain, "-n", host] => {
                if let Some(i) = position(apps, name) {
                    apps[i].routes.push(RouteModel::new(host, domain));
                }
            }
            ["unmap-route", name, domain, "-n", host] => {
                if let Some(i) = position(apps, name) {
                    apps[i].routes.retain(|r| !(r.host == *host && r.domain == *domain));
                }
            }
            ["delete-route", domain, "-n", host, ..] => {
                for app in apps.iter_mut() {
                    app.routes.retain(|r| !(r.host == *host && r.domain == *domain));
                }
            }
            _ => {}
        }
    }
}

fn position(apps: &[AppModel], name: &str) -> Option<usize> {
    apps.iter().position(|a| a.name == name)
}

fn flag_value<'a>(args: &[&'a str], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| *a == flag)
        .and_then(|i| args.get(i + 1).copied())
}

impl PlatformClient for FakePlatform {
    fn get_app(&self, name: &str) -> PlatformResult<AppModel> {
        *self
            .get_app_calls
            .borrow_mut()
            .entry(name.to_string())
            .or_insert(0) += 1;
        let mut app = self
            .app(name)
            .ok_or_else(|| PlatformError::AppNotFound(name.to_string()))?;
        if let Some(next) = self
            .running
            .borrow_mut()
            .get_mut(name)
            .and_then(VecDeque::pop_front)
        {
            app.running_instances = next;
        }
        Ok(app)
    }

    fn get_apps(&self) -> PlatformResult<Vec<AppSummary>> {
        if *self.list_fails.borrow() {
            return Err(PlatformError::Decode("listing failed".to_string()));
        }
        Ok(self
            .apps
            .borrow()
            .iter()
            .map(|a| AppSummary {
                name: a.name.clone(),
            })
            .collect())
    }

    fn cli_command(&self, args: &[&str]) -> PlatformResult<Vec<String>> {
        self.record(args, false)
    }

    fn cli_command_silent(&self, args: &[&str]) -> PlatformResult<Vec<String>> {
        self.record(args, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_scale_and_rename() {
        let fake = FakePlatform::new().with_app("a", LifecycleState::Started, 2, &[]);
        fake.cli_command_silent(&["scale", "-i", "5", "a"]).unwrap();
        fake.cli_command(&["rename", "a", "b"]).unwrap();
        assert!(fake.app("a").is_none());
        assert_eq!(fake.app("b").unwrap().instance_count, 5);
        assert_eq!(fake.lines(), vec!["scale -i 5 a", "rename a b"]);
        assert!(fake.invocations()[0].silent);
    }

    #[test]
    fn failing_verb_is_recorded_and_not_applied() {
        let fake = FakePlatform::new()
            .with_app("a", LifecycleState::Started, 2, &[])
            .failing("scale");
        assert!(fake.cli_command_silent(&["scale", "-i", "5", "a"]).is_err());
        assert_eq!(fake.app("a").unwrap().instance_count, 2);
        assert_eq!(fake.lines_for("scale").len(), 1);
    }

    #[test]
    fn running_sequence_drains_then_falls_back() {
        let fake = FakePlatform::new()
            .with_app("a", LifecycleState::Started, 3, &[])
            .with_running_sequence("a", &[0, 1]);
        assert_eq!(fake.get_app("a").unwrap().running_instances, 0);
        assert_eq!(fake.get_app("a").unwrap().running_instances, 1);
        assert_eq!(fake.get_app("a").unwrap().running_instances, 3);
        assert_eq!(fake.get_app_calls("a"), 3);
    }

    #[test]
    fn push_maps_manifest_routes_unless_told_not_to() {
        let fake = FakePlatform::new().with_manifest_routes(&[("shop", "example.com")]);
        fake.cli_command(&["push", "routed"]).unwrap();
        fake.cli_command(&["push", "bare", "--no-route"]).unwrap();
        fake.cli_command(&["push", "routed", "-i", "1", "--no-start"]).unwrap();

        let routed = fake.app("routed").unwrap();
        assert_eq!(routed.routes, vec![RouteModel::new("shop", "example.com")]);
        assert_eq!(routed.state, LifecycleState::Stopped);
        assert!(fake.app("bare").unwrap().routes.is_empty());
    }
}
