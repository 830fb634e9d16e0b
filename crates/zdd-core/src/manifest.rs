//! Application manifest (`manifest.yml`) domain extraction.
//!
//! Only the routing fields matter here: an optional scalar `domain`, an
//! optional `domains` list and a `routes` list, either at the top level or on
//! the first entry of the `applications` list.

use std::path::Path;

use serde::Deserialize;

/// Manifest file looked up in the working directory when none is given.
pub const DEFAULT_MANIFEST: &str = "manifest.yml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub routes: Vec<ManifestRoute>,
    #[serde(default)]
    pub applications: Vec<ManifestApplication>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestApplication {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub routes: Vec<ManifestRoute>,
}

/// One `routes:` entry, e.g. `route: shop.apps.example.com`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestRoute {
    #[serde(default)]
    pub route: String,
}

impl ManifestRoute {
    /// The route's domain: everything after the host label, without any
    /// port or path. `shop.apps.example.com/api` gives `apps.example.com`.
    pub fn domain(&self) -> Option<&str> {
        let authority = self.route.split('/').next().unwrap_or_default();
        let authority = authority.split(':').next().unwrap_or_default();
        authority
            .split_once('.')
            .map(|(_, domain)| domain)
            .filter(|domain| !domain.is_empty())
    }
}

impl Manifest {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Domains to map, `domains` first and then `domain`. Without either,
    /// the domain of the first `routes` entry.
    ///
    /// Falls back to the first application entry when the top level names
    /// no domain at all. Empty when the manifest carries no routing domain.
    pub fn route_domains(&self) -> Vec<String> {
        let top = level_domains(&self.domains, self.domain.as_deref(), &self.routes);
        if !top.is_empty() {
            return top;
        }
        self.applications
            .first()
            .map(|app| level_domains(&app.domains, app.domain.as_deref(), &app.routes))
            .unwrap_or_default()
    }
}

fn level_domains(domains: &[String], domain: Option<&str>, routes: &[ManifestRoute]) -> Vec<String> {
    let mut merged: Vec<String> = domains
        .iter()
        .filter(|d| !d.is_empty())
        .cloned()
        .collect();
    if let Some(d) = domain.filter(|d| !d.is_empty()) {
        merged.push(d.to_string());
    }
    if merged.is_empty()
        && let Some(d) = routes.first().and_then(ManifestRoute::domain)
    {
        merged.push(d.to_string());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domains_then_domain() {
        let m = Manifest::parse("domain: x.com\ndomains:\n  - y.com\n").unwrap();
        assert_eq!(m.route_domains(), vec!["y.com", "x.com"]);
    }

    #[test]
    fn single_domain() {
        let m = Manifest::parse("domain: x.com\n").unwrap();
        assert_eq!(m.route_domains(), vec!["x.com"]);
    }

    #[test]
    fn no_domains() {
        let m = Manifest::parse("name: app\ninstances: 2\n").unwrap();
        assert!(m.route_domains().is_empty());
    }

    #[test]
    fn empty_file() {
        let m = Manifest::parse("").unwrap();
        assert!(m.route_domains().is_empty());
    }

    #[test]
    fn application_entry_fallback() {
        let yaml = r#"
applications:
- name: my-app
  domains:
  - a.example.com
  - b.example.com
- name: other
  domain: ignored.com
"#;
        let m = Manifest::parse(yaml).unwrap();
        assert_eq!(m.route_domains(), vec!["a.example.com", "b.example.com"]);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(Manifest::parse("domains: [unterminated").is_err());
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_MANIFEST);
        std::fs::write(&path, "domains:\n  - y.com\n").unwrap();
        let m = Manifest::from_file(&path).unwrap();
        assert_eq!(m.route_domains(), vec!["y.com"]);
    }

    #[test]
    fn routes_give_the_domain_after_the_host() {
        let m = Manifest::parse("routes:\n- route: shop.apps.example.com\n- route: x.other.com\n").unwrap();
        assert_eq!(m.route_domains(), vec!["apps.example.com"]);
    }

    #[test]
    fn application_routes_fallback() {
        let yaml = r#"
applications:
- name: shop
  routes:
  - route: shop.apps.example.com/api
"#;
        let m = Manifest::parse(yaml).unwrap();
        assert_eq!(m.route_domains(), vec!["apps.example.com"]);
    }

    #[test]
    fn explicit_domain_wins_over_routes() {
        let m = Manifest::parse("domain: x.com\nroutes:\n- route: shop.apps.example.com\n").unwrap();
        assert_eq!(m.route_domains(), vec!["x.com"]);
    }

    #[test]
    fn route_domain_strips_port_and_rejects_bare_hosts() {
        let route = |r: &str| ManifestRoute { route: r.to_string() };
        assert_eq!(route("tcp.example.com:1024").domain(), Some("example.com"));
        assert_eq!(route("localhost").domain(), None);
        assert_eq!(route("").domain(), None);
    }
}
