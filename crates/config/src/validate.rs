//! Configuration validation.
//!
//! [`ClientConfig::check`] enforces the hard requirements of a single client
//! entry. [`validate`] runs every check over a whole config and collects
//! diagnostics, and [`unknown_fields`] spots misspelled keys that serde
//! would otherwise silently ignore.

use std::{collections::HashMap, path::PathBuf};

use crate::{
    error::{Error, Result},
    schema::{ClientConfig, ClientType, YutaConfig},
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "client", "unsupported-client", "nlu", "access", "unknown-field"
    pub category: &'static str,
    /// Dotted path, e.g. "clients.0.homeserverurl"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(
        &mut self,
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        });
    }
}

impl ClientConfig {
    /// Check that the client has supplied the mandatory fields and a
    /// well-formed homeserver URL.
    pub fn check(&self) -> Result<()> {
        if self.username.trim().is_empty()
            || self.homeserver_url.trim().is_empty()
            || self.auth_mode().is_none()
        {
            return Err(Error::MissingCredentials);
        }

        let url = url::Url::parse(&self.homeserver_url).map_err(|source| Error::InvalidUrl {
            url: self.homeserver_url.clone(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::UnsupportedScheme {
                url: self.homeserver_url.clone(),
                scheme: url.scheme().to_string(),
            });
        }
        Ok(())
    }
}

/// Fail on the first client entry that does not pass [`ClientConfig::check`].
///
/// Entries with an unsupported client type are checked as well, since a
/// half-filled entry is a mistake no matter which platform it targets.
pub fn check_clients(config: &YutaConfig) -> Result<()> {
    for (index, client) in config.clients.iter().enumerate() {
        client.check().map_err(|source| Error::InvalidClient {
            index,
            account: client.account_id(),
            source: Box::new(source),
        })?;
    }
    Ok(())
}

/// Run every semantic check over a loaded config.
#[must_use]
pub fn validate(config: &YutaConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if config.clients.is_empty() {
        result.push(
            Severity::Warning,
            "client",
            "clients",
            "no clients configured, only the HTTP endpoints will run",
        );
    }

    for (i, client) in config.clients.iter().enumerate() {
        let base = format!("clients.{i}");

        if let Err(e) = client.check() {
            result.push(Severity::Error, "client", &base, e.to_string());
        }

        if client.access_token().is_some() && client.password().is_some() {
            result.push(
                Severity::Info,
                "client",
                format!("{base}.password"),
                "both accesstoken and password are set, the token is used",
            );
        }

        if client.client_type != ClientType::Matrix {
            result.push(
                Severity::Warning,
                "unsupported-client",
                format!("{base}.clienttype"),
                format!(
                    "client type \"{}\" is not implemented, entry will be skipped",
                    client.client_type
                ),
            );
            continue;
        }

        if client.allowed_senders.is_empty() {
            result.push(
                Severity::Warning,
                "access",
                format!("{base}.allowedsenders"),
                "allowedsenders is empty, no message will be relayed",
            );
        }

        if client.nlu.project_id.trim().is_empty() {
            result.push(
                Severity::Error,
                "nlu",
                format!("{base}.nlu.projectid"),
                "NLU project id is required",
            );
        }
        if client.nlu.session_id.trim().is_empty() {
            result.push(
                Severity::Error,
                "nlu",
                format!("{base}.nlu.sessionid"),
                "NLU session id is required",
            );
        }
    }

    if url::Url::parse(&config.nlu.endpoint).is_err() {
        result.push(
            Severity::Error,
            "nlu",
            "nlu.endpoint",
            format!("invalid NLU endpoint {:?}", config.nlu.endpoint),
        );
    }
    if config.nlu.timeout_seconds == 0 {
        result.push(
            Severity::Warning,
            "nlu",
            "nlu.timeoutseconds",
            "timeout of 0 seconds makes every NLU query fail",
        );
    }
    if config.relay.login_attempts == 0 {
        result.push(
            Severity::Warning,
            "client",
            "relay.loginattempts",
            "loginattempts is 0, each client still gets one login attempt",
        );
    }

    result
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Expected shape of the configuration.
enum KnownKeys {
    /// A struct with fixed field names.
    Struct(HashMap<&'static str, KnownKeys>),
    /// An array of typed items.
    Array(Box<KnownKeys>),
    /// Scalar value, stop recursion.
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Array, Leaf, Struct};

    let client_nlu = Struct(HashMap::from([
        ("projectid", Leaf),
        ("project_id", Leaf),
        ("sessionid", Leaf),
        ("session_id", Leaf),
        ("languagecode", Leaf),
        ("language_code", Leaf),
    ]));

    let client = Struct(HashMap::from([
        ("username", Leaf),
        ("password", Leaf),
        ("accesstoken", Leaf),
        ("access_token", Leaf),
        ("homeserverurl", Leaf),
        ("homeserver_url", Leaf),
        ("displayname", Leaf),
        ("display_name", Leaf),
        ("clienttype", Leaf),
        ("client_type", Leaf),
        ("allowedsenders", Leaf),
        ("allowed_senders", Leaf),
        ("nlu", client_nlu),
    ]));

    Struct(HashMap::from([
        (
            "server",
            Struct(HashMap::from([
                ("host", Leaf),
                ("port", Leaf),
                ("timeoutseconds", Leaf),
                ("timeout_seconds", Leaf),
                ("timeout", Leaf),
            ])),
        ),
        ("clients", Array(Box::new(client))),
        (
            "nlu",
            Struct(HashMap::from([
                ("endpoint", Leaf),
                ("accesstoken", Leaf),
                ("access_token", Leaf),
                ("languagecode", Leaf),
                ("language_code", Leaf),
                ("timeoutseconds", Leaf),
                ("timeout_seconds", Leaf),
            ])),
        ),
        (
            "relay",
            Struct(HashMap::from([
                ("loginattempts", Leaf),
                ("login_attempts", Leaf),
                ("loginbackoffseconds", Leaf),
                ("login_backoff_seconds", Leaf),
            ])),
        ),
        ("metrics", Struct(HashMap::from([("enabled", Leaf)]))),
    ]))
}

/// Report keys in `value` that the schema does not know about.
#[must_use]
pub fn unknown_fields(value: &serde_json::Value) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    walk(&build_schema_map(), value, "", &mut out);
    out
}

fn walk(schema: &KnownKeys, value: &serde_json::Value, path: &str, out: &mut Vec<Diagnostic>) {
    match (schema, value) {
        (KnownKeys::Struct(fields), serde_json::Value::Object(map)) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                match fields.get(key.as_str()) {
                    Some(child_schema) => walk(child_schema, child, &child_path, out),
                    None => out.push(Diagnostic {
                        severity: Severity::Warning,
                        category: "unknown-field",
                        message: format!("unknown field \"{key}\" is ignored"),
                        path: child_path,
                    }),
                }
            }
        },
        (KnownKeys::Array(item), serde_json::Value::Array(items)) => {
            for (i, child) in items.iter().enumerate() {
                walk(item, child, &format!("{path}.{i}"), out);
            }
        },
        _ => {},
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn client(yaml: &str) -> ClientConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn valid_client() -> ClientConfig {
        client(
            "username: bot\npassword: pw\nhomeserverurl: https://matrix.org\n\
             allowedsenders: ['@me:matrix.org']\nnlu: {projectid: p, sessionid: s}",
        )
    }

    #[test]
    fn valid_client_passes() {
        valid_client().check().unwrap();
    }

    #[test]
    fn token_only_client_passes() {
        client("username: bot\naccesstoken: tok\nhomeserverurl: https://matrix.org")
            .check()
            .unwrap();
    }

    #[rstest]
    #[case::empty_username("username: ''\npassword: pw\nhomeserverurl: https://m.org")]
    #[case::missing_username("password: pw\nhomeserverurl: https://m.org")]
    #[case::empty_homeserver("username: bot\npassword: pw\nhomeserverurl: ''")]
    #[case::no_credentials("username: bot\nhomeserverurl: https://m.org")]
    #[case::blank_credentials("username: bot\npassword: ' '\naccesstoken: ''\nhomeserverurl: https://m.org")]
    fn missing_mandatory_fields_fail(#[case] yaml: &str) {
        let err = client(yaml).check().unwrap_err();
        assert!(matches!(err, Error::MissingCredentials));
        assert!(err.to_string().contains("homeserverurl"));
    }

    #[rstest]
    #[case("not a url")]
    #[case("matrix.org")]
    #[case("https://")]
    fn malformed_homeserver_url_fails(#[case] url: &str) {
        let mut c = valid_client();
        c.homeserver_url = url.into();
        let err = c.check().unwrap_err();
        assert!(
            matches!(err, Error::InvalidUrl { .. } | Error::UnsupportedScheme { .. }),
            "{url}: {err:?}"
        );
    }

    #[test]
    fn non_http_scheme_fails() {
        let mut c = valid_client();
        c.homeserver_url = "ftp://matrix.org".into();
        assert!(matches!(
            c.check().unwrap_err(),
            Error::UnsupportedScheme { .. }
        ));
    }

    #[test]
    fn check_clients_reports_index() {
        let cfg = YutaConfig {
            clients: vec![valid_client(), client("username: broken")],
            ..Default::default()
        };
        let err = check_clients(&cfg).unwrap_err();
        assert!(matches!(err, Error::InvalidClient { index: 1, .. }));
    }

    #[test]
    fn validate_clean_config_has_no_errors() {
        let cfg = YutaConfig {
            clients: vec![valid_client()],
            ..Default::default()
        };
        let result = validate(&cfg);
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        assert_eq!(result.count(Severity::Warning), 0);
    }

    #[test]
    fn validate_flags_unsupported_type_as_warning() {
        let mut slack = valid_client();
        slack.client_type = ClientType::Slack;
        let cfg = YutaConfig {
            clients: vec![slack],
            ..Default::default()
        };
        let result = validate(&cfg);
        assert!(!result.has_errors());
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "unsupported-client")
        );
    }

    #[test]
    fn validate_requires_nlu_ids_and_warns_on_empty_allowlist() {
        let cfg = YutaConfig {
            clients: vec![client(
                "username: bot\npassword: pw\nhomeserverurl: https://matrix.org",
            )],
            ..Default::default()
        };
        let result = validate(&cfg);
        assert_eq!(result.count(Severity::Error), 2);
        assert!(result.diagnostics.iter().any(|d| d.category == "access"));
    }

    #[test]
    fn zero_login_attempts_is_a_warning() {
        let mut cfg = YutaConfig {
            clients: vec![valid_client()],
            ..Default::default()
        };
        cfg.relay.login_attempts = 0;
        let result = validate(&cfg);
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.severity == Severity::Warning && d.path == "relay.loginattempts")
        );
    }

    #[test]
    fn unknown_fields_are_reported_with_paths() {
        let value = serde_json::json!({
            "server": { "port": 1, "bnd": "x" },
            "clients": [{ "username": "a", "homeserverUrl": "b" }],
            "extra": true,
        });
        let mut paths: Vec<String> = unknown_fields(&value).into_iter().map(|d| d.path).collect();
        paths.sort();
        assert_eq!(paths, vec!["clients.0.homeserverUrl", "extra", "server.bnd"]);
    }
}
