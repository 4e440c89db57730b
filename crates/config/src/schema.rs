//! Config schema types (server, clients, NLU, relay, metrics).
//!
//! Client keys keep the flat lowercase spelling of the original YAML files
//! (`accesstoken`, `homeserverurl`, ...). Snake-case aliases are accepted too.

use std::{fmt, time::Duration};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct YutaConfig {
    pub server: ServerConfig,
    pub clients: Vec<ClientConfig>,
    pub nlu: NluConfig,
    pub relay: RelayConfig,
    pub metrics: MetricsConfig,
}

/// HTTP listener for the health and metrics endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub host: String,
    /// Port to listen on. Defaults to 8000.
    pub port: u16,
    /// Per-request read/write timeout in seconds.
    #[serde(rename = "timeoutseconds", alias = "timeout_seconds", alias = "timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            timeout_seconds: 15,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Supported chat platforms.
///
/// Unknown tags deserialize into [`ClientType::Other`] so a single bad entry
/// is skipped at startup instead of rejecting the whole file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClientType {
    #[default]
    Matrix,
    Slack,
    Other(String),
}

impl ClientType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Matrix => "matrix",
            Self::Slack => "slack",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for ClientType {
    fn from(tag: String) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "matrix" => Self::Matrix,
            "slack" => Self::Slack,
            _ => Self::Other(tag),
        }
    }
}

impl From<ClientType> for String {
    fn from(ct: ClientType) -> Self {
        ct.as_str().to_string()
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a client authenticates against its chat server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Token,
    Password,
}

/// Credentials and relay settings for one chat account.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// The chat platform's username to connect with.
    pub username: String,
    /// The password to authenticate with.
    pub password: Option<Secret<String>>,
    /// The access token to authenticate with. Preferred over the password.
    #[serde(rename = "accesstoken", alias = "access_token")]
    pub access_token: Option<Secret<String>>,
    /// Host and port of the chat server, e.g. `https://matrix.org:8448`.
    #[serde(rename = "homeserverurl", alias = "homeserver_url")]
    pub homeserver_url: String,
    /// Desired display name for the bot account.
    #[serde(rename = "displayname", alias = "display_name")]
    pub display_name: Option<String>,
    #[serde(rename = "clienttype", alias = "client_type")]
    pub client_type: ClientType,
    /// Sender identities whose messages are relayed. `*` acts as a wildcard.
    #[serde(rename = "allowedsenders", alias = "allowed_senders")]
    pub allowed_senders: Vec<String>,
    pub nlu: ClientNluConfig,
}

impl ClientConfig {
    /// Non-empty access token, if configured.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        non_empty_secret(self.access_token.as_ref())
    }

    /// Non-empty password, if configured.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        non_empty_secret(self.password.as_ref())
    }

    /// Token auth wins whenever a token is present.
    #[must_use]
    pub fn auth_mode(&self) -> Option<AuthMode> {
        if self.access_token().is_some() {
            Some(AuthMode::Token)
        } else if self.password().is_some() {
            Some(AuthMode::Password)
        } else {
            None
        }
    }

    /// Stable identifier used in logs and metric labels: `username@host`.
    #[must_use]
    pub fn account_id(&self) -> String {
        match url::Url::parse(&self.homeserver_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
        {
            Some(host) => format!("{}@{host}", self.username),
            None => self.username.clone(),
        }
    }
}

fn non_empty_secret(secret: Option<&Secret<String>>) -> Option<&str> {
    secret
        .map(|s| s.expose_secret().as_str())
        .filter(|s| !s.trim().is_empty())
}

/// Per-client NLU agent selection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientNluConfig {
    #[serde(rename = "projectid", alias = "project_id")]
    pub project_id: String,
    #[serde(rename = "sessionid", alias = "session_id")]
    pub session_id: String,
    /// Overrides [`NluConfig::language_code`] for this client.
    #[serde(rename = "languagecode", alias = "language_code")]
    pub language_code: Option<String>,
}

/// Shared NLU service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NluConfig {
    pub endpoint: String,
    /// Bearer token sent with every query, usually `${DIALOGFLOW_TOKEN}`.
    #[serde(rename = "accesstoken", alias = "access_token")]
    pub access_token: Option<Secret<String>>,
    #[serde(rename = "languagecode", alias = "language_code")]
    pub language_code: String,
    #[serde(rename = "timeoutseconds", alias = "timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://dialogflow.googleapis.com".into(),
            access_token: None,
            language_code: "en-US".into(),
            timeout_seconds: 10,
        }
    }
}

impl NluConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        non_empty_secret(self.access_token.as_ref())
    }
}

/// Session supervision settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Login attempts per client before the session is disabled.
    #[serde(rename = "loginattempts", alias = "login_attempts")]
    pub login_attempts: u32,
    /// Delay before the first login retry; doubled on each further attempt.
    #[serde(rename = "loginbackoffseconds", alias = "login_backoff_seconds")]
    pub login_backoff_seconds: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            login_attempts: 3,
            login_backoff_seconds: 2,
        }
    }
}

impl RelayConfig {
    #[must_use]
    pub fn login_backoff(&self) -> Duration {
        Duration::from_secs(self.login_backoff_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
server:
  host: 0.0.0.0
  port: 9000
  timeoutseconds: 5
clients:
  - username: yuta
    password: hunter2
    homeserverurl: https://matrix.example.org
    displayname: Yuta
    clienttype: matrix
    allowedsenders: ["@owner:example.org"]
    nlu:
      projectid: yuta-seig
      sessionid: test
  - username: other
    accesstoken: syt_abc
    homeserverurl: https://slack.example.org
    clienttype: slack
"#;

    #[test]
    fn parses_original_key_spelling() {
        let cfg: YutaConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.clients.len(), 2);

        let first = &cfg.clients[0];
        assert_eq!(first.username, "yuta");
        assert_eq!(first.password(), Some("hunter2"));
        assert_eq!(first.access_token(), None);
        assert_eq!(first.display_name.as_deref(), Some("Yuta"));
        assert_eq!(first.client_type, ClientType::Matrix);
        assert_eq!(first.allowed_senders, vec!["@owner:example.org"]);
        assert_eq!(first.nlu.project_id, "yuta-seig");
        assert_eq!(first.nlu.session_id, "test");
        assert_eq!(first.auth_mode(), Some(AuthMode::Password));

        let second = &cfg.clients[1];
        assert_eq!(second.client_type, ClientType::Slack);
        assert_eq!(second.auth_mode(), Some(AuthMode::Token));
    }

    #[test]
    fn defaults_apply_to_missing_sections() {
        let cfg: YutaConfig = serde_yaml::from_str("clients: []").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.nlu.language_code, "en-US");
        assert_eq!(cfg.nlu.endpoint, "https://dialogflow.googleapis.com");
        assert_eq!(cfg.relay.login_attempts, 3);
        assert!(cfg.metrics.enabled);
    }

    #[test]
    fn unknown_client_type_is_preserved() {
        let cfg: ClientConfig = serde_yaml::from_str("clienttype: discord").unwrap();
        assert_eq!(cfg.client_type, ClientType::Other("discord".into()));
        assert_eq!(cfg.client_type.to_string(), "discord");
    }

    #[test]
    fn client_type_tag_is_case_insensitive() {
        let cfg: ClientConfig = serde_yaml::from_str("clienttype: Matrix").unwrap();
        assert_eq!(cfg.client_type, ClientType::Matrix);
    }

    #[test]
    fn token_wins_over_password() {
        let cfg: ClientConfig =
            serde_yaml::from_str("password: pw\naccesstoken: tok").unwrap();
        assert_eq!(cfg.auth_mode(), Some(AuthMode::Token));
    }

    #[test]
    fn empty_secrets_count_as_missing() {
        let cfg: ClientConfig = serde_yaml::from_str("password: ''\naccesstoken: ''").unwrap();
        assert_eq!(cfg.auth_mode(), None);
    }

    #[test]
    fn snake_case_aliases_are_accepted() {
        let cfg: ClientConfig = serde_yaml::from_str(
            "homeserver_url: https://m.org\naccess_token: t\nallowed_senders: [a]",
        )
        .unwrap();
        assert_eq!(cfg.homeserver_url, "https://m.org");
        assert_eq!(cfg.access_token(), Some("t"));
        assert_eq!(cfg.allowed_senders, vec!["a"]);
    }

    #[test]
    fn account_id_includes_host() {
        let cfg = ClientConfig {
            username: "yuta".into(),
            homeserver_url: "https://matrix.example.org:8448".into(),
            ..Default::default()
        };
        assert_eq!(cfg.account_id(), "yuta@matrix.example.org");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg: ClientConfig = serde_yaml::from_str("password: hunter2").unwrap();
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }
}
