//! Thin Client-Server API client and wire types.

use std::{collections::HashMap, time::Duration};

use {
    reqwest::{Method, RequestBuilder, StatusCode},
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    tracing::debug,
    url::Url,
};

use yuta_channels::{InboundEvent, InboundKind};

use crate::error::{Error, Result};

/// Long-poll timeout passed to `/sync`.
pub const SYNC_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client timeout. Must exceed [`SYNC_TIMEOUT`] so the client does not
/// abort a long poll before the homeserver answers.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(45);

const MESSAGE_EVENT: &str = "m.room.message";

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UserIdentifier<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub user: &'a str,
}

/// Body of `POST /login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub identifier: UserIdentifier<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_device_display_name: Option<&'a str>,
}

impl<'a> LoginRequest<'a> {
    #[must_use]
    pub fn password(user: &'a str, password: &'a str) -> Self {
        Self {
            kind: "m.login.password",
            identifier: UserIdentifier {
                kind: "m.id.user",
                user,
            },
            password: Some(password),
            token: None,
            initial_device_display_name: None,
        }
    }

    #[must_use]
    pub fn token(user: &'a str, token: &'a str) -> Self {
        Self {
            kind: "m.login.token",
            identifier: UserIdentifier {
                kind: "m.id.user",
                user,
            },
            password: None,
            token: Some(token),
            initial_device_display_name: None,
        }
    }

    #[must_use]
    pub fn with_device_name(mut self, name: Option<&'a str>) -> Self {
        self.initial_device_display_name = name;
        self
    }
}

/// Response of `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub access_token: String,
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Credentials returned by a successful login and reused for every call.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: String,
    pub access_token: Secret<String>,
    pub device_id: Option<String>,
}

impl From<LoginResponse> for Credentials {
    fn from(resp: LoginResponse) -> Self {
        Self {
            user_id: resp.user_id,
            access_token: Secret::new(resp.access_token),
            device_id: resp.device_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errcode: String,
    #[serde(default)]
    error: String,
    #[serde(default)]
    retry_after_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncResponse {
    pub next_batch: String,
    #[serde(default)]
    pub rooms: SyncRooms,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncRooms {
    #[serde(default)]
    pub join: HashMap<String, JoinedRoom>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinedRoom {
    #[serde(default)]
    pub timeline: Timeline,
}

#[derive(Debug, Default, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub events: Vec<RoomEvent>,
}

#[derive(Debug, Deserialize)]
pub struct RoomEvent {
    #[serde(default)]
    pub event_id: String,
    pub sender: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub origin_server_ts: i64,
    #[serde(default)]
    pub content: serde_json::Value,
}

impl RoomEvent {
    fn into_inbound(self, room_id: &str) -> InboundEvent {
        let (kind, body) = if self.kind == MESSAGE_EVENT {
            let body = self
                .content
                .get("body")
                .and_then(|b| b.as_str())
                .unwrap_or_default()
                .to_string();
            (InboundKind::Message, body)
        } else {
            (InboundKind::Other(self.kind), String::new())
        };
        InboundEvent {
            event_id: self.event_id,
            sender: self.sender,
            conversation_id: room_id.to_string(),
            timestamp_ms: self.origin_server_ts,
            kind,
            body,
        }
    }
}

impl SyncResponse {
    /// Flatten joined-room timelines into inbound events.
    ///
    /// Rooms are visited in room-id order so the output is deterministic;
    /// events keep their timeline order within each room.
    #[must_use]
    pub fn into_events(self) -> Vec<InboundEvent> {
        let mut rooms: Vec<(String, JoinedRoom)> = self.rooms.join.into_iter().collect();
        rooms.sort_by(|a, b| a.0.cmp(&b.0));
        rooms
            .into_iter()
            .flat_map(|(room_id, room)| {
                room.timeline
                    .events
                    .into_iter()
                    .map(move |ev| ev.into_inbound(&room_id))
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    msgtype: &'static str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SendResponse {
    pub event_id: String,
}

#[derive(Debug, Serialize)]
struct DisplayNameBody<'a> {
    displayname: &'a str,
}

// ── Client ──────────────────────────────────────────────────────────────────

/// HTTP client bound to one homeserver.
#[derive(Clone)]
pub struct MatrixApi {
    http: reqwest::Client,
    base: Url,
    access_token: Option<Secret<String>>,
}

impl MatrixApi {
    pub fn new(homeserver_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let base = Url::parse(homeserver_url.trim_end_matches('/'))?;
        Ok(Self {
            http,
            base,
            access_token: None,
        })
    }

    /// Attach credentials; every following request is authenticated.
    #[must_use]
    pub fn authenticated(mut self, access_token: Secret<String>) -> Self {
        self.access_token = Some(access_token);
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/_matrix/client/v3{path}",
            self.base.as_str().trim_end_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, self.endpoint(path));
        match &self.access_token {
            Some(token) => req.bearer_auth(token.expose_secret()),
            None => req,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }
        Err(matrix_error(status, resp.text().await.unwrap_or_default()))
    }

    pub async fn login(&self, request: &LoginRequest<'_>) -> Result<LoginResponse> {
        debug!(kind = request.kind, user = request.identifier.user, "matrix login");
        self.execute(self.request(Method::POST, "/login").json(request))
            .await
    }

    /// One long-poll `/sync`. `since` is the previous `next_batch`.
    pub async fn sync(&self, since: Option<&str>, timeout: Duration) -> Result<SyncResponse> {
        let mut query = vec![("timeout", timeout.as_millis().to_string())];
        if let Some(since) = since {
            query.push(("since", since.to_string()));
        }
        self.execute(self.request(Method::GET, "/sync").query(&query))
            .await
    }

    /// Send an `m.text` message to a room.
    pub async fn send_text(&self, room_id: &str, text: &str) -> Result<SendResponse> {
        let txn_id = uuid::Uuid::new_v4().simple().to_string();
        let path = format!(
            "/rooms/{}/send/{MESSAGE_EVENT}/{txn_id}",
            urlencoding::encode(room_id)
        );
        let body = TextMessage {
            msgtype: "m.text",
            body: text,
        };
        self.execute(self.request(Method::PUT, &path).json(&body))
            .await
    }

    pub async fn set_display_name(&self, user_id: &str, name: &str) -> Result<()> {
        let path = format!("/profile/{}/displayname", urlencoding::encode(user_id));
        let _: serde_json::Value = self
            .execute(
                self.request(Method::PUT, &path)
                    .json(&DisplayNameBody { displayname: name }),
            )
            .await?;
        Ok(())
    }
}

fn matrix_error(status: StatusCode, body: String) -> Error {
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => Error::Matrix {
            status: status.as_u16(),
            errcode: parsed.errcode,
            message: parsed.error,
            retry_after_ms: parsed.retry_after_ms,
        },
        Err(_) => Error::Matrix {
            status: status.as_u16(),
            errcode: String::new(),
            message: body,
            retry_after_ms: None,
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_login_body_shape() {
        let req = LoginRequest::password("yuta", "pw").with_device_name(Some("Yuta"));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "m.login.password",
                "identifier": {"type": "m.id.user", "user": "yuta"},
                "password": "pw",
                "initial_device_display_name": "Yuta",
            })
        );
    }

    #[test]
    fn token_login_omits_password() {
        let json = serde_json::to_value(LoginRequest::token("yuta", "tok")).unwrap();
        assert_eq!(json["type"], "m.login.token");
        assert_eq!(json["token"], "tok");
        assert!(json.get("password").is_none());
    }

    #[test]
    fn sync_response_flattens_rooms_in_order() {
        let raw = serde_json::json!({
            "next_batch": "s2",
            "rooms": {"join": {
                "!b:x": {"timeline": {"events": [
                    {"event_id": "$3", "sender": "@u:x", "type": "m.room.message",
                     "origin_server_ts": 30, "content": {"msgtype": "m.text", "body": "third"}}
                ]}},
                "!a:x": {"timeline": {"events": [
                    {"event_id": "$1", "sender": "@u:x", "type": "m.room.member",
                     "origin_server_ts": 10, "content": {"membership": "join"}},
                    {"event_id": "$2", "sender": "@u:x", "type": "m.room.message",
                     "origin_server_ts": 20, "content": {"msgtype": "m.text", "body": "second"}}
                ]}}
            }}
        });
        let resp: SyncResponse = serde_json::from_value(raw).unwrap();
        let events = resp.into_events();
        let ids: Vec<&str> = events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["$1", "$2", "$3"]);
        assert_eq!(events[0].kind, InboundKind::Other("m.room.member".into()));
        assert_eq!(events[1].body, "second");
        assert_eq!(events[1].conversation_id, "!a:x");
        assert_eq!(events[2].timestamp_ms, 30);
    }

    #[test]
    fn empty_sync_has_no_events() {
        let resp: SyncResponse = serde_json::from_str(r#"{"next_batch": "s1"}"#).unwrap();
        assert!(resp.into_events().is_empty());
    }

    #[test]
    fn matrix_error_parses_body() {
        let err = matrix_error(
            StatusCode::FORBIDDEN,
            r#"{"errcode": "M_FORBIDDEN", "error": "Invalid password"}"#.into(),
        );
        assert!(err.to_string().contains("M_FORBIDDEN"));
        assert!(!err.is_unknown_token());
    }

    #[test]
    fn unknown_token_detected_from_errcode_and_status() {
        let by_code = matrix_error(
            StatusCode::UNAUTHORIZED,
            r#"{"errcode": "M_UNKNOWN_TOKEN", "error": "gone"}"#.into(),
        );
        assert!(by_code.is_unknown_token());
        let by_status = matrix_error(StatusCode::UNAUTHORIZED, "nope".into());
        assert!(by_status.is_unknown_token());
    }

    #[test]
    fn rate_limit_exposes_retry_after() {
        let err = matrix_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"errcode": "M_LIMIT_EXCEEDED", "error": "slow down", "retry_after_ms": 1500}"#
                .into(),
        );
        assert_eq!(err.retry_after_ms(), Some(1500));
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let api = MatrixApi::new("https://matrix.example.org/").unwrap();
        assert_eq!(
            api.endpoint("/login"),
            "https://matrix.example.org/_matrix/client/v3/login"
        );
    }
}
