use yuta_channels::{InboundEvent, gating::is_allowed};

/// Why an inbound event was not relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotMessage,
    OwnMessage,
    SenderNotAllowed,
    /// Sent at or before the process started; history replayed by sync.
    BeforeStart,
    EmptyBody,
}

impl SkipReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotMessage => "not_message",
            Self::OwnMessage => "own_message",
            Self::SenderNotAllowed => "sender_not_allowed",
            Self::BeforeStart => "before_start",
            Self::EmptyBody => "empty_body",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayDecision {
    Admit,
    Skip(SkipReason),
}

/// Filters applied to every inbound event, in order: message type, own
/// message, sender allowlist, start time, empty body.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    self_user_id: String,
    allowed_senders: Vec<String>,
    started_at_ms: i64,
}

impl AdmissionPolicy {
    #[must_use]
    pub fn new(
        self_user_id: impl Into<String>,
        allowed_senders: Vec<String>,
        started_at_ms: i64,
    ) -> Self {
        Self {
            self_user_id: self_user_id.into(),
            allowed_senders,
            started_at_ms,
        }
    }

    #[must_use]
    pub fn started_at_ms(&self) -> i64 {
        self.started_at_ms
    }

    #[must_use]
    pub fn decide(&self, event: &InboundEvent) -> RelayDecision {
        let reason = if !event.is_message() {
            SkipReason::NotMessage
        } else if event.sender == self.self_user_id {
            SkipReason::OwnMessage
        } else if !is_allowed(&event.sender, &self.allowed_senders) {
            SkipReason::SenderNotAllowed
        } else if event.timestamp_ms <= self.started_at_ms {
            SkipReason::BeforeStart
        } else if event.body.trim().is_empty() {
            SkipReason::EmptyBody
        } else {
            return RelayDecision::Admit;
        };
        RelayDecision::Skip(reason)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, yuta_channels::InboundKind};

    const START: i64 = 1_700_000_000_000;

    fn policy() -> AdmissionPolicy {
        AdmissionPolicy::new(
            "@yuta:example.org",
            vec!["@alice:example.org".into(), "@*:ops.example.org".into()],
            START,
        )
    }

    fn message(sender: &str, ts: i64, body: &str) -> InboundEvent {
        InboundEvent {
            event_id: "$e".into(),
            sender: sender.into(),
            conversation_id: "!room:example.org".into(),
            timestamp_ms: ts,
            kind: InboundKind::Message,
            body: body.into(),
        }
    }

    #[rstest]
    #[case("@alice:example.org", START + 1, "hello", RelayDecision::Admit)]
    #[case("@bob:ops.example.org", START + 1, "hello", RelayDecision::Admit)]
    #[case("@mallory:example.org", START + 1, "hello", RelayDecision::Skip(SkipReason::SenderNotAllowed))]
    #[case("@yuta:example.org", START + 1, "hello", RelayDecision::Skip(SkipReason::OwnMessage))]
    #[case("@alice:example.org", START, "hello", RelayDecision::Skip(SkipReason::BeforeStart))]
    #[case("@alice:example.org", START - 5_000, "hello", RelayDecision::Skip(SkipReason::BeforeStart))]
    #[case("@alice:example.org", START + 1, "   ", RelayDecision::Skip(SkipReason::EmptyBody))]
    fn decides(
        #[case] sender: &str,
        #[case] ts: i64,
        #[case] body: &str,
        #[case] expected: RelayDecision,
    ) {
        assert_eq!(policy().decide(&message(sender, ts, body)), expected);
    }

    #[test]
    fn non_message_events_are_skipped_first() {
        let mut event = message("@mallory:example.org", START - 1, "");
        event.kind = InboundKind::Other("m.room.member".into());
        assert_eq!(
            policy().decide(&event),
            RelayDecision::Skip(SkipReason::NotMessage)
        );
    }

    #[test]
    fn empty_allowlist_admits_nobody() {
        let policy = AdmissionPolicy::new("@yuta:example.org", Vec::new(), START);
        assert_eq!(
            policy.decide(&message("@alice:example.org", START + 1, "hello")),
            RelayDecision::Skip(SkipReason::SenderNotAllowed)
        );
    }
}
