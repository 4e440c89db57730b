use tokio::sync::mpsc;

/// Capacity of the per-session inbound queue. A full queue pauses syncing
/// until the relay catches up.
pub const INBOUND_QUEUE_CAPACITY: usize = 256;

/// What kind of event was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// A chat message (`m.room.message` on Matrix).
    Message,
    /// Any other timeline event, carrying the platform's type string.
    Other(String),
}

/// One observed timeline event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub event_id: String,
    /// Sender identity, e.g. `@alice:example.org`.
    pub sender: String,
    /// Conversation (room) the event belongs to; replies go back here.
    pub conversation_id: String,
    /// Server timestamp in milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub kind: InboundKind,
    /// Message body. Empty for non-message events.
    pub body: String,
}

impl InboundEvent {
    #[must_use]
    pub fn is_message(&self) -> bool {
        self.kind == InboundKind::Message
    }
}

/// Receiver end of a session's inbound event stream.
pub type InboundReceiver = mpsc::Receiver<InboundEvent>;

/// Sender end of a session's inbound event stream.
pub type InboundSender = mpsc::Sender<InboundEvent>;

/// Create a bounded inbound event channel.
#[must_use]
pub fn inbound_channel() -> (InboundSender, InboundReceiver) {
    mpsc::channel(INBOUND_QUEUE_CAPACITY)
}
