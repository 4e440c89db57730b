//! Relay between chat sessions and the NLU service.
//!
//! - [`admission`]: which inbound events qualify for a reply
//! - [`relay`]: the per-session loop that queries NLU and replies
//! - [`supervisor`]: login with retries, then run the loop until shutdown

pub mod admission;
pub mod relay;
pub mod supervisor;

pub use {
    admission::{AdmissionPolicy, RelayDecision, SkipReason},
    relay::{LoopExit, NluTarget, RelayLoop, RelayOutcome},
    supervisor::{SessionExit, SessionSupervisor},
};
