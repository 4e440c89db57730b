//! Chat session abstraction.
//!
//! Each supported chat platform provides a [`SessionFactory`] that logs in
//! with a [`yuta_config::ClientConfig`] and hands back a live
//! [`ChatSession`]. The relay only talks to these traits, so platforms can
//! be swapped or stubbed without touching the relay logic.

pub mod error;
pub mod event;
pub mod gating;
pub mod registry;
pub mod session;

pub use {
    error::{Error, Result},
    event::{InboundEvent, InboundKind, InboundReceiver, InboundSender, inbound_channel},
    registry::SessionFactoryRegistry,
    session::{ChatSession, SessionFactory, SessionHandle},
};
