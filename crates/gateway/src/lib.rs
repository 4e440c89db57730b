//! Process wiring for yuta: starts one supervised relay task per configured
//! client and serves `/api/health` and `/metrics` until shutdown.

pub mod bootstrap;
#[cfg(feature = "metrics")]
pub mod metrics_middleware;
pub mod server;

pub use {
    bootstrap::{
        GatewayOptions, SessionTask, default_registry, run_gateway, spawn_sessions, start_gateway,
    },
    server::{AppState, build_app, serve},
};
