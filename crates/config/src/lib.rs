//! Configuration loading, validation and env substitution.
//!
//! Config files: `yuta.yaml`, `yuta.yml`, `yuta.json`, `yuta.toml` or
//! `config.yaml`, searched in `./` then `~/.config/yuta/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, find_config_file, load_config, load_config_value},
    schema::{
        AuthMode, ClientConfig, ClientNluConfig, ClientType, MetricsConfig, NluConfig,
        RelayConfig, ServerConfig, YutaConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, check_clients, unknown_fields, validate},
};
