//! Natural-language understanding for yuta.
//!
//! [`NluClient`] is the seam the relay talks to; [`DialogflowClient`] is the
//! production implementation over the Dialogflow v2 REST API.

pub mod client;
pub mod dialogflow;
pub mod error;

pub use {
    client::{NluClient, NluQuery, NluResponse},
    dialogflow::DialogflowClient,
    error::{Error, Result},
};
