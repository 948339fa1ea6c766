//! The htmlpolish library accepts uploaded HTML files over HTTP, normalizes them
//! into an indented canonical form and, when the advisory path is active, asks a
//! local model to improve them and stores both versions in a hosted table.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

pub mod advisory;
pub mod constants;
pub mod error;
pub mod improve;
pub mod normalize;
pub mod server;
pub mod storage;
pub mod upload;

/// Boxed future returned by the advisory and storage clients.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Enum representing whether requests go through the model and the records table.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum AdvisoryMode {
    /// Return the normalized HTML and stop there
    #[default]
    Dormant,
    /// Ask the model for improvements and store the result
    Active,
}

impl std::str::FromStr for AdvisoryMode {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "dormant" => Ok(AdvisoryMode::Dormant),
            "active" => Ok(AdvisoryMode::Active),
            _ => Err(format!("Invalid advisory mode: {input}")),
        }
    }
}

impl fmt::Display for AdvisoryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AdvisoryMode::Dormant => "dormant",
            AdvisoryMode::Active => "active",
        })
    }
}

pub use advisory::{Advisor, ModelCli};
pub use error::ImproveError;
pub use improve::improve_html;
pub use normalize::prettify;
pub use server::{AppState, router, serve};
pub use storage::{RecordStore, StoredRecord, SupabaseStore};
