//! Action extraction over external text-generation APIs.
//!
//! One outbound call per review: the message text plus the roster context go
//! out with a strict JSON response schema, a typed `ActionProposal` comes
//! back. Pure HTTP client; providers are Gemini and OpenAI, picked by model
//! name.

mod client;
mod error;
mod gemini;
mod openai;
mod prompt;
mod wire;

pub use client::{ExtractorClient, Provider};
pub use error::{ExtractError, Result};
pub use prompt::{HorseEntry, OwnerEntry, RosterContext};

/// The fixed user-facing text for any extraction failure. Network errors and
/// schema violations look the same to the user; retry is re-invocation.
pub const EXTRACTION_FAILED_MESSAGE: &str = "Failed to analyze message. Please try again.";
