//! Wire-level proposal payload and the declared response schema.
//!
//! Nothing from the model is trusted until it passes through here: required
//! fields must be present, blank optionals normalize to `None`, and the date
//! must parse as ISO 8601. Any violation is an `ExtractError::ResponseFormat`,
//! which callers treat exactly like a network failure.

use crate::error::{ExtractError, Result};
use chrono::{DateTime, NaiveDateTime};
use eq_core::{ActionKind, ActionProposal};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct WireProposal {
    #[serde(default, rename = "horseName")]
    horse_name: Option<String>,
    #[serde(default, rename = "ownerName")]
    owner_name: Option<String>,
    #[serde(rename = "actionType")]
    action_type: ActionKind,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

/// Parse and validate a raw model response body into a typed proposal.
pub(crate) fn parse_proposal(raw: &str) -> Result<ActionProposal> {
    let wire: WireProposal = serde_json::from_str(raw.trim())?;

    let details = non_blank(wire.details).ok_or_else(|| {
        ExtractError::ResponseFormat("required field 'details' is missing or blank".to_string())
    })?;
    let date = match non_blank(wire.date) {
        Some(raw_date) => Some(parse_wire_date(&raw_date)?),
        None => None,
    };

    Ok(ActionProposal {
        horse_name: non_blank(wire.horse_name),
        owner_name: non_blank(wire.owner_name),
        kind: wire.action_type,
        details,
        date,
    })
}

/// The model may answer "no value" as a missing key, null, or an empty
/// string. All of them mean absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_wire_date(raw: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|e| ExtractError::ResponseFormat(format!("invalid date {raw:?}: {e}")))
}

const HORSE_NAME_DESC: &str = "The name of the horse mentioned in the message. Must match a name from the provided list. Leave unset if no specific horse is mentioned.";
const OWNER_NAME_DESC: &str = "The name of the owner associated with the horse. Must match a name from the provided list. Leave unset if no owner can be identified.";
const ACTION_TYPE_DESC: &str = "The type of action requested. 'APPOINTMENT' for scheduling, 'TASK' for a to-do item, or 'QUERY' for a general question.";
const DETAILS_DESC: &str = "A concise summary of the requested action or query, e.g. 'Book a vet appointment' or 'Schedule grooming'.";
const DATE_DESC: &str = "The specific date and time for the appointment or task, if mentioned. ISO 8601 format (YYYY-MM-DDTHH:mm:ss). Leave unset if not specified.";

/// Schema in Gemini's `responseSchema` dialect (uppercase type tags,
/// `nullable` on optionals).
pub(crate) fn gemini_response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "horseName": { "type": "STRING", "description": HORSE_NAME_DESC, "nullable": true },
            "ownerName": { "type": "STRING", "description": OWNER_NAME_DESC, "nullable": true },
            "actionType": {
                "type": "STRING",
                "enum": ["APPOINTMENT", "TASK", "QUERY"],
                "description": ACTION_TYPE_DESC,
            },
            "details": { "type": "STRING", "description": DETAILS_DESC },
            "date": { "type": "STRING", "description": DATE_DESC, "nullable": true },
        },
        "required": ["actionType", "details"],
    })
}

/// Schema for OpenAI strict structured outputs: every property listed in
/// `required`, optionals expressed as nullable unions.
pub(crate) fn openai_response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "horseName": { "type": ["string", "null"], "description": HORSE_NAME_DESC },
            "ownerName": { "type": ["string", "null"], "description": OWNER_NAME_DESC },
            "actionType": {
                "type": "string",
                "enum": ["APPOINTMENT", "TASK", "QUERY"],
                "description": ACTION_TYPE_DESC,
            },
            "details": { "type": "string", "description": DETAILS_DESC },
            "date": { "type": ["string", "null"], "description": DATE_DESC },
        },
        "required": ["horseName", "ownerName", "actionType", "details", "date"],
    })
}
