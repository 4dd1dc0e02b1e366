use serde::Serialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::drum::DrumRecord;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Index {
        message: &'a str,
        version: &'a str,
        endpoints: Value,
    },
    #[serde(rename_all = "camelCase")]
    Health {
        status: &'a str,
        stored_records_count: usize,
        timestamp: String,
    },
    Records {
        count: usize,
        timestamp: String,
        data: Vec<DrumRecord>,
    },
    Reset {
        message: &'a str,
    },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ErrorResponse<'a> {
    /// A request the client has to fix.
    Client { error: String },

    Server { error: ServerError },

    NotFound { status: u16, message: &'a str },
}

/// The body of a server error. `details` is only filled in outside
/// production.
#[derive(Debug, Serialize)]
pub struct ServerError {
    pub message: String,
    pub id: Uuid,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub fn format_timestamp(instant: OffsetDateTime) -> Result<String, time::error::Format> {
    instant.format(&Rfc3339)
}
