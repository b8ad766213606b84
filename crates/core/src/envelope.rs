//! Response envelope
//!
//! Every operation answers with either an opaque success payload or a
//! failure envelope. Field names match the `{Code, Des}` wire format;
//! `Kind` is the enumerated error class added on failures.

use crate::error::{ErrorKind, RecordError, RecordResult};
use serde::{Deserialize, Serialize};

pub const CODE_SUCCESS: i32 = 0;
pub const CODE_FAILURE: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "Code")]
    pub code: i32,

    #[serde(rename = "Des")]
    pub des: String,

    #[serde(rename = "Kind", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl Envelope {
    pub fn success(des: impl Into<String>) -> Self {
        Self {
            code: CODE_SUCCESS,
            des: des.into(),
            kind: None,
        }
    }

    pub fn failure(kind: ErrorKind, des: impl Into<String>) -> Self {
        Self {
            code: CODE_FAILURE,
            des: des.into(),
            kind: Some(kind),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == CODE_SUCCESS
    }
}

impl From<&RecordError> for Envelope {
    fn from(err: &RecordError) -> Self {
        Self::failure(err.kind(), err.to_string())
    }
}

/// Serialized success envelope, the payload of mutating operations
pub fn success_payload(des: impl Into<String>) -> RecordResult<Vec<u8>> {
    Ok(serde_json::to_vec(&Envelope::success(des))?)
}

/// Outcome of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Success(Vec<u8>),
    Failure(Envelope),
}

impl Response {
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    /// Error class, if this is a failure
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Response::Success(_) => None,
            Response::Failure(envelope) => envelope.kind,
        }
    }

    /// Success payload bytes
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Response::Success(payload) => Some(payload),
            Response::Failure(_) => None,
        }
    }

    /// Decode the success payload
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> RecordResult<T> {
        match self {
            Response::Success(payload) => Ok(serde_json::from_slice(payload)?),
            Response::Failure(envelope) => Err(RecordError::Validation(format!(
                "cannot decode failed response: {}",
                envelope.des
            ))),
        }
    }

    /// Text form for display: the payload as UTF-8 or the failure envelope
    pub fn to_text(&self) -> String {
        match self {
            Response::Success(payload) => String::from_utf8_lossy(payload).into_owned(),
            Response::Failure(envelope) => serde_json::to_string(envelope)
                .unwrap_or_else(|_| format!("{{\"Code\":{},\"Des\":{:?}}}", envelope.code, envelope.des)),
        }
    }
}

impl From<RecordResult<Vec<u8>>> for Response {
    fn from(result: RecordResult<Vec<u8>>) -> Self {
        match result {
            Ok(payload) => Response::Success(payload),
            Err(err) => Response::Failure(Envelope::from(&err)),
        }
    }
}
