use serde_json::Value;

use super::frame::{Call, CallError, CallResult, Frame, CALL, CALL_ERROR, CALL_RESULT};

/// Error code vocabulary carried in position 2 of a CallError frame.
pub trait ErrorCode: Sized {
    /// Unrecognised codes must map to a catch-all rather than fail.
    fn from_code(code: &str) -> Self;
    fn code(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeErrorKind {
    #[error("JSON parse error: {0}")]
    InvalidJson(String),
    #[error("expected JSON array")]
    NotAnArray,
    #[error("message type must be one of 2, 3, 4")]
    UnknownMessageType,
    #[error("message type {message_type} expects {expected} elements, got {actual}")]
    WrongLength {
        message_type: u64,
        expected: usize,
        actual: usize,
    },
    #[error("unique id must be a string")]
    InvalidUniqueId,
    #[error("action must be a string")]
    InvalidAction,
    #[error("error code and description must be strings")]
    InvalidErrorFields,
}

/// A frame that failed structural validation.
///
/// `unique_id` is recovered whenever the second element was a string so a
/// malformed Call can still be answered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} (raw: {message})")]
pub struct DecodeError {
    pub message_type: Option<u64>,
    pub unique_id: Option<String>,
    pub message: String,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    fn new(message: &str, message_type: Option<u64>, unique_id: Option<String>, kind: DecodeErrorKind) -> Self {
        Self {
            message_type,
            unique_id,
            message: message.to_string(),
            kind,
        }
    }

    pub fn is_call(&self) -> bool {
        self.message_type == Some(CALL)
    }
}

pub trait EncodeDecode {
    fn encode(&self) -> String;
}

fn expected_len(message_type: u64) -> Option<usize> {
    match message_type {
        CALL => Some(4),
        CALL_RESULT => Some(3),
        CALL_ERROR => Some(5),
        _ => None,
    }
}

impl<T: ErrorCode> Frame<T> {
    pub fn decode(message: &str) -> Result<Frame<T>, DecodeError> {
        let raw: Value = serde_json::from_str(message).map_err(|e| {
            DecodeError::new(message, None, None, DecodeErrorKind::InvalidJson(e.to_string()))
        })?;

        let mut arr = match raw {
            Value::Array(arr) => arr,
            _ => return Err(DecodeError::new(message, None, None, DecodeErrorKind::NotAnArray)),
        };

        let message_type = arr.first().and_then(Value::as_u64);
        let unique_id = arr.get(1).and_then(Value::as_str).map(str::to_string);

        let (message_type, expected) = match message_type.and_then(|t| expected_len(t).map(|l| (t, l))) {
            Some(v) => v,
            None => {
                return Err(DecodeError::new(
                    message,
                    message_type,
                    unique_id,
                    DecodeErrorKind::UnknownMessageType,
                ))
            }
        };
        if arr.len() != expected {
            return Err(DecodeError::new(
                message,
                Some(message_type),
                unique_id,
                DecodeErrorKind::WrongLength {
                    message_type,
                    expected,
                    actual: arr.len(),
                },
            ));
        }
        let unique_id = match unique_id {
            Some(t) => t,
            None => {
                return Err(DecodeError::new(
                    message,
                    Some(message_type),
                    None,
                    DecodeErrorKind::InvalidUniqueId,
                ))
            }
        };

        match message_type {
            CALL => {
                let payload = arr.pop().unwrap_or_default();
                let action = match arr.get(2).and_then(Value::as_str) {
                    Some(t) => t.to_string(),
                    None => {
                        return Err(DecodeError::new(
                            message,
                            Some(CALL),
                            Some(unique_id),
                            DecodeErrorKind::InvalidAction,
                        ))
                    }
                };
                Ok(Frame::Call(Call {
                    unique_id,
                    action,
                    payload,
                }))
            }
            CALL_RESULT => Ok(Frame::CallResult(CallResult {
                unique_id,
                payload: arr.pop().unwrap_or_default(),
            })),
            _ => {
                let error_details = arr.pop().unwrap_or_default();
                match (arr[2].as_str(), arr[3].as_str()) {
                    (Some(code), Some(description)) => Ok(Frame::CallError(CallError {
                        unique_id,
                        error_code: T::from_code(code),
                        error_description: description.to_string(),
                        error_details,
                    })),
                    _ => Err(DecodeError::new(
                        message,
                        Some(CALL_ERROR),
                        Some(unique_id),
                        DecodeErrorKind::InvalidErrorFields,
                    )),
                }
            }
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Frame::Call(t) => t.encode(),
            Frame::CallResult(t) => t.encode(),
            Frame::CallError(t) => t.encode(),
        }
    }
}

impl EncodeDecode for Call {
    fn encode(&self) -> String {
        Value::Array(vec![
            Value::from(CALL),
            Value::from(self.unique_id.as_str()),
            Value::from(self.action.as_str()),
            self.payload.clone(),
        ])
        .to_string()
    }
}

impl EncodeDecode for CallResult {
    fn encode(&self) -> String {
        Value::Array(vec![
            Value::from(CALL_RESULT),
            Value::from(self.unique_id.as_str()),
            self.payload.clone(),
        ])
        .to_string()
    }
}

impl<T: ErrorCode> EncodeDecode for CallError<T> {
    fn encode(&self) -> String {
        Value::Array(vec![
            Value::from(CALL_ERROR),
            Value::from(self.unique_id.as_str()),
            Value::from(self.error_code.code()),
            Value::from(self.error_description.as_str()),
            self.error_details.clone(),
        ])
        .to_string()
    }
}
