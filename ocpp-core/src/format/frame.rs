use serde_json::Value;

/// Message type ids of the OCPP-J RPC framework.
pub const CALL: u64 = 2;
pub const CALL_RESULT: u64 = 3;
pub const CALL_ERROR: u64 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub unique_id: String,
    pub action: String,
    pub payload: Value,
}

impl Call {
    pub fn new<T: serde::Serialize>(unique_id: String, action: impl Into<String>, payload: T) -> Self {
        Self {
            unique_id,
            action: action.into(),
            payload: serde_json::to_value(payload).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    pub unique_id: String,
    pub payload: Value,
}

impl CallResult {
    pub fn new<T: serde::Serialize>(unique_id: String, payload: T) -> Self {
        Self {
            unique_id,
            payload: serde_json::to_value(payload).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallError<T> {
    pub unique_id: String,
    pub error_code: T,
    pub error_description: String,
    pub error_details: Value,
}

impl<T> CallError<T> {
    pub fn new(unique_id: String, error_code: T) -> Self {
        Self {
            unique_id,
            error_code,
            error_description: String::new(),
            error_details: Value::Object(Default::default()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.error_description = description.into();
        self
    }
}

/// One decoded OCPP-J frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame<T> {
    Call(Call),
    CallResult(CallResult),
    CallError(CallError<T>),
}

impl<T> Frame<T> {
    pub fn unique_id(&self) -> &str {
        match self {
            Frame::Call(t) => &t.unique_id,
            Frame::CallResult(t) => &t.unique_id,
            Frame::CallError(t) => &t.unique_id,
        }
    }

    pub fn message_type(&self) -> u64 {
        match self {
            Frame::Call(_) => CALL,
            Frame::CallResult(_) => CALL_RESULT,
            Frame::CallError(_) => CALL_ERROR,
        }
    }
}

impl<T> From<Call> for Frame<T> {
    fn from(value: Call) -> Self {
        Frame::Call(value)
    }
}

impl<T> From<CallResult> for Frame<T> {
    fn from(value: CallResult) -> Self {
        Frame::CallResult(value)
    }
}

impl<T> From<CallError<T>> for Frame<T> {
    fn from(value: CallError<T>) -> Self {
        Frame::CallError(value)
    }
}
