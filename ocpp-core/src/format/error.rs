/// Failures of an outgoing Call that did not come from the peer.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericError {
    /// No response before the request deadline.
    TimeOut,
    /// The Call could not be sent because the transport is down.
    Offline,
    /// The session was stopped or the connection dropped while waiting.
    Cancelled,
    /// The response payload did not match the expected schema.
    ParsingError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OcppError<T> {
    Protocol(T),
    Other(GenericError),
}

impl<T> From<GenericError> for OcppError<T> {
    fn from(value: GenericError) -> Self {
        OcppError::Other(value)
    }
}
