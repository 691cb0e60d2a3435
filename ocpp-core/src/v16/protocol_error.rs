use crate::format::message::ErrorCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    NotImplemented,
    NotSupported,
    InternalError,
    ProtocolError,
    SecurityError,
    FormationViolation,
    PropertyConstraintViolation,
    OccurrenceConstraintViolation,
    TypeConstraintViolation,
    GenericError,
}

impl ErrorCode for ProtocolError {
    fn from_code(code: &str) -> Self {
        match code {
            "NotImplemented" => ProtocolError::NotImplemented,
            "NotSupported" => ProtocolError::NotSupported,
            "InternalError" => ProtocolError::InternalError,
            "ProtocolError" => ProtocolError::ProtocolError,
            "SecurityError" => ProtocolError::SecurityError,
            "FormationViolation" => ProtocolError::FormationViolation,
            "PropertyConstraintViolation" => ProtocolError::PropertyConstraintViolation,
            // 1.6 spells it with a single 'r' on the wire
            "OccurenceConstraintViolation" | "OccurrenceConstraintViolation" => {
                ProtocolError::OccurrenceConstraintViolation
            }
            "TypeConstraintViolation" => ProtocolError::TypeConstraintViolation,
            _ => ProtocolError::GenericError,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ProtocolError::NotImplemented => "NotImplemented",
            ProtocolError::NotSupported => "NotSupported",
            ProtocolError::InternalError => "InternalError",
            ProtocolError::ProtocolError => "ProtocolError",
            ProtocolError::SecurityError => "SecurityError",
            ProtocolError::FormationViolation => "FormationViolation",
            ProtocolError::PropertyConstraintViolation => "PropertyConstraintViolation",
            ProtocolError::OccurrenceConstraintViolation => "OccurenceConstraintViolation",
            ProtocolError::TypeConstraintViolation => "TypeConstraintViolation",
            ProtocolError::GenericError => "GenericError",
        }
    }
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
