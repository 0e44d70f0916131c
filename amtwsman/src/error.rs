use thiserror::Error;

pub type Result<T> = std::result::Result<T, WsmanError>;

/// Failures of a WS-Management round trip, from transport to typed result
#[derive(Error, Debug)]
pub enum WsmanError {
    /// The gateway could not run the request or returned nothing usable
    #[error("WS-Management transport failure: {0}")]
    Transport(String),

    #[error("Malformed XML response: {0}")]
    MalformedXml(#[from] xmltree::ParseError),

    #[error("Cannot serialize request document: {0}")]
    Build(#[from] xmltree::Error),

    /// A SOAP fault was returned; carries the fault reason verbatim
    #[error("Remote fault: {0}")]
    RemoteFault(String),

    #[error("Missing {0} element in response")]
    MissingField(String),

    #[error("Unrecognized {table} code: {code}")]
    UnrecognizedCode { table: &'static str, code: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid VNC password: {0}")]
    InvalidPassword(String),

    #[error(
        "VNC password must include at least 1 capital letter, 1 lowercase letter, 1 digit and 1 special character"
    )]
    WeakPassword,

    #[error("Operation not permitted: {0}")]
    NotPermitted(String),

    #[error("Power state '{requested}' is not currently available, available: {}", .available.join(", "))]
    StateUnavailable {
        requested: String,
        available: Vec<String>,
    },
}

impl WsmanError {
    pub fn missing_field(name: &str) -> Self {
        WsmanError::MissingField(name.to_string())
    }

    pub fn unrecognized_code(table: &'static str, code: &str) -> Self {
        WsmanError::UnrecognizedCode {
            table,
            code: code.to_string(),
        }
    }

    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        WsmanError::InvalidArgument(detail.into())
    }

    /// `true` for the errors caused by a bad caller supplied value
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            WsmanError::InvalidArgument(_)
                | WsmanError::InvalidPassword(_)
                | WsmanError::WeakPassword
        )
    }

    /// `true` when the device answered with a SOAP fault
    pub fn is_remote_fault(&self) -> bool {
        matches!(self, WsmanError::RemoteFault(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = WsmanError::unrecognized_code("power state", "42");
        assert_eq!(err.to_string(), "Unrecognized power state code: 42");

        let err = WsmanError::StateUnavailable {
            requested: "On".to_string(),
            available: vec!["Power Off - Soft".to_string(), "Master Bus Reset".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Power state 'On' is not currently available, available: Power Off - Soft, Master Bus Reset"
        );
    }

    #[test]
    fn test_invalid_argument_family() {
        assert!(WsmanError::invalid_argument("x").is_invalid_argument());
        assert!(WsmanError::WeakPassword.is_invalid_argument());
        assert!(WsmanError::InvalidPassword("short".into()).is_invalid_argument());
        assert!(!WsmanError::missing_field("ReturnValue").is_invalid_argument());
        assert!(WsmanError::RemoteFault("denied".into()).is_remote_fault());
    }
}
