use std::{fmt::{
    Display,
    Result,
    Formatter
}, cmp};
use pest::error::{Error as PestError, LineColLocation};
use crate::utils::policy::pest::human::Rule as humanRule;
use std::array::TryFromSliceError;
use rabe_bn::FieldError;

/// Every way an operation of this crate can fail.
///
/// `PolicyNotSatisfied` is an authorization outcome, not a fault: callers
/// should show "access denied" for it and "corrupted data" for the
/// element / group variants.
#[derive(Clone, PartialEq, Debug)]
pub enum AbeError {
    /// The policy string could not be parsed.
    PolicySyntaxError(String),
    /// An attribute id outside of `[0, universe_size)`.
    InvalidAttribute {
        attribute: usize,
        universe_size: usize,
    },
    /// KeyGen was called without attributes.
    EmptyAttributeSet,
    /// Serialized bytes (or a serialized record) are truncated or corrupt.
    MalformedElement(String),
    /// The attributes of the secret key do not satisfy the ciphertext policy.
    PolicyNotSatisfied,
    /// A component decoded to a different element type than expected.
    InvalidElement {
        expected: String,
        found: String,
    },
    /// Operands or records stem from incompatible groups / parameters.
    GroupMismatch {
        expected: String,
        found: String,
    },
    /// AES-GCM tag mismatch.
    AuthenticationFailed,
    /// The recovered KEM key does not match the verification tag.
    KeyVerificationFailed,
    /// Key files could not be read or written.
    Io(String),
    /// Invalid configuration value.
    Config(String),
}

impl AbeError {
    /// True for the legitimate "access denied" outcome of decryption.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, AbeError::PolicyNotSatisfied)
    }

    pub(crate) fn malformed(msg: &str) -> AbeError {
        AbeError::MalformedElement(msg.to_string())
    }
}

impl Display for AbeError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            AbeError::PolicySyntaxError(details) => write!(f, "Error: policy syntax: {}", details),
            AbeError::InvalidAttribute { attribute, universe_size } => write!(
                f,
                "Error: attribute {} is outside of the universe [0, {})",
                attribute, universe_size
            ),
            AbeError::EmptyAttributeSet => write!(f, "Error: empty attribute set"),
            AbeError::MalformedElement(details) => write!(f, "Error: malformed element: {}", details),
            AbeError::PolicyNotSatisfied => write!(f, "Error: policy not satisfied"),
            AbeError::InvalidElement { expected, found } => write!(
                f,
                "Error: invalid element type, expected {} but found {}",
                expected, found
            ),
            AbeError::GroupMismatch { expected, found } => write!(
                f,
                "Error: group mismatch, expected {} but found {}",
                expected, found
            ),
            AbeError::AuthenticationFailed => write!(f, "Error: authentication failed"),
            AbeError::KeyVerificationFailed => write!(f, "Error: key verification failed"),
            AbeError::Io(details) => write!(f, "Error: io: {}", details),
            AbeError::Config(details) => write!(f, "Error: config: {}", details),
        }
    }
}

impl std::error::Error for AbeError {}

impl From<PestError<humanRule>> for AbeError {
    fn from(error: PestError<humanRule>) -> Self {
        let (line, col) = match error.line_col.to_owned() {
            LineColLocation::Pos((line, col)) => (line, col),
            LineColLocation::Span((start_line, start_col), (end_line, _)) => {
                (cmp::max(start_line, end_line), start_col)
            }
        };
        AbeError::PolicySyntaxError(format!("unexpected input at line {} column {}", line, col))
    }
}

impl From<FieldError> for AbeError {
    fn from(error: FieldError) -> Self {
        match error {
            FieldError::InvalidSliceLength => AbeError::malformed("FieldError::InvalidSliceLength"),
            FieldError::InvalidU512Encoding => AbeError::malformed("FieldError::InvalidU512Encoding"),
            FieldError::NotMember => AbeError::malformed("FieldError::NotMember"),
        }
    }
}

impl From<TryFromSliceError> for AbeError {
    fn from(error: TryFromSliceError) -> Self {
        AbeError::MalformedElement(error.to_string())
    }
}

impl From<base64::DecodeError> for AbeError {
    fn from(error: base64::DecodeError) -> Self {
        AbeError::MalformedElement(format!("base64: {}", error))
    }
}

impl From<serde_json::Error> for AbeError {
    fn from(error: serde_json::Error) -> Self {
        AbeError::MalformedElement(format!("record: {}", error))
    }
}

impl From<std::io::Error> for AbeError {
    fn from(error: std::io::Error) -> Self {
        AbeError::Io(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_is_distinct() {
        assert!(AbeError::PolicyNotSatisfied.is_access_denied());
        assert!(!AbeError::malformed("x").is_access_denied());
        assert!(!AbeError::InvalidElement {
            expected: "G1".to_string(),
            found: "GT".to_string()
        }.is_access_denied());
    }

    #[test]
    fn test_display() {
        let err = AbeError::InvalidAttribute { attribute: 7, universe_size: 4 };
        assert_eq!(err.to_string(), "Error: attribute 7 is outside of the universe [0, 4)");
    }
}
