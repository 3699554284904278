//! Machine-readable failure taxonomy.

use serde::{Deserialize, Serialize};

/// The kind of a domain failure, shared across all service errors.
///
/// Every guard violation in the core maps to exactly one kind; the HTTP
/// boundary translates kinds into status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed input such as a non-positive quantity or negative price.
    InvalidInput,
    /// Missing buyer, order, product or payment.
    NotFound,
    /// The actor is not the order's buyer or the owning seller.
    AccessDenied,
    /// State-machine guard violation, stale price, insufficient stock,
    /// duplicate payment or amount mismatch.
    Conflict,
    /// Unexpected failure (storage, serialization).
    Internal,
}

impl ErrorKind {
    /// Returns the kind as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::AccessDenied => "ACCESS_DENIED",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings() {
        assert_eq!(ErrorKind::InvalidInput.as_str(), "INVALID_INPUT");
        assert_eq!(ErrorKind::AccessDenied.as_str(), "ACCESS_DENIED");
        assert_eq!(ErrorKind::Conflict.to_string(), "CONFLICT");
    }

    #[test]
    fn serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();
        assert_eq!(json, "\"NOT_FOUND\"");
    }
}
