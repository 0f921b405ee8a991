//! Error types for the bidder adapters.
//!
//! Errors are carried inside [`error_stack::Report`]s so call sites can attach
//! context (impression ids, endpoints) with `change_context` and `attach`.

use derive_more::{Display, Error};

/// Errors raised while translating auctions to and from a bidder's wire format.
#[derive(Debug, Display, Error)]
pub enum BidderError {
    /// The incoming bid request cannot be used to build a bidder request.
    #[display("Bad input: {message}")]
    BadInput { message: String },

    /// JSON encoding or decoding failed in either direction.
    #[display("Serialization error: {message}")]
    Serialization { message: String },

    /// The bidder parameters of a single impression could not be read.
    ///
    /// Reported alongside the request; sibling impressions are still mapped.
    #[display("Invalid bidder params for impression {imp_id}: {message}")]
    ImpressionParams { imp_id: String, message: String },

    /// The bidder answered with something other than a usable bid response.
    #[display("Bad server response: {message}")]
    BadServerResponse { message: String },

    /// Settings are missing or invalid.
    #[display("Configuration error: {message}")]
    Configuration { message: String },
}

impl BidderError {
    /// Returns `true` when the error aborts the whole call.
    ///
    /// Only per-impression parameter errors are non-fatal.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ImpressionParams { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BidderError::BadInput {
                message: "No impressions in the bid request".to_string(),
            }
            .to_string(),
            "Bad input: No impressions in the bid request"
        );
        assert_eq!(
            BidderError::ImpressionParams {
                imp_id: "imp-1".to_string(),
                message: "expected u64".to_string(),
            }
            .to_string(),
            "Invalid bidder params for impression imp-1: expected u64"
        );
    }

    #[test]
    fn test_only_impression_params_are_non_fatal() {
        assert!(!BidderError::ImpressionParams {
            imp_id: "imp-1".to_string(),
            message: String::new(),
        }
        .is_fatal());
        assert!(BidderError::BadInput {
            message: String::new()
        }
        .is_fatal());
        assert!(BidderError::Serialization {
            message: String::new()
        }
        .is_fatal());
        assert!(BidderError::BadServerResponse {
            message: String::new()
        }
        .is_fatal());
    }
}
