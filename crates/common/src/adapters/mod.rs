//! Bidder adapters.
//!
//! An adapter turns a standardized [`BidRequest`] into the HTTP request a
//! bidder expects, and turns the bidder's HTTP response back into typed bids.
//! Adapters never perform I/O themselves: the host exchange sends the
//! [`RequestData`] and hands the outcome back as [`ResponseData`].

use std::sync::Arc;

use bytes::Bytes;
use error_stack::Report;
use http::{HeaderMap, Method, StatusCode};

use crate::error::BidderError;
use crate::openrtb::{Bid, BidRequest};
use crate::openrtb_ext::BidType;
use crate::settings::Settings;

pub mod criteo;

/// Currency assumed when a bidder does not state one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Trait implemented by all bidder adapters.
pub trait Bidder: Send + Sync {
    /// Unique identifier for this bidder (e.g., "criteo").
    fn bidder_name(&self) -> &'static str;

    /// Build the outgoing HTTP requests for a bid request.
    ///
    /// Fatal errors come back with no requests. Non-fatal errors (see
    /// [`BidderError::is_fatal`]) may accompany requests that were still built.
    fn make_requests(&self, request: &BidRequest)
        -> (Vec<RequestData>, Vec<Report<BidderError>>);

    /// Turn the bidder's HTTP response into typed bids.
    ///
    /// `Ok(None)` means the bidder explicitly declined to bid.
    ///
    /// # Errors
    ///
    /// Returns an error if the response body cannot be decoded.
    fn make_bids(
        &self,
        request: &BidRequest,
        response: &ResponseData,
    ) -> Result<Option<BidderResponse>, Report<BidderError>>;

    /// Check if this bidder can return bids of the given type.
    fn supports_bid_type(&self, bid_type: &BidType) -> bool {
        // By default, support banner ads
        matches!(bid_type, BidType::Banner)
    }
}

/// An HTTP request ready to be sent by the exchange's transport layer.
#[derive(Debug, Clone)]
pub struct RequestData {
    pub method: Method,
    pub uri: String,
    pub body: Bytes,
    pub headers: HeaderMap,
}

/// The bidder's HTTP response as received by the transport layer.
#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status: StatusCode,
    pub body: Bytes,
    pub headers: HeaderMap,
}

impl ResponseData {
    /// Create a response with no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HeaderMap::new(),
        }
    }
}

/// A bid together with its media type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedBid {
    pub bid: Bid,
    pub bid_type: BidType,
}

/// All bids one bidder returned for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct BidderResponse {
    pub currency: String,
    pub bids: Vec<TypedBid>,
}

impl BidderResponse {
    /// Create a response in the default currency with room for `capacity` bids.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            bids: Vec::with_capacity(capacity),
        }
    }
}

/// Type alias for bidder builder functions.
type BidderBuilder = fn(&Settings) -> Vec<Arc<dyn Bidder>>;

/// Returns the list of all available bidder builder functions.
///
/// Each builder checks the settings for its own adapter section and returns
/// the bidders it enables.
fn bidder_builders() -> &'static [BidderBuilder] {
    &[criteo::register_bidders]
}

/// Build every bidder enabled in the settings.
#[must_use]
pub fn build_bidders(settings: &Settings) -> Vec<Arc<dyn Bidder>> {
    let bidders: Vec<Arc<dyn Bidder>> = bidder_builders()
        .iter()
        .flat_map(|builder| builder(settings))
        .collect();

    log::info!("Built {} bidder adapters", bidders.len());

    bidders
}
