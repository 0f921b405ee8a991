//! Criteo bidder adapter.
//!
//! Maps standardized bid requests to Criteo's CDB request format, builds the
//! headers Criteo reads the user from, and maps Criteo slots back to banner
//! bids.

use std::sync::Arc;

use bytes::Bytes;
use error_stack::{Report, ResultExt};
use http::header::{HeaderMap, HeaderName, HeaderValue, COOKIE, USER_AGENT};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::adapters::{Bidder, BidderResponse, RequestData, ResponseData, TypedBid};
use crate::constants::HEADER_X_CLIENT_IP;
use crate::error::BidderError;
use crate::openrtb::BidRequest;
use crate::openrtb_ext::BidType;
use crate::settings::{AdapterConfig, Settings};

pub mod models;
pub mod slot_id;

pub use models::{build_criteo_request, CriteoRequest, CriteoResponse, MappedRequest};
pub use slot_id::{SlotIdGenerator, UuidSlotIdGenerator};

/// Name under which the adapter is registered and configured.
pub const BIDDER_NAME: &str = "criteo";

/// Configuration for the Criteo adapter, read from `[adapters.criteo]`.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CriteoConfig {
    /// Whether the adapter is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Criteo CDB endpoint
    #[serde(default = "default_endpoint")]
    #[validate(url)]
    pub endpoint: String,
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "https://bidder.criteo.com/cdb?profileId=230".to_string()
}

impl Default for CriteoConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
        }
    }
}

impl AdapterConfig for CriteoConfig {
    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Criteo bidder.
pub struct CriteoAdapter {
    config: CriteoConfig,
    slot_ids: Arc<dyn SlotIdGenerator>,
}

impl CriteoAdapter {
    /// Create an adapter that names slots with random UUIDs.
    #[must_use]
    pub fn new(config: CriteoConfig) -> Self {
        Self {
            config,
            slot_ids: Arc::new(UuidSlotIdGenerator),
        }
    }

    /// Replace the slot id generator.
    #[must_use]
    pub fn with_slot_id_generator(mut self, slot_ids: Arc<dyn SlotIdGenerator>) -> Self {
        self.slot_ids = slot_ids;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

impl Bidder for CriteoAdapter {
    fn bidder_name(&self) -> &'static str {
        BIDDER_NAME
    }

    fn make_requests(
        &self,
        request: &BidRequest,
    ) -> (Vec<RequestData>, Vec<Report<BidderError>>) {
        let MappedRequest {
            request: criteo_request,
            warnings,
        } = match build_criteo_request(Some(request), self.slot_ids.as_ref()) {
            Ok(mapped) => mapped,
            Err(report) => return (Vec::new(), vec![report]),
        };

        let body = match serde_json::to_vec(&criteo_request).change_context(
            BidderError::Serialization {
                message: "Failed to serialize Criteo request".to_string(),
            },
        ) {
            Ok(body) => body,
            Err(report) => return (Vec::new(), vec![report]),
        };

        log::debug!(
            "Criteo: sending {} bytes to {}",
            body.len(),
            self.config.endpoint
        );

        let request_data = RequestData {
            method: Method::POST,
            uri: self.config.endpoint.clone(),
            body: Bytes::from(body),
            headers: request_headers(Some(&criteo_request)),
        };

        (vec![request_data], warnings)
    }

    fn make_bids(
        &self,
        _request: &BidRequest,
        response: &ResponseData,
    ) -> Result<Option<BidderResponse>, Report<BidderError>> {
        if response.status == StatusCode::NO_CONTENT {
            log::debug!("Criteo: no bids (204)");
            return Ok(None);
        }

        if response.status.is_client_error() || response.status.is_server_error() {
            return Err(Report::new(BidderError::BadServerResponse {
                message: format!("Criteo responded with status {}", response.status),
            }));
        }

        if response.status != StatusCode::OK {
            log::debug!("Criteo: decoding body of {} response", response.status);
        }

        let criteo_response = CriteoResponse::from_slice(&response.body)
            .attach(format!("status: {}", response.status))?;

        let mut bidder_response = BidderResponse::with_capacity(criteo_response.slots.len());
        if let Some(currency) = criteo_response
            .slots
            .iter()
            .filter_map(|slot| slot.currency.as_deref())
            .find(|currency| !currency.is_empty())
        {
            bidder_response.currency = currency.to_string();
        }

        for slot in criteo_response.slots {
            bidder_response.bids.push(TypedBid {
                bid: slot.into_bid(),
                bid_type: BidType::Banner,
            });
        }

        log::debug!(
            "Criteo returned {} bids in {}",
            bidder_response.bids.len(),
            bidder_response.currency
        );

        Ok(Some(bidder_response))
    }
}

/// Headers Criteo expects alongside a request.
///
/// The cookie id travels as `Cookie: uid=<id>`, the client IP as
/// `X-Client-Ip` and the user agent as `User-Agent`. Absent or empty values
/// produce no header.
#[must_use]
pub fn request_headers(request: Option<&CriteoRequest>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let Some(user) = request.and_then(|request| request.user.as_ref()) else {
        return headers;
    };

    if let Some(cookie_id) = user.cookie_id.as_deref().filter(|id| !id.is_empty()) {
        insert_header(&mut headers, COOKIE, &format!("uid={cookie_id}"));
    }
    if let Some(ip) = user.ip.as_deref().filter(|ip| !ip.is_empty()) {
        insert_header(&mut headers, HEADER_X_CLIENT_IP, ip);
    }
    if let Some(user_agent) = user.user_agent.as_deref().filter(|ua| !ua.is_empty()) {
        insert_header(&mut headers, USER_AGENT, user_agent);
    }

    headers
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(e) => {
            log::warn!("Criteo: skipping header {name}: {e}");
        }
    }
}

// ============================================================================
// Bidder Auto-Registration
// ============================================================================

/// Register the Criteo bidder when `[adapters.criteo]` is present and enabled.
#[must_use]
pub fn register_bidders(settings: &Settings) -> Vec<Arc<dyn Bidder>> {
    let mut bidders: Vec<Arc<dyn Bidder>> = Vec::new();

    match settings.adapter_config::<CriteoConfig>(BIDDER_NAME) {
        Ok(Some(config)) => {
            log::info!("Registering Criteo bidder (endpoint: {})", config.endpoint);
            bidders.push(Arc::new(CriteoAdapter::new(config)));
        }
        Ok(None) => {
            log::debug!("Criteo adapter config missing or disabled");
        }
        Err(e) => {
            log::error!("Failed to load Criteo configuration: {:?}", e);
        }
    }

    bidders
}
