//! Criteo wire types and the mapping from standardized bid requests.

use std::fmt::Write as _;

use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};

use crate::error::BidderError;
use crate::openrtb::{App, Banner, Bid, BidRequest, Device, Imp, Regs, Site, User};
use crate::openrtb_ext::{ExtImpBidder, ExtImpCriteo, ExtRegs, ExtUser};

use super::slot_id::SlotIdGenerator;

/// Source of the extended user id Criteo forwards as `criteoid`.
pub const CRITEO_EID_SOURCE: &str = "criteo.com";

// ============================================================================
// Criteo Request Types
// ============================================================================

/// Criteo bid request. Sections with nothing to say are left out entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriteoRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<CriteoPublisher>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<CriteoUser>,

    #[serde(rename = "gdprConsent", skip_serializing_if = "Option::is_none")]
    pub gdpr_consent: Option<CriteoGdprConsent>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<CriteoRequestSlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteoPublisher {
    #[serde(rename = "siteid", skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,

    /// App bundle id
    #[serde(rename = "bundleid", skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,

    /// Page URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Network shared by every impression of the request
    #[serde(rename = "networkid", skip_serializing_if = "Option::is_none")]
    pub network_id: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteoUser {
    /// Advertising id of the device
    #[serde(rename = "deviceid", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    #[serde(rename = "deviceos", skip_serializing_if = "Option::is_none")]
    pub device_os: Option<String>,

    /// Kind of advertising id: "idfa", "gaid" or "unknown"
    #[serde(rename = "deviceidtype", skip_serializing_if = "Option::is_none")]
    pub device_id_type: Option<String>,

    /// Criteo user id obtained through cookie sync
    #[serde(rename = "cookieuid", skip_serializing_if = "Option::is_none")]
    pub cookie_id: Option<String>,

    /// Criteo id shared through `user.ext.eids`
    #[serde(rename = "criteoid", skip_serializing_if = "Option::is_none")]
    pub criteo_id: Option<String>,

    /// CCPA privacy string
    #[serde(rename = "uspIab", skip_serializing_if = "Option::is_none")]
    pub usp_iab: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<String>,

    #[serde(rename = "ua", skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteoGdprConsent {
    #[serde(rename = "gdprApplies", skip_serializing_if = "Option::is_none")]
    pub gdpr_applies: Option<bool>,

    /// IAB TCF consent string
    #[serde(rename = "consentData", skip_serializing_if = "Option::is_none")]
    pub consent_data: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteoRequestSlot {
    #[serde(rename = "slotid", skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,

    #[serde(rename = "impid", skip_serializing_if = "Option::is_none")]
    pub imp_id: Option<String>,

    #[serde(rename = "zoneid", skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<u64>,

    #[serde(rename = "networkid", skip_serializing_if = "Option::is_none")]
    pub network_id: Option<u64>,

    #[serde(rename = "placementid", skip_serializing_if = "Option::is_none")]
    pub placement_id: Option<String>,

    /// Ad sizes as "WxH" strings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<String>,
}

impl CriteoPublisher {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl CriteoUser {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl CriteoGdprConsent {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Outcome of mapping a bid request: the Criteo request plus the
/// per-impression problems that did not stop it from being built.
#[derive(Debug)]
pub struct MappedRequest {
    pub request: CriteoRequest,
    pub warnings: Vec<Report<BidderError>>,
}

// ============================================================================
// Request Mapping
// ============================================================================

/// Build a Criteo request from a standardized bid request.
///
/// # Errors
///
/// Returns [`BidderError::BadInput`] if the request is missing, has no
/// impressions, or its impressions disagree on the network id.
pub fn build_criteo_request(
    request: Option<&BidRequest>,
    slot_ids: &dyn SlotIdGenerator,
) -> Result<MappedRequest, Report<BidderError>> {
    let Some(request) = request else {
        return Err(Report::new(BidderError::BadInput {
            message: "Bid request is missing".to_string(),
        }));
    };

    if request.imp.is_empty() {
        return Err(Report::new(BidderError::BadInput {
            message: "No impressions in the bid request".to_string(),
        })
        .attach(format!("request id: {}", request.id)));
    }

    let mut warnings = Vec::new();
    let (slots, network_id) = request_slots(&request.imp, slot_ids, &mut warnings)?;

    let criteo_request = CriteoRequest {
        id: non_empty(Some(&request.id)),
        publisher: publisher(request.app.as_ref(), request.site.as_ref(), network_id),
        user: user(
            request.user.as_ref(),
            request.device.as_ref(),
            request.regs.as_ref(),
        ),
        gdpr_consent: gdpr_consent(request.user.as_ref(), request.regs.as_ref()),
        slots,
    };

    log::debug!(
        "Criteo: mapped request '{}' into {} slots ({} warnings)",
        request.id,
        criteo_request.slots.len(),
        warnings.len()
    );

    Ok(MappedRequest {
        request: criteo_request,
        warnings,
    })
}

/// Map every impression to a slot and work out the request-wide network id.
fn request_slots(
    imps: &[Imp],
    slot_ids: &dyn SlotIdGenerator,
    warnings: &mut Vec<Report<BidderError>>,
) -> Result<(Vec<CriteoRequestSlot>, Option<u64>), Report<BidderError>> {
    let mut network_id: Option<u64> = None;
    let mut slots = Vec::with_capacity(imps.len());

    for imp in imps {
        let mut slot = CriteoRequestSlot {
            slot_id: Some(slot_ids.new_slot_id()),
            imp_id: non_empty(Some(&imp.id)),
            sizes: imp.banner.as_ref().map(slot_sizes).unwrap_or_default(),
            ..Default::default()
        };

        match imp_params(imp) {
            Ok(Some(params)) => {
                slot.zone_id = params.zone_id.filter(|&id| id > 0);
                slot.network_id = params.network_id.filter(|&id| id > 0);
                slot.placement_id = non_empty(params.placement_id.as_ref());

                if let Some(slot_network_id) = slot.network_id {
                    match network_id {
                        None => network_id = Some(slot_network_id),
                        Some(shared) if shared != slot_network_id => {
                            return Err(Report::new(BidderError::BadInput {
                                message: "Bid request has slots coming with several network IDs \
                                          which is not allowed"
                                    .to_string(),
                            })
                            .attach(format!(
                                "network ids {shared} and {slot_network_id} (impression '{}')",
                                imp.id
                            )));
                        }
                        Some(_) => {}
                    }
                }
            }
            Ok(None) => {}
            Err(report) => {
                log::warn!("Criteo: {report}");
                warnings.push(report);
            }
        }

        slots.push(slot);
    }

    Ok((slots, network_id))
}

/// Read the Criteo params out of `imp.ext.bidder`.
fn imp_params(imp: &Imp) -> Result<Option<ExtImpCriteo>, Report<BidderError>> {
    let Some(ext) = &imp.ext else {
        return Ok(None);
    };

    let params_error = || BidderError::ImpressionParams {
        imp_id: imp.id.clone(),
        message: "Failed to parse Criteo bidder params".to_string(),
    };

    let bidder_ext: ExtImpBidder =
        serde_json::from_value(ext.clone()).change_context_lazy(params_error)?;

    if bidder_ext.bidder.is_null() {
        return Ok(None);
    }

    serde_json::from_value(bidder_ext.bidder)
        .map(Some)
        .change_context_lazy(params_error)
}

/// One "WxH" entry per banner format, or the explicit banner size.
fn slot_sizes(banner: &Banner) -> Vec<String> {
    if !banner.format.is_empty() {
        return banner
            .format
            .iter()
            .map(|format| size_string(format.w, format.h))
            .collect();
    }

    match (banner.w, banner.h) {
        (Some(w), Some(h)) if w > 0 && h > 0 => vec![size_string(w, h)],
        _ => Vec::new(),
    }
}

fn size_string(width: u64, height: u64) -> String {
    format!("{width}x{height}")
}

fn publisher(
    app: Option<&App>,
    site: Option<&Site>,
    network_id: Option<u64>,
) -> Option<CriteoPublisher> {
    let mut publisher = CriteoPublisher {
        network_id,
        ..Default::default()
    };

    if let Some(app) = app {
        publisher.bundle_id = non_empty(app.bundle.as_ref());
    }

    if let Some(site) = site {
        publisher.site_id = non_empty(site.id.as_ref());
        publisher.url = non_empty(site.page.as_ref());
    }

    (!publisher.is_empty()).then_some(publisher)
}

fn user(user: Option<&User>, device: Option<&Device>, regs: Option<&Regs>) -> Option<CriteoUser> {
    let mut criteo_user = CriteoUser::default();

    if let Some(user) = user {
        criteo_user.cookie_id = non_empty(user.buyeruid.as_ref());
        criteo_user.criteo_id = user_ext(user).and_then(|ext| criteo_eid(&ext));
    }

    if let Some(device) = device {
        // The id type is derived even when no advertising id was sent.
        criteo_user.device_id_type = Some(device_id_type(device.os.as_deref()).to_string());
        criteo_user.device_os = non_empty(device.os.as_ref());
        criteo_user.device_id = non_empty(device.ifa.as_ref());
        criteo_user.ip = non_empty(device.ip.as_ref());
        criteo_user.ipv6 = non_empty(device.ipv6.as_ref());
        criteo_user.user_agent = non_empty(device.ua.as_ref());
    }

    if let Some(ext) = regs.and_then(regs_ext) {
        criteo_user.usp_iab = non_empty(ext.us_privacy.as_ref());
    }

    (!criteo_user.is_empty()).then_some(criteo_user)
}

fn gdpr_consent(user: Option<&User>, regs: Option<&Regs>) -> Option<CriteoGdprConsent> {
    let consent = CriteoGdprConsent {
        gdpr_applies: regs
            .and_then(regs_ext)
            .and_then(|ext| ext.gdpr)
            .map(|gdpr| gdpr & 1 == 1),
        consent_data: user
            .and_then(user_ext)
            .and_then(|ext| non_empty(ext.consent.as_ref())),
    };

    (!consent.is_empty()).then_some(consent)
}

fn criteo_eid(ext: &ExtUser) -> Option<String> {
    ext.eids
        .iter()
        .find(|eid| eid.source == CRITEO_EID_SOURCE)
        .and_then(|eid| eid.uids.first())
        .and_then(|uid| non_empty(Some(&uid.id)))
}

fn user_ext(user: &User) -> Option<ExtUser> {
    user.ext.as_ref().map(ExtUser::from_value)
}

fn regs_ext(regs: &Regs) -> Option<ExtRegs> {
    regs.ext.as_ref().map(ExtRegs::from_value)
}

/// Kind of advertising id for a device OS, compared case-insensitively.
#[must_use]
pub fn device_id_type(os: Option<&str>) -> &'static str {
    match os.map(str::to_ascii_lowercase).as_deref() {
        Some("ios") => "idfa",
        Some("android") => "gaid",
        _ => "unknown",
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.is_empty()).cloned()
}

// ============================================================================
// Criteo Response Types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriteoResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub slots: Vec<CriteoResponseSlot>,
}

impl CriteoResponse {
    /// Decode a Criteo response body.
    ///
    /// # Errors
    ///
    /// Returns [`BidderError::Serialization`] if the body is not a valid response.
    pub fn from_slice(body: &[u8]) -> Result<Self, Report<BidderError>> {
        serde_json::from_slice(body).change_context(BidderError::Serialization {
            message: "Failed to parse Criteo response JSON".to_string(),
        })
    }
}

/// One bid returned by Criteo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriteoResponseSlot {
    /// Bid id; older responses leave it out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "impid", default)]
    pub imp_id: String,

    #[serde(rename = "zoneid", skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<u64>,

    #[serde(rename = "networkid", skip_serializing_if = "Option::is_none")]
    pub network_id: Option<u64>,

    /// Price in CPM
    pub cpm: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,

    /// Creative markup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creative: Option<String>,

    /// Creative id; older responses leave it out
    #[serde(rename = "creativeid", skip_serializing_if = "Option::is_none")]
    pub creative_id: Option<String>,
}

impl CriteoResponseSlot {
    /// The slot's bid id, falling back to `<zoneId>-<impId>`.
    #[must_use]
    pub fn bid_id(&self) -> String {
        if let Some(id) = non_empty(self.id.as_ref()) {
            id
        } else {
            match self.zone_id {
                Some(zone_id) => format!("{zone_id}-{}", self.imp_id),
                None => self.imp_id.clone(),
            }
        }
    }

    /// The slot's creative id, falling back to `CR-<width>x<height>`.
    #[must_use]
    pub fn creative_id(&self) -> String {
        if let Some(creative_id) = non_empty(self.creative_id.as_ref()) {
            creative_id
        } else {
            let mut creative_id = String::from("CR-");
            if let Some(width) = self.width {
                let _ = write!(creative_id, "{width}x");
            }
            if let Some(height) = self.height {
                let _ = write!(creative_id, "{height}");
            }
            creative_id
        }
    }

    /// Convert into a standardized bid; price and markup are copied as-is.
    #[must_use]
    pub fn into_bid(self) -> Bid {
        Bid {
            id: self.bid_id(),
            crid: Some(self.creative_id()),
            impid: self.imp_id,
            price: self.cpm,
            adm: self.creative,
            w: self.width,
            h: self.height,
        }
    }
}
