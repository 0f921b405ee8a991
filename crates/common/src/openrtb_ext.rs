//! Typed views over the exchange's `ext` objects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `imp[i].ext` as sent to a single bidder: its params sit under `bidder`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtImpBidder {
    #[serde(default)]
    pub bidder: Value,
}

/// Contract for `imp[i].ext.bidder` when the bidder is Criteo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtImpCriteo {
    #[serde(rename = "zoneId", alias = "zoneid", skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<u64>,
    #[serde(
        rename = "networkId",
        alias = "networkid",
        skip_serializing_if = "Option::is_none"
    )]
    pub network_id: Option<u64>,
    #[serde(rename = "placement", skip_serializing_if = "Option::is_none")]
    pub placement_id: Option<String>,
}

/// Contract for `user.ext`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtUser {
    /// IAB TCF consent string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eids: Vec<ExtUserEid>,
}

/// An extended id as shared by an identity provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtUserEid {
    pub source: String,
    #[serde(default)]
    pub uids: Vec<ExtUserEidUid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtUserEidUid {
    pub id: String,
}

impl ExtUser {
    /// Read `user.ext` one field at a time.
    ///
    /// A field of the wrong shape, or an eid that does not decode, is skipped
    /// on its own so the remaining signals survive.
    #[must_use]
    pub fn from_value(ext: &Value) -> Self {
        let consent = ext
            .get("consent")
            .and_then(Value::as_str)
            .map(str::to_string);

        let eids = match ext.get("eids") {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|entry| match ExtUserEid::deserialize(entry) {
                    Ok(eid) => Some(eid),
                    Err(e) => {
                        log::warn!("Skipping unreadable user.ext.eids entry: {e}");
                        None
                    }
                })
                .collect(),
            Some(other) if !other.is_null() => {
                log::warn!("Ignoring user.ext.eids that is not an array");
                Vec::new()
            }
            _ => Vec::new(),
        };

        Self { consent, eids }
    }
}

/// Contract for `regs.ext`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtRegs {
    /// GDPR signal; only the least significant bit is meaningful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdpr: Option<i64>,
    /// CCPA privacy string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub us_privacy: Option<String>,
}

impl ExtRegs {
    /// Read `regs.ext` one field at a time; see [`ExtUser::from_value`].
    #[must_use]
    pub fn from_value(ext: &Value) -> Self {
        Self {
            gdpr: ext.get("gdpr").and_then(Value::as_i64),
            us_privacy: ext
                .get("us_privacy")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

/// Media type of a returned bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BidType {
    Banner,
    Video,
    Audio,
    Native,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_criteo_params_accept_both_spellings() {
        let camel: ExtImpCriteo =
            serde_json::from_value(json!({"zoneId": 123456})).expect("should parse zoneId");
        let lower: ExtImpCriteo =
            serde_json::from_value(json!({"zoneid": 123456})).expect("should parse zoneid");

        assert_eq!(camel.zone_id, Some(123_456));
        assert_eq!(camel, lower);
    }

    #[test]
    fn test_criteo_params_reject_string_zone_id() {
        let parsed = serde_json::from_value::<ExtImpCriteo>(json!({"zoneId": "123456"}));
        assert!(parsed.is_err(), "zone id given as string should be rejected");
    }

    #[test]
    fn test_criteo_params_full() {
        let params: ExtImpCriteo = serde_json::from_value(json!({
            "networkId": 7,
            "placement": "homepage-top"
        }))
        .expect("should parse params");

        assert_eq!(params.zone_id, None);
        assert_eq!(params.network_id, Some(7));
        assert_eq!(params.placement_id.as_deref(), Some("homepage-top"));
    }

    #[test]
    fn test_ext_user_keeps_consent_next_to_bad_eid() {
        let ext = ExtUser::from_value(&json!({
            "consent": "CONSENT",
            "eids": [
                {"source": "criteo.com", "uids": [{"id": "criteo-1"}]},
                {"source": 5}
            ]
        }));

        assert_eq!(ext.consent.as_deref(), Some("CONSENT"));
        assert_eq!(ext.eids.len(), 1);
        assert_eq!(ext.eids[0].source, "criteo.com");
    }

    #[test]
    fn test_ext_user_with_wrong_field_types() {
        let ext = ExtUser::from_value(&json!({"consent": 12, "eids": "nope"}));
        assert_eq!(ext.consent, None);
        assert!(ext.eids.is_empty());
    }

    #[test]
    fn test_ext_regs_reads_fields_independently() {
        let ext = ExtRegs::from_value(&json!({"gdpr": 300, "us_privacy": "1YNN"}));
        assert_eq!(ext.gdpr, Some(300));
        assert_eq!(ext.us_privacy.as_deref(), Some("1YNN"));

        let ext = ExtRegs::from_value(&json!({"gdpr": "yes", "us_privacy": "1YNN"}));
        assert_eq!(ext.gdpr, None);
        assert_eq!(ext.us_privacy.as_deref(), Some("1YNN"));
    }

    #[test]
    fn test_bid_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(BidType::Banner).expect("should serialize"),
            json!("banner")
        );
    }
}
