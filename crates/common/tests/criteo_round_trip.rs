use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use criteo_bidder_common::adapters::criteo::{CriteoAdapter, CriteoConfig, SlotIdGenerator};
use criteo_bidder_common::adapters::{build_bidders, Bidder, ResponseData};
use criteo_bidder_common::openrtb::BidRequest;
use criteo_bidder_common::openrtb_ext::BidType;
use criteo_bidder_common::settings::Settings;
use http::StatusCode;
use serde_json::{json, Value};

struct CountingSlotIds(AtomicUsize);

impl SlotIdGenerator for CountingSlotIds {
    fn new_slot_id(&self) -> String {
        format!("slot-{}", self.0.fetch_add(1, Ordering::Relaxed))
    }
}

fn adapter() -> CriteoAdapter {
    CriteoAdapter::new(CriteoConfig::default())
        .with_slot_id_generator(Arc::new(CountingSlotIds(AtomicUsize::new(0))))
}

fn bid_request() -> BidRequest {
    serde_json::from_value(json!({
        "id": "auction-1",
        "site": {"id": "site-1", "page": "https://news.example/story"},
        "user": {"buyeruid": "cookie-1", "ext": {"consent": "BOJ/P2HOJ/P2HABABMAAAAAZ+A=="}},
        "device": {"os": "iOS", "ifa": "idfa-1", "ip": "10.0.0.1", "ua": "Mozilla/5.0"},
        "regs": {"ext": {"gdpr": 1}},
        "imp": [
            {"id": "imp-a", "banner": {"format": [{"w": 300, "h": 250}]}, "ext": {"bidder": {"zoneId": 11}}},
            {"id": "imp-b", "banner": {"w": 728, "h": 90}, "ext": {"bidder": {"zoneId": 12}}}
        ]
    }))
    .expect("valid bid request")
}

#[test]
fn request_and_response_round_trip() {
    let adapter = adapter();
    let request = bid_request();

    let (requests, errors) = adapter.make_requests(&request);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(requests.len(), 1);

    let body: Value = serde_json::from_slice(&requests[0].body).expect("JSON body");
    assert_eq!(
        body,
        json!({
            "id": "auction-1",
            "publisher": {"siteid": "site-1", "url": "https://news.example/story"},
            "user": {
                "deviceid": "idfa-1",
                "deviceos": "iOS",
                "deviceidtype": "idfa",
                "cookieuid": "cookie-1",
                "ip": "10.0.0.1",
                "ua": "Mozilla/5.0"
            },
            "gdprConsent": {"gdprApplies": true, "consentData": "BOJ/P2HOJ/P2HABABMAAAAAZ+A=="},
            "slots": [
                {"slotid": "slot-0", "impid": "imp-a", "zoneid": 11, "sizes": ["300x250"]},
                {"slotid": "slot-1", "impid": "imp-b", "zoneid": 12, "sizes": ["728x90"]}
            ]
        })
    );

    // Criteo answers for the second impression only.
    let criteo_body = json!({
        "slots": [{
            "impid": "imp-b",
            "zoneid": 12,
            "cpm": 2.345_678_901_234_567,
            "currency": "USD",
            "width": 728,
            "height": 90,
            "creative": "<iframe></iframe>"
        }]
    });
    let response = ResponseData::new(
        StatusCode::OK,
        serde_json::to_vec(&criteo_body).expect("serialize"),
    );

    let bidder_response = adapter
        .make_bids(&request, &response)
        .expect("bids should map")
        .expect("bids present");

    assert_eq!(bidder_response.currency, "USD");
    assert_eq!(bidder_response.bids.len(), 1);

    let typed = &bidder_response.bids[0];
    assert_eq!(typed.bid_type, BidType::Banner);
    assert_eq!(typed.bid.id, "12-imp-b");
    assert_eq!(typed.bid.impid, "imp-b");
    assert_eq!(typed.bid.price, 2.345_678_901_234_567);
    assert_eq!(typed.bid.crid.as_deref(), Some("CR-728x90"));
    assert_eq!(typed.bid.adm.as_deref(), Some("<iframe></iframe>"));
}

#[test]
fn no_content_ignores_body() {
    let adapter = adapter();
    let response = ResponseData::new(StatusCode::NO_CONTENT, "{garbage");

    let result = adapter
        .make_bids(&bid_request(), &response)
        .expect("204 is not an error");
    assert!(result.is_none());
}

#[test]
fn bidders_come_from_settings() {
    let settings = Settings::from_toml(
        r#"
        [adapters.criteo]
        endpoint = "https://bidder.criteo.com/cdb?profileId=230"
        "#,
    )
    .expect("settings should load");

    let bidders = build_bidders(&settings);
    assert_eq!(bidders.len(), 1);

    let (requests, _) = bidders[0].make_requests(&bid_request());
    assert_eq!(requests[0].uri, "https://bidder.criteo.com/cdb?profileId=230");

    let slot_id = serde_json::from_slice::<Value>(&requests[0].body).expect("JSON body")
        ["slots"][0]["slotid"]
        .as_str()
        .map(str::to_string)
        .expect("slot id present");
    assert_eq!(slot_id.len(), 36, "slot ids are hyphenated UUIDs");
}
