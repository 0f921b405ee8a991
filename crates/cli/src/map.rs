//! Commands that run the Criteo mappings against JSON files.

use std::fs;
use std::path::Path;

use criteo_bidder_common::adapters::{Bidder, BidderResponse, RequestData, ResponseData};
use criteo_bidder_common::openrtb::BidRequest;
use http::StatusCode;
use serde_json::{json, Map, Value};

use crate::config::criteo_adapter;
use crate::error::CliError;

fn read_bid_request(file: &Path) -> Result<BidRequest, CliError> {
    let content = fs::read(file)?;
    Ok(serde_json::from_slice(&content)?)
}

/// Print the HTTP request Criteo would receive for a bid request.
pub fn request(input: &Path, config: Option<&Path>, verbose: bool) -> Result<(), CliError> {
    let adapter = criteo_adapter(config, verbose)?;
    let bid_request = read_bid_request(input)?;

    let (requests, errors) = adapter.make_requests(&bid_request);
    for error in &errors {
        if error.current_context().is_fatal() {
            return Err(CliError::Bidder(format!("{:?}", error)));
        }
        eprintln!("Warning: {}", error.current_context());
    }

    for request in &requests {
        println!("{}", serde_json::to_string_pretty(&render_request(request)?)?);
    }

    Ok(())
}

/// Print the bids Criteo's response maps to.
pub fn bids(
    input: &Path,
    response: &Path,
    status: u16,
    config: Option<&Path>,
    verbose: bool,
) -> Result<(), CliError> {
    let adapter = criteo_adapter(config, verbose)?;
    let bid_request = read_bid_request(input)?;

    let status = StatusCode::from_u16(status)
        .map_err(|e| CliError::Config(format!("Invalid status code {status}: {e}")))?;
    let response = ResponseData::new(status, fs::read(response)?);

    let bidder_response = adapter
        .make_bids(&bid_request, &response)
        .map_err(|e| CliError::Bidder(format!("{:?}", e)))?;

    match bidder_response {
        Some(bidder_response) => println!(
            "{}",
            serde_json::to_string_pretty(&render_bids(&bidder_response)?)?
        ),
        None => println!("Criteo returned no bids"),
    }

    Ok(())
}

fn render_request(request: &RequestData) -> Result<Value, CliError> {
    let headers: Map<String, Value> = request
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();

    Ok(json!({
        "method": request.method.as_str(),
        "uri": request.uri,
        "headers": headers,
        "body": serde_json::from_slice::<Value>(&request.body)?,
    }))
}

fn render_bids(response: &BidderResponse) -> Result<Value, CliError> {
    let bids = response
        .bids
        .iter()
        .map(|typed| {
            Ok(json!({
                "type": typed.bid_type,
                "bid": serde_json::to_value(&typed.bid)?,
            }))
        })
        .collect::<Result<Vec<Value>, CliError>>()?;

    Ok(json!({
        "currency": response.currency,
        "bids": bids,
    }))
}
