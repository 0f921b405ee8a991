//! Criteo bidder adapter for an OpenRTB-style exchange.
//!
//! The adapter is a set of pure transformations: a standardized bid request
//! becomes a Criteo HTTP request, and Criteo's HTTP response becomes typed
//! bids. Sending the request is left to the host exchange.
//!
//! # Modules
//!
//! - [`adapters`]: The [`adapters::Bidder`] trait and the Criteo adapter
//! - [`constants`]: Header names
//! - [`error`]: Error types
//! - [`logging`]: Logger setup for binaries
//! - [`openrtb`]: Standardized bid request and bid types
//! - [`openrtb_ext`]: Typed views over `ext` objects
//! - [`settings`]: Configuration loading and validation
//! - [`test_support`]: Testing utilities

pub mod adapters;
pub mod constants;
pub mod error;
pub mod logging;
pub mod openrtb;
pub mod openrtb_ext;
pub mod settings;
