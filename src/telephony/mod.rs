//! Telephony provider integration.
//!
//! `client` talks to the Twilio REST API for call creation, termination and
//! status; `twiml` renders the call-control markup the carrier fetches on
//! callback; `stream` models the Media Streams socket protocol the carrier
//! speaks once the call connects.

mod client;
pub mod stream;
pub mod twiml;

pub use client::{CallInfo, TelephonyError, TelephonyResult, TwilioClient};
