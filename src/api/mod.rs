//! HTTP API client for the trading backend.
//!
//! This module provides the `ApiClient` for talking to the backend's
//! enveloped REST API. Every response arrives wrapped as
//! `{ code, message, data }`; `code == 200` is the sole success
//! discriminator and successful calls resolve with the `data` field.
//!
//! The client attaches a bearer token from the session store when one is
//! present and drives the shared session-expiry path on any 401, whether
//! it arrives as a transport status or an envelope code.

pub mod client;
pub mod error;

pub use client::{ApiClient, Envelope};
pub use error::ApiError;
