//! Client identification
//!
//! Login lockout state is scoped per browser. Each browser gets a random
//! device id on first contact, carried back in a signed HttpOnly cookie,
//! the server-side counterpart of a local storage slot.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

use crate::crypto::{SigningKey, random_bytes, to_hex};

const DEVICE_ID_BYTES: usize = 16;
const DEVICE_TAG: &str = "device:";

/// Random per-browser id (32 lowercase hex chars)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn generate() -> Self {
        Self(to_hex(&random_bytes(DEVICE_ID_BYTES)))
    }

    /// Accepts only the shape [`DeviceId::generate`] produces
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == DEVICE_ID_BYTES * 2
            && raw.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        well_formed.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Cookie value; tagged so a session token can't pass as a device token
    pub fn sign(&self, key: &SigningKey) -> String {
        key.sign(&format!("{DEVICE_TAG}{}", self.0))
    }

    pub fn from_signed(token: &str, key: &SigningKey) -> Option<Self> {
        key.verify(token)
            .and_then(|payload| payload.strip_prefix(DEVICE_TAG))
            .and_then(Self::parse)
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client fingerprint: the device id plus request metadata
#[derive(Debug, Clone)]
pub struct ClientFingerprint {
    pub device: DeviceId,
    /// Client IP (X-Forwarded-For first hop), logged only
    pub ip: Option<IpAddr>,
}

impl ClientFingerprint {
    pub fn new(device: DeviceId, ip: Option<IpAddr>) -> Self {
        Self { device, ip }
    }

    /// Key used to scope per-device state
    pub fn device_key(&self) -> String {
        self.device.as_str().to_string()
    }

    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FingerprintError {
    #[error("Missing required header: {0}")]
    MissingHeader(&'static str),
}

/// Fingerprint a request; headless clients without a User-Agent are refused
pub fn extract_fingerprint(
    headers: &HeaderMap,
    device: DeviceId,
) -> Result<ClientFingerprint, FingerprintError> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .filter(|ua| !ua.trim().is_empty())
        .ok_or(FingerprintError::MissingHeader("User-Agent"))?;

    Ok(ClientFingerprint::new(device, extract_client_ip(headers)))
}

/// First hop of X-Forwarded-For, if parseable
pub fn extract_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
}
