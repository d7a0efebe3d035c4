//! Request-origin metadata for the unauthenticated approval channel.

use serde::{Deserialize, Serialize};

/// Where an unauthenticated approval request came from.
///
/// Collected at the API boundary for audit logging of approve/reject
/// actions. The domain core never consumes this; it only travels alongside
/// the request into log fields and notification payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OriginInfo {
    /// Client IP address as observed by the server.
    pub ip: Option<String>,
    /// Internet service provider name, if enrichment ran.
    pub isp: Option<String>,
    /// City, if enrichment ran.
    pub city: Option<String>,
    /// Country, if enrichment ran.
    pub country: Option<String>,
    /// Organization, if enrichment ran.
    pub org: Option<String>,
}

impl OriginInfo {
    /// Creates an origin carrying only the client IP.
    #[must_use]
    pub fn from_ip(ip: impl Into<String>) -> Self {
        Self {
            ip: Some(ip.into()),
            ..Self::default()
        }
    }
}
