//! Per-adapter configuration, supplied by the host's config layer.

use crossbot_core::DestinationId;

/// What an adapter needs beyond its platform client: optional log/status
/// destinations and the admin allow-list of handles.
#[derive(Debug, Clone, Default)]
pub struct AdapterConfig {
    /// Handles allowed to use admin-only commands. Empty means anyone may.
    pub admin_allowlist: Vec<String>,
    /// Destination for operator log messages, if any.
    pub log_destination: Option<DestinationId>,
    /// Destination for the continually updated status message, if any.
    pub status_destination: Option<DestinationId>,
}
