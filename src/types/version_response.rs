use serde::{Deserialize, Serialize};

/// Response of `GET /api/version`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionResponse {
    /// The server's version string.
    pub version: String,
}
