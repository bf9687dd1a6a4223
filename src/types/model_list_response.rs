use serde::{Deserialize, Serialize};

/// A locally available model, as reported by `GET /api/tags`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model name including its tag, e.g. `gemma3:latest`.
    pub name: String,

    /// Size on disk in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Content digest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    /// Last modification time as reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

/// Response of `GET /api/tags`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelListResponse {
    /// The models, in server order.
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}
