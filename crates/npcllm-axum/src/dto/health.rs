use serde::{Deserialize, Serialize};

/// `GET /health` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthBody {
    pub ok: bool,
    pub model_path: String,
}
