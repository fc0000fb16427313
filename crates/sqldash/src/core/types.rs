use serde::{Deserialize, Serialize};

pub type DbRow = std::collections::HashMap<String, serde_json::Value>;

/// Success body served by `/api/query` for both GET and POST.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub sql: String,
    pub columns: Vec<String>,
    pub rows: Vec<DbRow>,
    #[serde(default)]
    pub summary: Summary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub avg_memory: Option<f64>,
    #[serde(default)]
    pub avg_cpu: Option<f64>,
    #[serde(default)]
    pub count: Option<u64>,
}

/// Non-2xx body. `error` may be missing when the service is fronted by a
/// proxy that rewrites error pages.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Text shown for one table or CSV cell. Missing and null fields render
/// as the empty string.
pub fn cell_text(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
