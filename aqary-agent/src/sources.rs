//! Citation extraction from grounded responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// A web page the service consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Source {
    pub uri: String,
    /// Page title, empty when the service gave none
    pub title: String,
}

/// Collect `(uri, title)` pairs from the first candidate's grounding chunks.
///
/// Chunks without a `web.uri` are dropped. Missing metadata yields an empty list.
pub fn extract_sources(raw: &Value) -> Vec<Source> {
    let Some(chunks) = raw
        .pointer("/candidates/0/groundingMetadata/groundingChunks")
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    chunks
        .iter()
        .filter_map(|chunk| {
            let web = chunk.get("web")?;
            let uri = web.get("uri")?.as_str()?;
            let title = web.get("title").and_then(Value::as_str).unwrap_or_default();
            Some(Source {
                uri: uri.to_string(),
                title: title.to_string(),
            })
        })
        .collect()
}
