//! Patch operations sent with `Content-Type: application/json-patch+json`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Media type for patch request bodies.
pub const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Insert,
    Delete,
    Replace,
    Move,
}

/// One operation in a patch document.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    pub value: Value,
}

impl PatchOperation {
    /// `replace` of the value at `path`.
    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: value.into(),
        }
    }

    /// Replaces `/status`; used to cancel appointments and free slots.
    pub fn set_status(status: &str) -> Self {
        Self::replace("/status", status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialises_as_patch_document() {
        let patch = vec![PatchOperation::set_status("cancelled")];
        let value = serde_json::to_value(&patch).expect("serialise");
        assert_eq!(
            value,
            json!([{"op": "replace", "path": "/status", "value": "cancelled"}])
        );
    }
}
