//! Document snapshots for persistence.
//!
//! JSON is the interchange form (what the host's persistence layer stores
//! under its key); MessagePack is the compact form for local caching.

use crate::id::ShapeId;
use crate::model::{SCHEMA_VERSION, WindowShape};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Oldest schema version this build can read. Version 1 predates the
/// `opener` prop, which deserializes to `None`.
pub const MIN_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot encode: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("snapshot decode: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("unsupported snapshot schema version {found} (supported {min}..={max})")]
    UnsupportedVersion { found: u32, min: u32, max: u32 },
}

/// A serializable capture of the canvas document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub schema_version: u32,
    /// Shapes in paint order, back to front.
    pub shapes: Vec<WindowShape>,
    #[serde(default)]
    pub selection: Vec<ShapeId>,
}

impl DocumentSnapshot {
    pub fn new(shapes: Vec<WindowShape>, selection: Vec<ShapeId>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            shapes,
            selection,
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.check_version()
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = rmp_serde::from_slice(bytes)?;
        snapshot.check_version()
    }

    fn check_version(self) -> Result<Self, SnapshotError> {
        if (MIN_SCHEMA_VERSION..=SCHEMA_VERSION).contains(&self.schema_version) {
            Ok(self)
        } else {
            Err(SnapshotError::UnsupportedVersion {
                found: self.schema_version,
                min: MIN_SCHEMA_VERSION,
                max: SCHEMA_VERSION,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShapeDescriptor;
    use pretty_assertions::assert_eq;

    fn sample() -> DocumentSnapshot {
        let shape = ShapeDescriptor::at(100.0, 100.0)
            .with_url("https://a.test")
            .into_shape(ShapeId::intern("shape:snap"))
            .unwrap();
        DocumentSnapshot::new(vec![shape], vec![ShapeId::intern("shape:snap")])
    }

    #[test]
    fn msgpack_preserves_document() {
        let snap = sample();
        let bytes = snap.to_msgpack().unwrap();
        assert_eq!(DocumentSnapshot::from_msgpack(&bytes).unwrap(), snap);
    }

    #[test]
    fn reads_version_one_without_opener() {
        let json = r#"{
            "schemaVersion": 1,
            "shapes": [{
                "id": "shape:legacy",
                "x": 1.0, "y": 2.0,
                "props": { "w": 300.0, "h": 200.0, "url": "https://legacy.test" }
            }]
        }"#;
        let snap = DocumentSnapshot::from_json(json).unwrap();
        let props = &snap.shapes[0].props;
        assert_eq!(props.opener, None);
        assert_eq!(props.title, "");
        assert!(!props.is_minimized);
        assert!(snap.selection.is_empty());
    }

    #[test]
    fn rejects_future_versions() {
        let mut snap = sample();
        snap.schema_version = SCHEMA_VERSION + 1;
        let json = serde_json::to_string(&snap).unwrap();
        assert!(matches!(
            DocumentSnapshot::from_json(&json),
            Err(SnapshotError::UnsupportedVersion { .. })
        ));
    }
}
