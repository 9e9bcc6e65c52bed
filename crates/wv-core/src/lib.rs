pub mod id;
pub mod model;
pub mod snapshot;
pub mod store;

pub use id::ShapeId;
pub use model::*;
pub use snapshot::{DocumentSnapshot, SnapshotError};
pub use store::{ShapeStore, StoreError};
