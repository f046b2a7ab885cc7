//! myoldtimer-store: key-value persistence and the store handle for maintenance records.

pub mod backend;
pub mod error;
pub mod file;
pub mod garage;
pub mod keys;
pub mod memory;

pub use backend::{BoxFuture, KeyValueStore};
pub use error::{GarageError, GarageResult, StoreError, StoreResult};
pub use file::JsonFileStore;
pub use garage::{Garage, Loaded, MaintenanceSnapshot, MigrationReport, Saved};
pub use memory::MemoryStore;
