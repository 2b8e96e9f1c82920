pub mod error;
pub mod fallback_store;
pub mod json_store;
pub mod sqlite_store;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use fallback_store::FallbackShiftStore;
pub use json_store::JsonFileShiftStore;
pub use sqlite_store::SqliteShiftStore;
pub use store::ShiftStore;
