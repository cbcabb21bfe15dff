//! Data storage layer
//!
//! Provides the pieces the filter compiler needs from the outside world:
//! - `mysql` - Connection pool and catalog/reservation repositories
//! - `static_catalog` - In-memory field catalog loaded from JSON
//! - `filters` - Filter parsing and SQL generation
//! - `types` - Field catalog types shared by all backends
//! - `traits` - The `FieldCatalog` trait
//! - `error` - Unified error type for the data layer

pub mod error;
pub mod filters;
pub mod mysql;
pub mod static_catalog;
pub mod traits;
pub mod types;

pub use error::DataError;
pub use mysql::{MysqlFieldCatalog, MysqlService};
pub use static_catalog::StaticFieldCatalog;
pub use traits::FieldCatalog;
pub use types::{ColumnRef, FieldDescriptor, FieldRecord, FieldType, StorageKind};
