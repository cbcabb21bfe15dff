//! Dynamic filter compiler
//!
//! Turns a JSON nested-array filter into a MySQL WHERE fragment, the LEFT
//! OUTER JOINs it needs for custom fields, and the ordered bound parameters.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chrono_tz::Tz;
//! use eventadmin_filter::data::StaticFieldCatalog;
//! use eventadmin_filter::data::filters::{CustomFieldTable, FilterService, parse_filter_json};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = StaticFieldCatalog::load("catalog.json".as_ref())?;
//! let service = FilterService::new(Arc::new(catalog), CustomFieldTable::default(), Tz::UTC);
//!
//! let wire = parse_filter_json(r#"[["age", ">=", 20], "and", ["memo", "contains", "vip"]]"#)?;
//! let query = service.compile(7, &wire).await?;
//! let sql = query.apply("COUNT(*)", "reservations", "reservations.project_id = ?");
//! # let _ = sql;
//! # Ok(())
//! # }
//! ```

mod builder;
mod error;
mod operators;
mod parser;
mod patterns;
mod service;
mod types;

pub use builder::{CompileOptions, CustomFieldTable, FieldMap, FilterCompiler, field_map};
pub use error::FilterError;
pub use parser::{collect_field_codes, parse_filter, parse_filter_json, strip_qualifier};
pub use patterns::RegexClass;
pub use service::FilterService;
pub use types::{
    ALWAYS_TRUE, CompiledQuery, Condition, Conjunction, FilterExpr, Group, Operand, Operator,
    SqlParams, SqlValue,
};
