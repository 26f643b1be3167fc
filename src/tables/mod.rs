pub mod columns;
pub mod handle;
pub mod pushdown;
pub mod resource;
pub mod types;

pub use columns::{ColumnSource, ColumnSpec, ColumnType, RESOURCE_COLUMNS};
pub use handle::{LogSplit, LogTableHandle, ResourceSplit, ResourceTableHandle, Split, TableHandle};
pub use pushdown::{LimitApplication, Predicate, PredicateApplication};
pub use resource::{ResourceCatalog, ResourceTable, TableName};
pub use types::ColumnValue;
