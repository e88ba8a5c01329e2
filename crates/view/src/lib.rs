//! kpanel view: the other-workloads table model.
//!
//! - `builder`: pure aggregation of workload snapshots into rows
//! - `table`: text projection of rows (pods ratio, age, columns)
//! - `view`: controller wiring stores, creators and selection together

#![forbid(unsafe_code)]

pub mod builder;
pub mod table;
pub mod view;

pub use builder::{build_rows, filter_by_name, is_standalone, matches_name, Aggregation, AggregationInput};
pub use table::{columns, pods_text, render_age, ColumnKind, ColumnSpec, PodsStatus, TableRow};
pub use view::{LoadReport, OtherWorkloadsView, ViewProps};
