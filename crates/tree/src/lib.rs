//! # Drilldown Tree
//!
//! Hierarchical drill-down over category/topic datasets.
//!
//! ## Features
//!
//! - **Tree building** - nested-object and flat dot-path backend shapes into one tree
//! - **Navigation** - committed drill-down path with all-or-nothing descends
//! - **Breadcrumbs** - display trail for the current path, tolerant of stale paths
//! - **Chart series** - `(label, value)` pairs for the selected branch
//! - **Record paging** - page through the record ids aggregated under a node
//!
//! ## Architecture
//!
//! ```text
//! Backend response (serde_json::Value)
//!     │
//!     ├──> TreeBuilder (profile-driven field names)
//!     │      ├─ Nested: recurse over non-reserved keys
//!     │      └─ Flat: sort dot-path keys by depth, attach to parents
//!     │
//!     ├──> Tree (immutable, shared via Arc)
//!     │
//!     └──> PathNavigator (owns the Path)
//!            ├─ descend / truncate
//!            ├─ breadcrumbs
//!            ├─ series
//!            └─ record pages
//! ```

mod breadcrumb;
mod builder;
mod error;
mod navigate;
mod profile;
mod records;
mod series;
mod types;

pub use breadcrumb::breadcrumbs;
pub use builder::{TreeBuilder, TreeSource};
pub use error::{NavigationError, Result, TreeError};
pub use navigate::PathNavigator;
pub use profile::{FlatFields, NestedKeys, TreeProfile};
pub use records::{page_records, RecordPage};
pub use series::{project, SeriesPoint};
pub use types::{Node, Path, Tree};
