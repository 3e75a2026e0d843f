//! Horizon TreeGrid - grouping, filtering, and live-search highlighting for
//! tree-table views.
//!
//! The engine behind a groupable tree table, without any rendering:
//!
//! - [`RowStore`](store::RowStore) holds rows and the column schema
//! - [`TreeProjection`](projection::TreeProjection) presents rows flat or
//!   grouped by one column
//! - [`MatchEngine`](matching::MatchEngine) evaluates a [`MatchRule`](matching::MatchRule)
//!   at the right tree depth
//! - [`FilterSet`](filter::FilterSet) intersects rules into a visible set
//! - [`HighlightIndex`](highlight::HighlightIndex) marks live-search matches
//! - [`ViewState`](state::ViewState) persists hidden columns, sort, and grouping
//!
//! All operations are synchronous and meant to run on the UI thread. Change
//! notifications use the signals from `horizon-treegrid-core`.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use horizon_treegrid::prelude::*;
//!
//! let mut store = RowStore::new(["ID", "Name", "City"]).unwrap();
//! for (id, name, city) in [(1, "Alice", "NY"), (2, "Bob", "NY"), (3, "Carl", "LA")] {
//!     store.add_rows([(
//!         RowId(id),
//!         HashMap::from([
//!             ("Name".to_string(), CellValue::from(name)),
//!             ("City".to_string(), CellValue::from(city)),
//!         ]),
//!     )]);
//! }
//!
//! let mut projection = TreeProjection::new(store);
//! projection.group_by_column_name("City").unwrap();
//!
//! let mut filters = FilterSet::new();
//! filters.add(MatchRule::new("Name", ConditionKind::Contains, "a"));
//! let visibility = filters.apply(&mut projection);
//! assert_eq!(visibility.rows.len(), 2);
//! ```

pub use horizon_treegrid_core::{ConnectionGuard, ConnectionId, Signal, logging};

pub mod error;
pub mod export;
pub mod filter;
pub mod highlight;
pub mod matching;
pub mod prelude;
pub mod projection;
pub mod state;
pub mod store;
pub mod value;

pub use error::{Result, TreeGridError};
