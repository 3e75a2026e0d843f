//! Prelude module for Horizon TreeGrid.
//!
//! ```ignore
//! use horizon_treegrid::prelude::*;
//! ```
//!
//! This provides access to:
//! - Row storage (`RowStore`, `RowId`, `CellValue`)
//! - The projection (`TreeProjection`, `NodeId`, `SortOrder`)
//! - Matching and filtering (`MatchRule`, `ConditionKind`, `FilterSet`)
//! - Highlighting (`HighlightIndex`, `LiveSearch`)

// ============================================================================
// Signals and Errors
// ============================================================================

pub use crate::error::{Result, TreeGridError};
pub use horizon_treegrid_core::{ConnectionId, Signal};

// ============================================================================
// Data
// ============================================================================

pub use crate::store::{Row, RowId, RowStore};
pub use crate::value::CellValue;

// ============================================================================
// Projection
// ============================================================================

pub use crate::projection::{GroupingState, NodeId, NodeKind, SortOrder, TreeProjection};

// ============================================================================
// Matching, Filtering, Highlighting
// ============================================================================

pub use crate::filter::{FilterSet, Visibility};
pub use crate::highlight::{HighlightIndex, LiveSearch, parse_search_terms};
pub use crate::matching::{ConditionKind, MatchEngine, MatchRule};

// ============================================================================
// Persistence and Export
// ============================================================================

pub use crate::export::export_cells;
pub use crate::state::{SearchOptions, ViewState};
