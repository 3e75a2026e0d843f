//! Logging facilities for Horizon TreeGrid.
//!
//! Horizon TreeGrid uses the `tracing` crate for instrumentation and never
//! installs a subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_treegrid=debug")
//!     .init();
//! ```
//!
//! Every subsystem logs under one of the [`targets`] below, so a directive such
//! as `horizon_treegrid::filter=trace` isolates rule evaluation.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_treegrid_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_treegrid_core::signal";
    /// Row storage target.
    pub const STORE: &str = "horizon_treegrid::store";
    /// Grouping and tree structure target.
    pub const PROJECTION: &str = "horizon_treegrid::projection";
    /// Rule matching target.
    pub const MATCH: &str = "horizon_treegrid::matching";
    /// Filter intersection and visibility target.
    pub const FILTER: &str = "horizon_treegrid::filter";
    /// Live search highlight target.
    pub const HIGHLIGHT: &str = "horizon_treegrid::highlight";
    /// View state persistence target.
    pub const STATE: &str = "horizon_treegrid::state";
}

/// Span names used for structural operations.
pub mod span_names {
    /// Group-by transition span.
    pub const GROUP_BY: &str = "horizon_treegrid::group_by";
    /// Ungroup transition span.
    pub const UNGROUP: &str = "horizon_treegrid::ungroup";
    /// Filter recompute span.
    pub const COMPUTE_VISIBLE: &str = "horizon_treegrid::compute_visible";
    /// Highlight recompute span.
    pub const HIGHLIGHT_RECOMPUTE: &str = "horizon_treegrid::highlight_recompute";
}
