//! Core systems for Horizon TreeGrid.
//!
//! This crate provides the foundational pieces shared by the grouping and
//! filtering engine in `horizon-treegrid`:
//!
//! - **Signal/Slot System**: Type-safe change notification between components
//! - **Error Types**: Errors raised by the notification layer
//! - **Logging**: `tracing` target names used across the workspace
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_treegrid_core::Signal;
//!
//! // A signal that reports how many filter rules are active
//! let count_changed = Signal::<usize>::new();
//!
//! let conn_id = count_changed.connect(|count| {
//!     println!("{} filters active", count);
//! });
//!
//! count_changed.emit(3);
//! count_changed.disconnect(conn_id);
//! ```

mod error;
pub mod logging;
pub mod signal;

pub use error::{Result, SignalError};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
