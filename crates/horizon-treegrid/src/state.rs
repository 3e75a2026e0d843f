//! View state persistence.
//!
//! [`ViewState`] snapshots the parts of a [`TreeProjection`] a user expects to
//! survive a restart: hidden columns, the active sort, and the grouping
//! column. Columns are stored by name so a saved state still applies after the
//! schema gains or reorders columns.
//!
//! States save to JSON or TOML. Writes go to a temporary file in the target
//! directory that is then renamed over the target, so a crash never leaves a
//! half-written file behind.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use horizon_treegrid_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeGridError};
use crate::matching::ConditionKind;
use crate::projection::{SortOrder, TreeProjection};

/// Default options for the search and filter inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Condition preselected for new rules.
    pub condition: ConditionKind,
    /// Whether new rules match case.
    pub case_sensitive: bool,
    /// Whether new rules are negated.
    pub negate: bool,
    /// Whether the live search filters rows instead of only highlighting them.
    pub apply_as_filter: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            condition: ConditionKind::Contains,
            case_sensitive: false,
            negate: false,
            apply_as_filter: false,
        }
    }
}

/// A persisted column sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    /// Column name.
    pub column: String,
    /// Direction.
    #[serde(default)]
    pub order: SortOrder,
}

/// Persisted presentation state of a tree grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    /// Header order as shown to the user. Reordering sections is up to the
    /// presentation layer; the projection keeps schema order.
    pub column_order: Vec<String>,
    /// Columns hidden by the user. The grouping column is listed only when it
    /// was hidden before grouping.
    pub hidden_columns: Vec<String>,
    /// The grouping column, if grouped.
    pub grouped_column: Option<String>,
    /// The active sort.
    pub sort: Option<SortState>,
    /// Search input defaults.
    pub search: SearchOptions,
}

impl ViewState {
    /// Snapshot a projection.
    pub fn capture(projection: &TreeProjection) -> Self {
        let store = projection.store();
        Self {
            column_order: store.columns().to_vec(),
            hidden_columns: projection
                .hidden_columns()
                .into_iter()
                .filter(|&column| projection.is_column_hidden_by_user(column))
                .filter_map(|column| store.column_name(column).map(str::to_owned))
                .collect(),
            grouped_column: projection.grouped_column_name().map(str::to_owned),
            sort: projection.sort().and_then(|spec| {
                store.column_name(spec.column).map(|column| SortState {
                    column: column.to_owned(),
                    order: spec.order,
                })
            }),
            search: SearchOptions::default(),
        }
    }

    /// Apply this state to a projection.
    ///
    /// Columns that no longer exist are skipped with a warning. The grouping is
    /// replayed last through [`TreeProjection::group_by_column`].
    pub fn restore(&self, projection: &mut TreeProjection) -> Result<()> {
        projection.ungroup_all();

        for column in projection.hidden_columns() {
            projection.show_column(column)?;
        }
        for name in &self.hidden_columns {
            match projection.store().column_index(name) {
                Ok(column) => {
                    projection.hide_column(column)?;
                }
                Err(_) => skip_missing(name, "hidden column"),
            }
        }

        if let Some(sort) = &self.sort {
            match projection.store().column_index(&sort.column) {
                Ok(column) => projection.sort_by_column(column, sort.order)?,
                Err(_) => skip_missing(&sort.column, "sort column"),
            }
        }

        if let Some(name) = &self.grouped_column {
            match projection.store().column_index(name) {
                Ok(column) if column != 0 => projection.group_by_column(column)?,
                _ => skip_missing(name, "grouping column"),
            }
        }

        tracing::debug!(target: targets::STATE, grouped = ?self.grouped_column, "view state restored");
        Ok(())
    }

    /// Save as pretty-printed JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TreeGridError::serialization("JSON", e))?;
        atomic_write(path.as_ref(), json.as_bytes())
    }

    /// Load from JSON.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_text(path.as_ref())?;
        serde_json::from_str(&content).map_err(|e| TreeGridError::serialization("JSON", e))
    }

    /// Save as TOML.
    pub fn save_toml(&self, path: impl AsRef<Path>) -> Result<()> {
        let toml_str =
            toml::to_string_pretty(self).map_err(|e| TreeGridError::serialization("TOML", e))?;
        atomic_write(path.as_ref(), toml_str.as_bytes())
    }

    /// Load from TOML.
    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_text(path.as_ref())?;
        toml::from_str(&content).map_err(|e| TreeGridError::serialization("TOML", e))
    }
}

fn skip_missing(name: &str, role: &str) {
    tracing::warn!(target: targets::STATE, column = name, role, "column not in schema, skipping");
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| TreeGridError::io(path, e))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "state".to_string());
    parent.join(format!(".{}.tmp.{}", file_name, std::process::id()))
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = temp_path_for(path);
    let result = write_synced(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, path));
    if let Err(e) = result {
        // Best effort; the temp file may not exist.
        let _ = fs::remove_file(&temp_path);
        return Err(TreeGridError::io(path, e));
    }
    tracing::debug!(target: targets::STATE, path = %path.display(), "view state saved");
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    writer.write_all(bytes)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}
