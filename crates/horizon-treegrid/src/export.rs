//! Tab-separated export of selected cells.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{Result, TreeGridError};
use crate::highlight::Cell;
use crate::projection::TreeProjection;

/// Render cells as tab-separated text, one line per row.
///
/// Rows follow the projection's depth-first order and columns their schema
/// position. Every line has a field for each column that appears in any
/// selected cell, left empty where that row has no selected cell. Fields
/// holding a tab, newline, or double quote are quoted with embedded quotes
/// doubled. Cells whose node is no longer in the projection are ignored.
pub fn export_cells<'a, I>(projection: &TreeProjection, cells: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Cell>,
{
    let order: HashMap<_, usize> = projection
        .get_all_nodes()
        .into_iter()
        .enumerate()
        .map(|(index, node)| (node, index))
        .collect();

    let mut columns = BTreeSet::new();
    let mut rows: BTreeMap<usize, BTreeMap<usize, String>> = BTreeMap::new();
    for &(node, column) in cells {
        let Some(&position) = order.get(&node) else {
            continue;
        };
        columns.insert(column);
        rows.entry(position)
            .or_default()
            .insert(column, projection.cell_text(node, column));
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in rows.values() {
        let record = columns
            .iter()
            .map(|column| row.get(column).map(String::as_str).unwrap_or(""));
        writer
            .write_record(record)
            .map_err(|e| TreeGridError::serialization("TSV", e))?;
    }

    writer
        .flush()
        .map_err(|e| TreeGridError::serialization("TSV", e))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| TreeGridError::serialization("TSV", e))?;

    let mut text = String::from_utf8_lossy(&bytes).into_owned();
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}
