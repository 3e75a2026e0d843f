//! Flat row storage.
//!
//! [`RowStore`] owns row identity and the ordered column schema. It knows
//! nothing about grouping or visibility; [`TreeProjection`] wraps a store and
//! keeps its presented hierarchy in step with it.
//!
//! Column 0 is the identity column: its value is always the row id.
//!
//! [`TreeProjection`]: crate::projection::TreeProjection

use std::collections::HashMap;
use std::fmt;

use horizon_treegrid_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeGridError};
use crate::value::CellValue;

/// Stable identity of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RowId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// One data record with a value for every declared column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: RowId,
    values: Vec<CellValue>,
}

impl Row {
    fn new(id: RowId, columns: &[String], mut attrs: HashMap<String, CellValue>) -> Self {
        let values = columns
            .iter()
            .enumerate()
            .map(|(index, name)| {
                if index == 0 {
                    i64::try_from(id.0)
                        .map_or_else(|_| CellValue::Text(id.to_string()), CellValue::Integer)
                } else {
                    attrs.remove(name).unwrap_or_default()
                }
            })
            .collect();
        Self { id, values }
    }

    /// The row's identity.
    pub fn id(&self) -> RowId {
        self.id
    }

    /// The value at a column position.
    pub fn value(&self, column: usize) -> Option<&CellValue> {
        self.values.get(column)
    }

    /// The display text at a column position, empty when out of range.
    pub fn text(&self, column: usize) -> String {
        self.values
            .get(column)
            .map(CellValue::display_text)
            .unwrap_or_default()
    }

    /// All values, in schema order.
    pub fn values(&self) -> &[CellValue] {
        &self.values
    }
}

/// The flat collection of rows plus the ordered column schema.
#[derive(Debug, Clone, Default)]
pub struct RowStore {
    columns: Vec<String>,
    rows: HashMap<RowId, Row>,
    order: Vec<RowId>,
}

impl RowStore {
    /// Create an empty store with the given schema.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = Self::default();
        store.set_columns(columns)?;
        Ok(store)
    }

    /// Insert rows, filling any missing column with an empty value.
    ///
    /// An id that already exists is overwritten in place and keeps its
    /// position. Attributes naming columns outside the schema are ignored.
    /// Returns the ids that were not present before.
    pub fn add_rows<I>(&mut self, rows: I) -> Vec<RowId>
    where
        I: IntoIterator<Item = (RowId, HashMap<String, CellValue>)>,
    {
        let mut inserted = Vec::new();
        for (id, attrs) in rows {
            let row = Row::new(id, &self.columns, attrs);
            if self.rows.insert(id, row).is_none() {
                self.order.push(id);
                inserted.push(id);
            } else {
                tracing::debug!(target: targets::STORE, %id, "overwrote existing row");
            }
        }
        tracing::debug!(
            target: targets::STORE,
            inserted = inserted.len(),
            total = self.order.len(),
            "rows added"
        );
        inserted
    }

    /// Replace the column schema.
    ///
    /// Values are carried over by column name; columns new to the schema start
    /// empty. Names must be unique.
    pub fn set_columns<I, S>(&mut self, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        for (index, name) in columns.iter().enumerate() {
            if columns[..index].contains(name) {
                return Err(TreeGridError::invariant_violation(format!(
                    "duplicate column name '{name}'"
                )));
            }
        }

        let old_columns = std::mem::replace(&mut self.columns, columns);
        for row in self.rows.values_mut() {
            let attrs: HashMap<String, CellValue> = old_columns
                .iter()
                .cloned()
                .zip(std::mem::take(&mut row.values))
                .collect();
            *row = Row::new(row.id, &self.columns, attrs);
        }
        tracing::debug!(target: targets::STORE, columns = ?self.columns, "column schema replaced");
        Ok(())
    }

    /// The ordered column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| TreeGridError::unknown_column(name))
    }

    /// Name of the column at a position.
    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    /// Look up a row.
    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.rows.get(&id)
    }

    /// Returns `true` if the id is stored.
    pub fn contains(&self, id: RowId) -> bool {
        self.rows.contains_key(&id)
    }

    /// All rows in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &Row> {
        self.order.iter().filter_map(|id| self.rows.get(id))
    }

    /// All ids in insertion order.
    pub fn ids(&self) -> &[RowId] {
        &self.order
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Edit one value in place.
    ///
    /// Column 0 holds the row id and cannot be edited.
    pub fn set_value(&mut self, id: RowId, column: &str, value: CellValue) -> Result<()> {
        let index = self.column_index(column)?;
        if index == 0 {
            return Err(TreeGridError::invariant_violation(
                "the identity column cannot be edited",
            ));
        }
        let row = self
            .rows
            .get_mut(&id)
            .ok_or_else(|| TreeGridError::unknown_row(id.0))?;
        row.values[index] = value;
        tracing::trace!(target: targets::STORE, %id, column, "value edited");
        Ok(())
    }

    /// Remove rows, returning the ids that were actually present.
    pub fn remove_rows<I>(&mut self, ids: I) -> Vec<RowId>
    where
        I: IntoIterator<Item = RowId>,
    {
        let removed: Vec<RowId> = ids
            .into_iter()
            .filter(|id| self.rows.remove(id).is_some())
            .collect();
        if !removed.is_empty() {
            self.order.retain(|id| self.rows.contains_key(id));
        }
        tracing::debug!(target: targets::STORE, removed = removed.len(), "rows removed");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, CellValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
            .collect()
    }

    fn create_test_store() -> RowStore {
        let mut store = RowStore::new(["ID", "Name", "City"]).unwrap();
        store.add_rows([
            (RowId(1), attrs(&[("Name", "Alice"), ("City", "NY")])),
            (RowId(2), attrs(&[("Name", "Bob")])),
        ]);
        store
    }

    #[test]
    fn test_missing_columns_filled_empty() {
        let store = create_test_store();
        let bob = store.get(RowId(2)).unwrap();
        assert_eq!(bob.values().len(), 3);
        assert_eq!(bob.value(2), Some(&CellValue::Empty));
        assert_eq!(bob.value(0), Some(&CellValue::Integer(2)));
    }

    #[test]
    fn test_identity_column_holds_full_id_range() {
        let mut store = create_test_store();
        store.add_rows([(RowId(u64::MAX), attrs(&[("Name", "Max")]))]);
        let row = store.get(RowId(u64::MAX)).unwrap();
        assert_eq!(row.text(0), u64::MAX.to_string());
        assert_eq!(store.get(RowId(2)).unwrap().value(0), Some(&CellValue::Integer(2)));
    }

    #[test]
    fn test_duplicate_id_overwrites_in_place() {
        let mut store = create_test_store();
        let inserted = store.add_rows([(RowId(1), attrs(&[("Name", "Alicia")]))]);

        assert!(inserted.is_empty());
        assert_eq!(store.ids(), &[RowId(1), RowId(2)]);
        assert_eq!(store.get(RowId(1)).unwrap().text(1), "Alicia");
        assert_eq!(store.get(RowId(1)).unwrap().text(2), "");
    }

    #[test]
    fn test_all_in_insertion_order() {
        let mut store = create_test_store();
        store.add_rows([(RowId(0), attrs(&[("Name", "Zed")]))]);
        let names: Vec<String> = store.all().map(|row| row.text(1)).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Zed"]);
    }

    #[test]
    fn test_set_columns_carries_values_by_name() {
        let mut store = create_test_store();
        store.set_columns(["Key", "City", "Age"]).unwrap();

        let alice = store.get(RowId(1)).unwrap();
        assert_eq!(alice.text(0), "1");
        assert_eq!(alice.text(1), "NY");
        assert_eq!(alice.value(2), Some(&CellValue::Empty));
    }

    #[test]
    fn test_set_columns_rejects_duplicates() {
        let mut store = create_test_store();
        assert!(store.set_columns(["ID", "Name", "Name"]).is_err());
        assert_eq!(store.columns(), &["ID", "Name", "City"]);
    }

    #[test]
    fn test_set_value() {
        let mut store = create_test_store();
        store.set_value(RowId(2), "City", "LA".into()).unwrap();
        assert_eq!(store.get(RowId(2)).unwrap().text(2), "LA");

        assert!(matches!(
            store.set_value(RowId(9), "City", "LA".into()),
            Err(TreeGridError::UnknownRow { id: 9 })
        ));
        assert!(matches!(
            store.set_value(RowId(1), "Age", 3.into()),
            Err(TreeGridError::UnknownColumn { .. })
        ));
        assert!(store.set_value(RowId(1), "ID", 5.into()).is_err());
    }

    #[test]
    fn test_remove_rows() {
        let mut store = create_test_store();
        let removed = store.remove_rows([RowId(1), RowId(42)]);
        assert_eq!(removed, vec![RowId(1)]);
        assert_eq!(store.ids(), &[RowId(2)]);
        assert!(!store.contains(RowId(1)));
    }

    #[test]
    fn test_column_lookup() {
        let store = create_test_store();
        assert_eq!(store.column_index("City").unwrap(), 2);
        assert_eq!(store.column_name(1), Some("Name"));
        assert!(store.column_index("Nope").is_err());
    }
}
