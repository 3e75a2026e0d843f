//! The presented hierarchy over a [`RowStore`].
//!
//! [`TreeProjection`] is either flat (every row is a top-level node) or grouped
//! by exactly one column, in which case every row sits one level below a
//! synthetic group node keyed by that column's display text. Rows whose value
//! is empty or zero land in the [`CATCH_ALL_GROUP`] bucket.
//!
//! Nodes live in a [`SlotMap`] arena and are addressed by [`NodeId`], so node
//! sets used by filtering and highlighting are plain value sets.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use horizon_treegrid::prelude::*;
//!
//! let mut store = RowStore::new(["ID", "Name", "City"]).unwrap();
//! store.add_rows([
//!     (RowId(1), HashMap::from([("City".to_string(), CellValue::from("NY"))])),
//!     (RowId(2), HashMap::from([("City".to_string(), CellValue::from("LA"))])),
//! ]);
//!
//! let mut projection = TreeProjection::new(store);
//! projection.group_by_column(2).unwrap();
//! assert_eq!(projection.get_all_items_at_child_level(0).len(), 2);
//!
//! projection.ungroup_all();
//! assert_eq!(projection.grouped_column_name(), None);
//! ```

use std::collections::{BTreeSet, HashMap};

use horizon_treegrid_core::Signal;
use horizon_treegrid_core::logging::{span_names, targets};
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, TreeGridError};
use crate::store::{Row, RowId, RowStore};
use crate::value::{CellValue, compare_values};

/// Group key for rows with an empty grouping value.
pub const CATCH_ALL_GROUP: &str = "_others";

new_key_type! {
    /// Identifier of a node in a [`TreeProjection`].
    pub struct NodeId;
}

/// What a projection node stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A node wrapping one stored row.
    Row(RowId),
    /// A synthetic group node.
    Group {
        /// The shared display value of the group's rows.
        key: String,
    },
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// An active column sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    /// Column position.
    pub column: usize,
    /// Direction.
    pub order: SortOrder,
}

/// Whether the projection is grouped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupingState {
    /// Every row is a top-level node.
    #[default]
    Flat,
    /// Rows sit under group nodes keyed by this column.
    Grouped {
        /// Column position of the grouping column.
        column: usize,
    },
}

/// Signals emitted by a [`TreeProjection`] after structural changes.
#[derive(Default)]
pub struct ProjectionSignals {
    /// Emitted after grouping, with the grouped column's name.
    pub grouped_by_column: Signal<String>,
    /// Emitted after the projection returns to flat.
    pub ungrouped_all: Signal<()>,
    /// Emitted after rows were added, removed, or rebuilt from the store.
    pub rows_rebuilt: Signal<()>,
    /// Emitted after the column schema was replaced, with the new column count.
    pub columns_changed: Signal<usize>,
}

struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    hidden: bool,
    expanded: bool,
}

impl Node {
    fn row(id: RowId) -> Self {
        Self {
            kind: NodeKind::Row(id),
            parent: None,
            children: Vec::new(),
            hidden: false,
            expanded: false,
        }
    }

    fn group(key: String) -> Self {
        Self {
            kind: NodeKind::Group { key },
            parent: None,
            children: Vec::new(),
            hidden: false,
            expanded: true,
        }
    }
}

/// A flat or single-level grouped view of a [`RowStore`].
pub struct TreeProjection {
    store: RowStore,
    nodes: SlotMap<NodeId, Node>,
    top_level: Vec<NodeId>,
    row_nodes: HashMap<RowId, NodeId>,
    grouping: GroupingState,
    /// Top-level row order captured when grouping, restored on ungroup.
    pre_group_order: Vec<NodeId>,
    hidden_columns: BTreeSet<usize>,
    /// Whether the grouping column was already hidden when grouping started.
    group_column_was_hidden: bool,
    sort: Option<SortSpec>,
    signals: ProjectionSignals,
}

impl TreeProjection {
    /// Create a flat projection over a store.
    pub fn new(store: RowStore) -> Self {
        let mut projection = Self {
            store,
            nodes: SlotMap::with_key(),
            top_level: Vec::new(),
            row_nodes: HashMap::new(),
            grouping: GroupingState::Flat,
            pre_group_order: Vec::new(),
            hidden_columns: BTreeSet::new(),
            group_column_was_hidden: false,
            sort: None,
            signals: ProjectionSignals::default(),
        };
        projection.build_flat();
        projection
    }

    /// The underlying store.
    pub fn store(&self) -> &RowStore {
        &self.store
    }

    /// Signals for structural changes.
    pub fn signals(&self) -> &ProjectionSignals {
        &self.signals
    }

    // =========================================================================
    // Store passthrough
    // =========================================================================

    /// Add rows to the store and place new ones in the projection.
    ///
    /// While grouped, new rows join the group matching their key, creating it
    /// at the end if needed. Overwritten rows keep their current node.
    pub fn add_rows<I>(&mut self, rows: I) -> Vec<RowId>
    where
        I: IntoIterator<Item = (RowId, HashMap<String, CellValue>)>,
    {
        let inserted = self.store.add_rows(rows);
        for &id in &inserted {
            let node = self.nodes.insert(Node::row(id));
            self.row_nodes.insert(id, node);
            match self.grouping {
                GroupingState::Flat => self.top_level.push(node),
                GroupingState::Grouped { column } => {
                    let key = self.group_key_for(id, column);
                    let group = self.find_or_create_group(key);
                    self.attach(group, node);
                }
            }
        }
        if !inserted.is_empty() {
            self.apply_sort();
            self.signals.rows_rebuilt.emit(());
        }
        inserted
    }

    /// Remove rows from the store and the projection.
    ///
    /// Groups left without children are deleted.
    pub fn remove_rows<I>(&mut self, ids: I) -> Vec<RowId>
    where
        I: IntoIterator<Item = RowId>,
    {
        let removed = self.store.remove_rows(ids);
        for id in &removed {
            let Some(node_id) = self.row_nodes.remove(id) else {
                continue;
            };
            let Some(node) = self.nodes.remove(node_id) else {
                continue;
            };
            self.pre_group_order.retain(|&n| n != node_id);
            match node.parent {
                None => self.top_level.retain(|&n| n != node_id),
                Some(parent_id) => {
                    let now_empty = self.nodes.get_mut(parent_id).is_some_and(|parent| {
                        parent.children.retain(|&n| n != node_id);
                        parent.children.is_empty()
                    });
                    if now_empty {
                        self.nodes.remove(parent_id);
                        self.top_level.retain(|&n| n != parent_id);
                    }
                }
            }
        }
        if !removed.is_empty() {
            self.signals.rows_rebuilt.emit(());
        }
        removed
    }

    /// Edit one value in place. The row keeps its position in the projection.
    pub fn set_value(&mut self, id: RowId, column: &str, value: CellValue) -> Result<()> {
        self.store.set_value(id, column, value)
    }

    /// Replace the column schema and rebuild.
    ///
    /// Hidden columns, the sort, and the grouping column are carried over by
    /// name when they still exist.
    pub fn set_columns<I, S>(&mut self, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let grouped = self.grouped_column_name().map(str::to_owned);
        let hidden: Vec<String> = self
            .hidden_columns
            .iter()
            .filter(|&&column| self.is_column_hidden_by_user(column))
            .filter_map(|&column| self.store.column_name(column).map(str::to_owned))
            .collect();
        let sort = self.sort.and_then(|spec| {
            self.store
                .column_name(spec.column)
                .map(|name| (name.to_owned(), spec.order))
        });

        self.store.set_columns(columns)?;

        self.grouping = GroupingState::Flat;
        self.group_column_was_hidden = false;
        self.hidden_columns = hidden
            .iter()
            .filter_map(|name| self.store.column_index(name).ok())
            .filter(|&column| column != 0)
            .collect();
        self.sort = sort.and_then(|(name, order)| {
            self.store
                .column_index(&name)
                .ok()
                .map(|column| SortSpec { column, order })
        });
        self.rebuild();

        if let Some(name) = grouped {
            match self.store.column_index(&name) {
                Ok(column) if column != 0 => self.group_by_column(column)?,
                _ => tracing::warn!(
                    target: targets::PROJECTION,
                    column = %name,
                    "grouping column no longer in schema, staying flat"
                ),
            }
        }

        self.signals.columns_changed.emit(self.store.column_count());
        Ok(())
    }

    // =========================================================================
    // Grouping
    // =========================================================================

    /// Group rows by the values of a column.
    ///
    /// Any existing grouping is undone first. Groups appear in the order their
    /// keys first occur; the grouped column is hidden while grouped. Node
    /// visibility is kept.
    pub fn group_by_column(&mut self, column: usize) -> Result<()> {
        let name = self
            .store
            .column_name(column)
            .ok_or_else(|| TreeGridError::unknown_column(column.to_string()))?
            .to_owned();
        if column == 0 {
            return Err(TreeGridError::invalid_group_column(name));
        }

        let _span = tracing::debug_span!(
            target: targets::PROJECTION,
            "group_by",
            operation = span_names::GROUP_BY,
            column = %name
        )
        .entered();

        self.ungroup_all();

        self.pre_group_order = self.top_level.clone();
        let rows = std::mem::take(&mut self.top_level);
        let mut groups: Vec<NodeId> = Vec::new();
        let mut group_by_key: HashMap<String, NodeId> = HashMap::new();
        for node_id in rows {
            let Some(NodeKind::Row(row_id)) = self.nodes.get(node_id).map(|n| n.kind.clone())
            else {
                continue;
            };
            let key = self.group_key_for(row_id, column);
            let group = *group_by_key.entry(key.clone()).or_insert_with(|| {
                let group = self.nodes.insert(Node::group(key));
                groups.push(group);
                group
            });
            self.attach(group, node_id);
        }
        self.top_level = groups;

        self.grouping = GroupingState::Grouped { column };
        self.group_column_was_hidden = !self.hidden_columns.insert(column);
        self.apply_sort();

        tracing::debug!(
            target: targets::PROJECTION,
            groups = self.top_level.len(),
            rows = self.row_nodes.len(),
            "grouped"
        );
        self.signals.grouped_by_column.emit(name);
        Ok(())
    }

    /// Group rows by a column given by name.
    pub fn group_by_column_name(&mut self, name: &str) -> Result<()> {
        let column = self.store.column_index(name)?;
        self.group_by_column(column)
    }

    /// Return to the flat state. Does nothing when already flat.
    ///
    /// Rows return to the top-level order they had when grouping started, with
    /// rows added while grouped following in group order. If the row set
    /// changed during the transition the projection is rebuilt from the store.
    pub fn ungroup_all(&mut self) {
        let GroupingState::Grouped { column } = self.grouping else {
            return;
        };
        let _span = tracing::debug_span!(
            target: targets::PROJECTION,
            "ungroup",
            operation = span_names::UNGROUP
        )
        .entered();

        let before = self.row_ids_sorted();

        let groups = std::mem::take(&mut self.top_level);
        let mut rows: Vec<NodeId> = Vec::with_capacity(self.row_nodes.len());
        for group_id in groups {
            if let Some(group) = self.nodes.remove(group_id) {
                rows.extend(group.children);
            }
        }

        let position: HashMap<NodeId, usize> = self
            .pre_group_order
            .iter()
            .enumerate()
            .map(|(index, &node)| (node, index))
            .collect();
        rows.sort_by_key(|node| position.get(node).copied().unwrap_or(usize::MAX));
        for &node_id in &rows {
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.parent = None;
            }
        }
        self.top_level = rows;
        self.pre_group_order.clear();

        self.grouping = GroupingState::Flat;
        self.restore_group_column(column);

        let verified = self.verify_round_trip(&before);
        debug_assert!(verified.is_ok(), "ungroup changed the row set: {verified:?}");
        if let Err(err) = verified {
            tracing::warn!(
                target: targets::PROJECTION,
                error = %err,
                "ungroup broke the row set, rebuilding from store"
            );
            self.rebuild();
        } else {
            self.apply_sort();
        }

        tracing::debug!(target: targets::PROJECTION, rows = self.top_level.len(), "ungrouped");
        self.signals.ungrouped_all.emit(());
    }

    /// Check that the projection holds exactly the given rows.
    ///
    /// `expected` must be sorted. Also checks that the projection agrees with
    /// the store.
    pub fn verify_round_trip(&self, expected: &[RowId]) -> Result<()> {
        let actual = self.row_ids_sorted();
        if actual != expected {
            return Err(TreeGridError::invariant_violation(format!(
                "expected {} rows, projection holds {}",
                expected.len(),
                actual.len()
            )));
        }
        if actual.len() != self.store.len() {
            return Err(TreeGridError::invariant_violation(format!(
                "store holds {} rows, projection holds {}",
                self.store.len(),
                actual.len()
            )));
        }
        Ok(())
    }

    /// Rebuild a flat projection from the store in insertion order.
    ///
    /// Node visibility and expansion are reset.
    pub fn rebuild(&mut self) {
        if let GroupingState::Grouped { column } = self.grouping {
            self.restore_group_column(column);
        }
        self.grouping = GroupingState::Flat;
        self.pre_group_order.clear();
        self.build_flat();
        self.apply_sort();
        tracing::debug!(target: targets::PROJECTION, rows = self.top_level.len(), "rebuilt from store");
        self.signals.rows_rebuilt.emit(());
    }

    /// The current grouping state.
    pub fn grouping_state(&self) -> GroupingState {
        self.grouping
    }

    /// The grouping column position, if grouped.
    pub fn grouped_column(&self) -> Option<usize> {
        match self.grouping {
            GroupingState::Flat => None,
            GroupingState::Grouped { column } => Some(column),
        }
    }

    /// The grouping column name, if grouped.
    pub fn grouped_column_name(&self) -> Option<&str> {
        self.grouped_column()
            .and_then(|column| self.store.column_name(column))
    }

    /// Header text for a column.
    ///
    /// When grouped, column 0 reads `"<grouped column> / <column 0>"`.
    pub fn header_label(&self, column: usize) -> Option<String> {
        let name = self.store.column_name(column)?;
        match self.grouped_column_name() {
            Some(grouped) if column == 0 => Some(format!("{grouped} / {name}")),
            _ => Some(name.to_owned()),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Nodes at a child level.
    ///
    /// Level 0 is the top level (rows when flat, groups when grouped). Level 1
    /// is every row under a group, empty when flat.
    pub fn get_all_items_at_child_level(&self, level: usize) -> Vec<NodeId> {
        match level {
            0 => self.top_level.clone(),
            1 => self
                .top_level
                .iter()
                .flat_map(|&group| self.children(group).iter().copied())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Every node, depth-first with parents before children.
    pub fn get_all_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for &node in &self.top_level {
            out.push(node);
            out.extend_from_slice(self.children(node));
        }
        out
    }

    /// Every row node, depth-first.
    pub fn get_all_rows(&self) -> Vec<NodeId> {
        self.get_all_nodes()
            .into_iter()
            .filter(|&node| self.row_id(node).is_some())
            .collect()
    }

    /// Number of row nodes.
    pub fn row_count(&self) -> usize {
        self.row_nodes.len()
    }

    /// The kind of a node.
    pub fn node_kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node).map(|n| &n.kind)
    }

    /// The row wrapped by a row node.
    pub fn row_id(&self, node: NodeId) -> Option<RowId> {
        match self.node_kind(node)? {
            NodeKind::Row(id) => Some(*id),
            NodeKind::Group { .. } => None,
        }
    }

    /// The stored row behind a row node.
    pub fn row(&self, node: NodeId) -> Option<&Row> {
        self.row_id(node).and_then(|id| self.store.get(id))
    }

    /// The key of a group node.
    pub fn group_key(&self, node: NodeId) -> Option<&str> {
        match self.node_kind(node)? {
            NodeKind::Group { key } => Some(key),
            NodeKind::Row(_) => None,
        }
    }

    /// Returns `true` for group nodes.
    pub fn is_group(&self, node: NodeId) -> bool {
        self.group_key(node).is_some()
    }

    /// The node presenting a row.
    pub fn node_for_row(&self, id: RowId) -> Option<NodeId> {
        self.row_nodes.get(&id).copied()
    }

    /// The parent of a node.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// The children of a node.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Depth of a node: 0 at the top level, 1 under a group.
    pub fn child_level(&self, node: NodeId) -> usize {
        let mut level = 0;
        let mut current = self.parent(node);
        while let Some(parent) = current {
            level += 1;
            current = self.parent(parent);
        }
        level
    }

    /// The text a node shows in a column.
    ///
    /// Group nodes show their key in column 0 and in the grouped column.
    pub fn cell_text(&self, node: NodeId, column: usize) -> String {
        match self.node_kind(node) {
            Some(NodeKind::Row(id)) => self
                .store
                .get(*id)
                .map(|row| row.text(column))
                .unwrap_or_default(),
            Some(NodeKind::Group { key }) if column == 0 || Some(column) == self.grouped_column() => {
                key.clone()
            }
            _ => String::new(),
        }
    }

    /// The typed value a node holds in a column. Group nodes hold none.
    pub fn cell_value(&self, node: NodeId, column: usize) -> Option<&CellValue> {
        self.row(node).and_then(|row| row.value(column))
    }

    /// Minimum and maximum numeric value of a column at a child level.
    ///
    /// Returns `None` when no node at that level holds a number there.
    pub fn column_value_range(&self, column: usize, level: usize) -> Option<(f64, f64)> {
        self.get_all_items_at_child_level(level)
            .into_iter()
            .filter_map(|node| self.cell_value(node, column)?.as_number())
            .fold(None, |range, value| match range {
                None => Some((value, value)),
                Some((min, max)) => Some((min.min(value), max.max(value))),
            })
    }

    // =========================================================================
    // Node state
    // =========================================================================

    /// Returns `true` if the node itself is hidden.
    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.hidden)
    }

    /// Hide or show a single node.
    pub fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.hidden = hidden;
        }
    }

    /// Show every node.
    pub fn show_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.hidden = false;
        }
    }

    /// Returns `true` if a group node is expanded.
    pub fn is_expanded(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.expanded)
    }

    /// Expand or collapse a node.
    pub fn set_expanded(&mut self, node: NodeId, expanded: bool) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.expanded = expanded;
        }
    }

    /// Expand every group.
    pub fn expand_all(&mut self) {
        self.set_all_expanded(true);
    }

    /// Collapse every group.
    pub fn collapse_all(&mut self) {
        self.set_all_expanded(false);
    }

    fn set_all_expanded(&mut self, expanded: bool) {
        for node in self.nodes.values_mut() {
            if matches!(node.kind, NodeKind::Group { .. }) {
                node.expanded = expanded;
            }
        }
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Hide a column. Column 0 cannot be hidden.
    ///
    /// Returns whether the column is now hidden.
    pub fn hide_column(&mut self, column: usize) -> Result<bool> {
        self.check_column(column)?;
        if column == 0 {
            return Ok(false);
        }
        if self.grouped_column() == Some(column) {
            self.group_column_was_hidden = true;
        }
        self.hidden_columns.insert(column);
        Ok(true)
    }

    /// Show a column again.
    pub fn show_column(&mut self, column: usize) -> Result<()> {
        self.check_column(column)?;
        if self.grouped_column() == Some(column) {
            self.group_column_was_hidden = false;
        }
        self.hidden_columns.remove(&column);
        Ok(())
    }

    /// Returns `true` if the column is hidden.
    pub fn is_column_hidden(&self, column: usize) -> bool {
        self.hidden_columns.contains(&column)
    }

    /// Returns `true` if the column is hidden by choice rather than only
    /// because it is the grouping column.
    pub fn is_column_hidden_by_user(&self, column: usize) -> bool {
        self.hidden_columns.contains(&column)
            && (self.grouped_column() != Some(column) || self.group_column_was_hidden)
    }

    /// Positions of every shown column, in schema order.
    pub fn shown_columns(&self) -> Vec<usize> {
        (0..self.store.column_count())
            .filter(|column| !self.hidden_columns.contains(column))
            .collect()
    }

    /// Positions of every hidden column.
    pub fn hidden_columns(&self) -> Vec<usize> {
        self.hidden_columns.iter().copied().collect()
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    /// Sort rows by a column.
    ///
    /// Flat projections sort the top level; grouped ones sort within each
    /// group and keep the groups in first-occurrence order. The sort is kept
    /// and re-applied after structural changes.
    pub fn sort_by_column(&mut self, column: usize, order: SortOrder) -> Result<()> {
        self.check_column(column)?;
        self.sort = Some(SortSpec { column, order });
        self.apply_sort();
        Ok(())
    }

    /// Forget the active sort. Current order is kept.
    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    /// The active sort.
    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    fn apply_sort(&mut self) {
        let Some(SortSpec { column, order }) = self.sort else {
            return;
        };
        let compare = |a: &NodeId, b: &NodeId| {
            let empty = CellValue::Empty;
            let left = self.cell_value(*a, column).unwrap_or(&empty);
            let right = self.cell_value(*b, column).unwrap_or(&empty);
            let ordering = compare_values(left, right);
            // Empty values stay last in both directions.
            if order == SortOrder::Descending && !left.is_empty() && !right.is_empty() {
                ordering.reverse()
            } else {
                ordering
            }
        };

        match self.grouping {
            GroupingState::Flat => {
                let mut top_level = self.top_level.clone();
                top_level.sort_by(&compare);
                self.top_level = top_level;
            }
            GroupingState::Grouped { .. } => {
                let sorted: Vec<(NodeId, Vec<NodeId>)> = self
                    .top_level
                    .iter()
                    .map(|&group| {
                        let mut children = self.children(group).to_vec();
                        children.sort_by(&compare);
                        (group, children)
                    })
                    .collect();
                for (group, children) in sorted {
                    if let Some(node) = self.nodes.get_mut(group) {
                        node.children = children;
                    }
                }
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn restore_group_column(&mut self, column: usize) {
        if !self.group_column_was_hidden {
            self.hidden_columns.remove(&column);
        }
        self.group_column_was_hidden = false;
    }

    fn build_flat(&mut self) {
        self.nodes.clear();
        self.row_nodes.clear();
        self.top_level.clear();
        for &id in self.store.ids() {
            let node = self.nodes.insert(Node::row(id));
            self.row_nodes.insert(id, node);
            self.top_level.push(node);
        }
    }

    fn check_column(&self, column: usize) -> Result<()> {
        if column < self.store.column_count() {
            Ok(())
        } else {
            Err(TreeGridError::unknown_column(column.to_string()))
        }
    }

    fn group_key_for(&self, id: RowId, column: usize) -> String {
        match self.store.get(id).and_then(|row| row.value(column)) {
            Some(value) if !value.is_falsy() => value.display_text(),
            _ => CATCH_ALL_GROUP.to_owned(),
        }
    }

    fn find_or_create_group(&mut self, key: String) -> NodeId {
        let existing = self
            .top_level
            .iter()
            .copied()
            .find(|&group| self.group_key(group) == Some(key.as_str()));
        existing.unwrap_or_else(|| {
            let group = self.nodes.insert(Node::group(key));
            self.top_level.push(group);
            group
        })
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    fn row_ids_sorted(&self) -> Vec<RowId> {
        let mut ids: Vec<RowId> = self
            .get_all_rows()
            .into_iter()
            .filter_map(|node| self.row_id(node))
            .collect();
        ids.sort_unstable();
        ids
    }
}
