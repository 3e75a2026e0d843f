//! Search-as-you-type highlighting.
//!
//! [`HighlightIndex`] marks the cells matched by a live search without hiding
//! anything. Every shown cell of a matched row is highlighted; the cells in the
//! searched column are additionally *focused* so they can be drawn distinctly.
//!
//! The search text is split into terms by [`parse_search_terms`]. Quoted terms
//! match exactly, everything else is split on tab, newline, comma, or pipe and
//! matched as a substring, or as a wildcard when it contains `*` or `?`.
//!
//! Highlights are recomputed wholesale. Group nodes do not survive grouping
//! or ungrouping, so an index shared through [`HighlightIndex::bind`] clears
//! itself on every structural change; an unshared one can drop dead cells with
//! [`HighlightIndex::retain_live`] before recomputing.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use horizon_treegrid_core::logging::{span_names, targets};
use horizon_treegrid_core::{ConnectionId, Signal};
use parking_lot::Mutex;

use crate::error::Result;
use crate::matching::{ConditionKind, MatchEngine, MatchRule};
use crate::projection::{NodeId, ProjectionSignals, TreeProjection};

/// A cell address: node and column position.
pub type Cell = (NodeId, usize);

/// One term of a live search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    /// Text to look for.
    pub keyword: String,
    /// How to compare it.
    pub condition: ConditionKind,
}

impl SearchTerm {
    fn quoted(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_owned(),
            condition: ConditionKind::ExactMatch,
        }
    }

    fn loose(keyword: &str) -> Self {
        let condition = if keyword.contains(['*', '?']) {
            ConditionKind::Wildcard
        } else {
            ConditionKind::Contains
        };
        Self {
            keyword: keyword.to_owned(),
            condition,
        }
    }
}

/// Split live search text into terms.
///
/// Quoted terms come first, in order, followed by the loose terms.
///
/// ```
/// use horizon_treegrid::highlight::parse_search_terms;
/// use horizon_treegrid::matching::ConditionKind;
///
/// let terms = parse_search_terms(r#""New York", b*n|LA"#);
/// let keywords: Vec<&str> = terms.iter().map(|t| t.keyword.as_str()).collect();
/// assert_eq!(keywords, ["New York", "b*n", "LA"]);
/// assert_eq!(terms[1].condition, ConditionKind::Wildcard);
/// ```
pub fn parse_search_terms(text: &str) -> Vec<SearchTerm> {
    let mut quoted = Vec::new();
    let mut segments = Vec::new();
    let mut segment = String::new();

    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        let after = &rest[ch.len_utf8()..];
        if matches!(ch, '"' | '\'')
            && let Some(end) = after.find(ch)
        {
            quoted.push(&after[..end]);
            segments.push(std::mem::take(&mut segment));
            rest = &after[end + 1..];
            continue;
        }
        segment.push(ch);
        rest = after;
    }
    segments.push(segment);

    let quoted_terms = quoted
        .into_iter()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(SearchTerm::quoted);
    let loose_terms: Vec<SearchTerm> = segments
        .iter()
        .flat_map(|segment| segment.split(['\t', '\n', ',', '|']))
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(SearchTerm::loose)
        .collect();

    quoted_terms.chain(loose_terms).collect()
}

/// A live search against one column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveSearch {
    /// Raw text typed by the user.
    pub text: String,
    /// Column searched.
    pub column: String,
    /// Highlight the rows that do not match instead.
    pub negate: bool,
    /// Compare case-sensitively.
    pub case_sensitive: bool,
}

impl LiveSearch {
    /// Create a case-insensitive search.
    pub fn new(text: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            column: column.into(),
            negate: false,
            case_sensitive: false,
        }
    }

    /// Set negation.
    pub fn with_negate(mut self, negate: bool) -> Self {
        self.negate = negate;
        self
    }

    /// Set case sensitivity.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

/// Cells highlighted by live search, plus the selection.
#[derive(Default)]
pub struct HighlightIndex {
    rows: HashSet<NodeId>,
    cells: HashSet<Cell>,
    focused: HashSet<Cell>,
    selected: HashSet<Cell>,
    /// Emitted with the highlighted cell count after every change.
    pub highlight_changed: Signal<usize>,
}

impl HighlightIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the highlights with the matches of a live search.
    ///
    /// An unknown column is an error and leaves the previous highlights in
    /// place. A term that fails to compile is skipped. Plain searches highlight
    /// nodes matching any term; negated ones highlight nodes matching none.
    /// Returns the number of matched nodes.
    pub fn recompute(&mut self, projection: &TreeProjection, search: &LiveSearch) -> Result<usize> {
        let column = projection.store().column_index(&search.column)?;
        let _span = tracing::debug_span!(
            target: targets::HIGHLIGHT,
            "highlight",
            operation = span_names::HIGHLIGHT_RECOMPUTE,
            column = %search.column
        )
        .entered();

        self.clear_matches();
        let mut matched: Option<HashSet<NodeId>> = None;
        for term in parse_search_terms(&search.text) {
            let rule = MatchRule::new(&search.column, term.condition, &term.keyword)
                .with_negate(search.negate)
                .with_case_sensitive(search.case_sensitive);
            match MatchEngine::find_matches(projection, &rule) {
                Ok(nodes) => {
                    matched = Some(match matched {
                        None => nodes,
                        Some(acc) if search.negate => acc.intersection(&nodes).copied().collect(),
                        Some(mut acc) => {
                            acc.extend(nodes);
                            acc
                        }
                    });
                }
                Err(error) => tracing::warn!(
                    target: targets::HIGHLIGHT,
                    term = %term.keyword,
                    error = %error,
                    "skipping search term"
                ),
            }
        }

        let shown = projection.shown_columns();
        for node in matched.unwrap_or_default() {
            self.mark(node, &shown, column);
        }

        tracing::trace!(
            target: targets::HIGHLIGHT,
            rows = self.rows.len(),
            cells = self.cells.len(),
            "highlights recomputed"
        );
        self.highlight_changed.emit(self.cells.len());
        Ok(self.rows.len())
    }

    /// Replace the highlights with matches in any shown column.
    ///
    /// Each column a row matched in becomes a focused cell of that row.
    /// Returns the number of matched nodes.
    pub fn recompute_all_columns(
        &mut self,
        projection: &TreeProjection,
        text: &str,
        case_sensitive: bool,
    ) -> usize {
        let _span = tracing::debug_span!(
            target: targets::HIGHLIGHT,
            "highlight",
            operation = span_names::HIGHLIGHT_RECOMPUTE
        )
        .entered();

        self.clear_matches();
        let shown = projection.shown_columns();
        let terms = parse_search_terms(text);
        for &column in &shown {
            let Some(name) = projection.store().column_name(column) else {
                continue;
            };
            for term in &terms {
                let rule = MatchRule::new(name, term.condition, &term.keyword)
                    .with_case_sensitive(case_sensitive);
                match MatchEngine::find_matches(projection, &rule) {
                    Ok(matches) => {
                        for node in matches {
                            self.mark(node, &shown, column);
                        }
                    }
                    Err(error) => tracing::warn!(
                        target: targets::HIGHLIGHT,
                        term = %term.keyword,
                        error = %error,
                        "skipping search term"
                    ),
                }
            }
        }

        self.highlight_changed.emit(self.cells.len());
        self.rows.len()
    }

    /// Remove every search highlight. The selection is kept.
    pub fn clear(&mut self) {
        let had_cells = !self.cells.is_empty();
        self.clear_matches();
        if had_cells {
            self.highlight_changed.emit(0);
        }
    }

    /// Drop highlights and selected cells whose node or column no longer exists.
    ///
    /// Emits `highlight_changed` if any highlighted cell was dropped. Returns
    /// the number of cells removed from the highlight set.
    pub fn retain_live(&mut self, projection: &TreeProjection) -> usize {
        let columns = projection.store().column_count();
        let live = |&(node, column): &Cell| column < columns && projection.node_kind(node).is_some();

        let before = self.cells.len();
        self.rows.retain(|&node| projection.node_kind(node).is_some());
        self.cells.retain(live);
        self.focused.retain(live);
        self.selected.retain(live);

        let removed = before - self.cells.len();
        if removed > 0 {
            tracing::debug!(target: targets::HIGHLIGHT, removed, "dropped stale highlights");
            self.highlight_changed.emit(self.cells.len());
        }
        removed
    }

    /// Clear a shared index whenever the projection changes structure.
    ///
    /// Grouping, ungrouping, row changes, and schema changes all clear the
    /// highlights and the selection. The connections hold a weak reference,
    /// so dropping the index disables them. The index lock must not be held
    /// while mutating the projection.
    pub fn bind(index: &Arc<Mutex<Self>>, signals: &ProjectionSignals) -> Vec<ConnectionId> {
        let reset = |weak: Weak<Mutex<Self>>| {
            move || {
                if let Some(index) = weak.upgrade() {
                    index.lock().reset();
                }
            }
        };
        let on_grouped = reset(Arc::downgrade(index));
        let on_ungrouped = reset(Arc::downgrade(index));
        let on_rebuilt = reset(Arc::downgrade(index));
        let on_columns = reset(Arc::downgrade(index));
        vec![
            signals.grouped_by_column.connect(move |_| on_grouped()),
            signals.ungrouped_all.connect(move |_| on_ungrouped()),
            signals.rows_rebuilt.connect(move |_| on_rebuilt()),
            signals.columns_changed.connect(move |_| on_columns()),
        ]
    }

    /// Remove every highlight and the selection.
    pub fn reset(&mut self) {
        self.selected.clear();
        self.clear();
    }

    /// Record the selected cells, replacing the previous selection.
    pub fn set_selected<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = Cell>,
    {
        self.selected = cells.into_iter().collect();
    }

    /// Returns `true` if the cell is highlighted.
    pub fn is_highlighted(&self, node: NodeId, column: usize) -> bool {
        self.cells.contains(&(node, column))
    }

    /// Returns `true` if the cell is focused.
    pub fn is_focused(&self, node: NodeId, column: usize) -> bool {
        self.focused.contains(&(node, column))
    }

    /// Returns `true` if the cell is selected.
    pub fn is_selected(&self, node: NodeId, column: usize) -> bool {
        self.selected.contains(&(node, column))
    }

    /// Matched nodes.
    pub fn highlighted_rows(&self) -> &HashSet<NodeId> {
        &self.rows
    }

    /// Every highlighted cell.
    pub fn highlighted_cells(&self) -> &HashSet<Cell> {
        &self.cells
    }

    /// Focused cells, a subset of the highlighted ones when the column is shown.
    pub fn focused_cells(&self) -> &HashSet<Cell> {
        &self.focused
    }

    /// Selected cells.
    pub fn selected_cells(&self) -> &HashSet<Cell> {
        &self.selected
    }

    fn clear_matches(&mut self) {
        self.rows.clear();
        self.cells.clear();
        self.focused.clear();
    }

    fn mark(&mut self, node: NodeId, shown: &[usize], focused_column: usize) {
        self.rows.insert(node);
        self.cells.extend(shown.iter().map(|&column| (node, column)));
        self.focused.insert((node, focused_column));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RowId, RowStore};
    use crate::value::CellValue;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn create_test_projection() -> TreeProjection {
        let mut store = RowStore::new(["ID", "Name", "City"]).unwrap();
        let rows = [
            (1, "Alice", "New York"),
            (2, "Bob", "Boston"),
            (3, "Carl", "LA"),
        ];
        store.add_rows(rows.iter().map(|&(id, name, city)| {
            (
                RowId(id),
                HashMap::from([
                    ("Name".to_string(), CellValue::from(name)),
                    ("City".to_string(), CellValue::from(city)),
                ]),
            )
        }));
        TreeProjection::new(store)
    }

    fn node(projection: &TreeProjection, id: u64) -> NodeId {
        projection.node_for_row(RowId(id)).unwrap()
    }

    #[test]
    fn test_parse_quoted_and_loose_terms() {
        let terms = parse_search_terms("'apple' \" banana\" grape, pe?r\t\"orange and mango\"");
        assert_eq!(
            terms,
            vec![
                SearchTerm::quoted("apple"),
                SearchTerm::quoted("banana"),
                SearchTerm::quoted("orange and mango"),
                SearchTerm::loose("grape"),
                SearchTerm::loose("pe?r"),
            ]
        );
        assert_eq!(terms[3].condition, ConditionKind::Contains);
        assert_eq!(terms[4].condition, ConditionKind::Wildcard);
    }

    #[test]
    fn test_parse_unbalanced_quote_is_literal() {
        let terms = parse_search_terms("it's");
        assert_eq!(terms, vec![SearchTerm::loose("it's")]);
        assert!(parse_search_terms(" , | ").is_empty());
    }

    #[test]
    fn test_recompute_marks_rows_and_focus() {
        let projection = create_test_projection();
        let mut index = HighlightIndex::new();

        let matched = index
            .recompute(&projection, &LiveSearch::new("bo, carl", "Name"))
            .unwrap();
        assert_eq!(matched, 2);

        let bob = node(&projection, 2);
        let alice = node(&projection, 1);
        assert!(index.is_highlighted(bob, 0));
        assert!(index.is_highlighted(bob, 2));
        assert!(index.is_focused(bob, 1));
        assert!(!index.is_focused(bob, 2));
        assert!(!index.is_highlighted(alice, 1));
        assert_eq!(index.highlighted_cells().len(), 6);
        assert_eq!(index.focused_cells().len(), 2);
    }

    #[test]
    fn test_recompute_replaces_previous() {
        let projection = create_test_projection();
        let mut index = HighlightIndex::new();
        index
            .recompute(&projection, &LiveSearch::new("alice", "Name"))
            .unwrap();
        index
            .recompute(&projection, &LiveSearch::new("carl", "Name"))
            .unwrap();

        assert!(!index.is_highlighted(node(&projection, 1), 1));
        assert!(index.is_highlighted(node(&projection, 3), 1));
    }

    #[test]
    fn test_unknown_column_keeps_previous_state() {
        let projection = create_test_projection();
        let mut index = HighlightIndex::new();
        index
            .recompute(&projection, &LiveSearch::new("alice", "Name"))
            .unwrap();

        assert!(index.recompute(&projection, &LiveSearch::new("x", "Age")).is_err());
        assert!(index.is_highlighted(node(&projection, 1), 1));
    }

    #[test]
    fn test_negated_search() {
        let projection = create_test_projection();
        let mut index = HighlightIndex::new();
        let search = LiveSearch::new("\"LA\"", "City").with_negate(true);
        assert_eq!(index.recompute(&projection, &search).unwrap(), 2);
        assert!(!index.highlighted_rows().contains(&node(&projection, 3)));
    }

    #[test]
    fn test_negated_terms_intersect() {
        let projection = create_test_projection();
        let mut index = HighlightIndex::new();
        let search = LiveSearch::new("alice, bob", "Name").with_negate(true);

        assert_eq!(index.recompute(&projection, &search).unwrap(), 1);
        assert!(index.highlighted_rows().contains(&node(&projection, 3)));
    }

    #[test]
    fn test_retain_live_after_ungroup() {
        let mut projection = create_test_projection();
        projection.group_by_column(2).unwrap();
        let mut index = HighlightIndex::new();
        index
            .recompute(&projection, &LiveSearch::new("boston", "City"))
            .unwrap();
        let group = *index.highlighted_rows().iter().next().unwrap();
        index.set_selected([(group, 0), (node(&projection, 1), 1)]);

        projection.ungroup_all();
        assert!(index.retain_live(&projection) > 0);

        assert!(index.highlighted_rows().is_empty());
        assert!(index.highlighted_cells().is_empty());
        assert!(index.focused_cells().is_empty());
        assert_eq!(index.selected_cells().len(), 1);
        assert_eq!(index.retain_live(&projection), 0);
    }

    #[test]
    fn test_bound_index_clears_on_structure_change() {
        let mut projection = create_test_projection();
        let index = Arc::new(Mutex::new(HighlightIndex::new()));
        let connections = HighlightIndex::bind(&index, projection.signals());
        assert_eq!(connections.len(), 4);

        let counts = Arc::new(Mutex::new(Vec::new()));
        let counts_clone = counts.clone();
        index
            .lock()
            .highlight_changed
            .connect(move |&n| counts_clone.lock().push(n));

        projection.group_by_column(2).unwrap();
        index
            .lock()
            .recompute(&projection, &LiveSearch::new("la", "City"))
            .unwrap();
        projection.ungroup_all();

        let live = |index: &HighlightIndex| {
            index
                .highlighted_rows()
                .iter()
                .all(|&n| projection.node_kind(n).is_some())
        };
        assert!(index.lock().highlighted_rows().is_empty());
        assert!(live(&index.lock()));
        assert_eq!(*counts.lock(), vec![2, 0]);

        drop(index);
        projection.group_by_column(2).unwrap();
    }

    #[test]
    fn test_hidden_columns_not_highlighted() {
        let mut projection = create_test_projection();
        projection.hide_column(2).unwrap();
        let mut index = HighlightIndex::new();
        index
            .recompute(&projection, &LiveSearch::new("bob", "Name"))
            .unwrap();
        assert!(!index.is_highlighted(node(&projection, 2), 2));
        assert!(index.is_highlighted(node(&projection, 2), 0));
    }

    #[test]
    fn test_recompute_all_columns() {
        let projection = create_test_projection();
        let mut index = HighlightIndex::new();
        let matched = index.recompute_all_columns(&projection, "bo", false);

        assert_eq!(matched, 1);
        let bob = node(&projection, 2);
        assert!(index.is_focused(bob, 1));
        assert!(index.is_focused(bob, 2));
    }

    #[test]
    fn test_clear_keeps_selection() {
        let projection = create_test_projection();
        let mut index = HighlightIndex::new();
        let counts = Arc::new(Mutex::new(Vec::new()));
        let counts_clone = counts.clone();
        index
            .highlight_changed
            .connect(move |&n| counts_clone.lock().push(n));

        let carl = node(&projection, 3);
        index.set_selected([(carl, 1)]);
        index
            .recompute(&projection, &LiveSearch::new("carl", "Name"))
            .unwrap();
        index.clear();
        index.clear();

        assert!(index.highlighted_cells().is_empty());
        assert!(index.is_selected(carl, 1));
        assert_eq!(*counts.lock(), vec![3, 0]);
    }

    #[test]
    fn test_highlight_is_per_instance() {
        let projection = create_test_projection();
        let mut first = HighlightIndex::new();
        let second = HighlightIndex::new();
        first
            .recompute(&projection, &LiveSearch::new("alice", "Name"))
            .unwrap();
        assert!(second.highlighted_cells().is_empty());
    }
}
