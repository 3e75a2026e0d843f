//! Multi-rule filtering.
//!
//! A [`FilterSet`] holds an ordered list of [`MatchRule`]s. The visible rows
//! are the intersection of every rule's matches, so the order rules were added
//! in never changes the result. An empty set filters nothing.
//!
//! Rules scoped to group nodes (rules on the grouped column) contribute every
//! row of the groups they match, so they intersect cleanly with row rules.
//!
//! # Example
//!
//! ```ignore
//! let mut filters = FilterSet::new();
//! filters.count_changed.connect(|n| println!("{n} filters"));
//!
//! filters.add(MatchRule::new("Name", ConditionKind::Contains, "a"));
//! let visibility = filters.apply(&mut projection);
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use horizon_treegrid_core::logging::{span_names, targets};
use horizon_treegrid_core::{ConnectionId, Signal};

use crate::error::TreeGridError;
use crate::matching::{MatchEngine, MatchRule};
use crate::projection::{NodeId, ProjectionSignals, TreeProjection};

/// A rule that could not be evaluated and was left out of the intersection.
#[derive(Debug)]
pub struct SkippedRule {
    /// The rule.
    pub rule: MatchRule,
    /// Why it failed.
    pub error: TreeGridError,
}

/// The outcome of intersecting a filter set.
#[derive(Debug, Default)]
pub struct Visibility {
    /// Row nodes that pass every rule.
    pub rows: HashSet<NodeId>,
    /// Rules that failed and did not constrain the result.
    pub skipped: Vec<SkippedRule>,
}

impl Visibility {
    /// Returns `true` if the row node passed.
    pub fn contains(&self, node: NodeId) -> bool {
        self.rows.contains(&node)
    }
}

/// An ordered collection of match rules.
#[derive(Default)]
pub struct FilterSet {
    rules: Vec<MatchRule>,
    stale: Arc<AtomicBool>,
    /// Emitted with the new rule count whenever rules are added or removed.
    pub count_changed: Signal<usize>,
}

impl FilterSet {
    /// Create an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule and return the rule count.
    ///
    /// Duplicate rules and rules with an empty keyword are ignored.
    pub fn add(&mut self, rule: MatchRule) -> usize {
        if rule.keyword().is_empty() || self.rules.contains(&rule) {
            tracing::trace!(target: targets::FILTER, rule = %rule, "rule ignored");
            return self.rules.len();
        }
        tracing::debug!(target: targets::FILTER, rule = %rule, "rule added");
        self.rules.push(rule);
        self.mark_stale();
        self.count_changed.emit(self.rules.len());
        self.rules.len()
    }

    /// Remove a rule. Returns `true` if it was present.
    pub fn remove(&mut self, rule: &MatchRule) -> bool {
        let Some(position) = self.rules.iter().position(|r| r == rule) else {
            return false;
        };
        self.rules.remove(position);
        self.mark_stale();
        tracing::debug!(target: targets::FILTER, rule = %rule, "rule removed");
        self.count_changed.emit(self.rules.len());
        true
    }

    /// Remove every rule.
    pub fn clear(&mut self) {
        if self.rules.is_empty() {
            return;
        }
        self.rules.clear();
        self.mark_stale();
        self.count_changed.emit(0);
    }

    /// The rules, in insertion order.
    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when no rule is set.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Mark the visible set stale whenever the projection changes structure.
    ///
    /// Node ids from an earlier [`Visibility`] do not survive grouping or
    /// ungrouping; check [`FilterSet::needs_recompute`] and call
    /// [`FilterSet::apply`] again.
    pub fn watch(&self, signals: &ProjectionSignals) -> Vec<ConnectionId> {
        let flag = |stale: Arc<AtomicBool>| move || stale.store(true, Ordering::Release);
        let on_grouped = flag(self.stale.clone());
        let on_ungrouped = flag(self.stale.clone());
        let on_rebuilt = flag(self.stale.clone());
        let on_columns = flag(self.stale.clone());
        vec![
            signals.grouped_by_column.connect(move |_| on_grouped()),
            signals.ungrouped_all.connect(move |_| on_ungrouped()),
            signals.rows_rebuilt.connect(move |_| on_rebuilt()),
            signals.columns_changed.connect(move |_| on_columns()),
        ]
    }

    /// Returns `true` if rules or the watched projection changed since the
    /// last [`FilterSet::compute_visible`].
    pub fn needs_recompute(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }

    /// Intersect every rule's matches.
    ///
    /// Starts from every row. A rule that fails to evaluate is logged, reported
    /// in [`Visibility::skipped`], and does not constrain the result.
    pub fn compute_visible(&self, projection: &TreeProjection) -> Visibility {
        let _span = tracing::debug_span!(
            target: targets::FILTER,
            "compute_visible",
            operation = span_names::COMPUTE_VISIBLE,
            rules = self.rules.len()
        )
        .entered();

        self.stale.store(false, Ordering::Release);
        let mut visibility = Visibility {
            rows: projection.get_all_rows().into_iter().collect(),
            skipped: Vec::new(),
        };

        for rule in &self.rules {
            match MatchEngine::find_matches(projection, rule) {
                Ok(matches) => {
                    let rows = lift_to_rows(projection, matches);
                    visibility.rows.retain(|node| rows.contains(node));
                }
                Err(error) => {
                    tracing::warn!(
                        target: targets::FILTER,
                        rule = %rule,
                        error = %error,
                        "skipping rule that failed to evaluate"
                    );
                    visibility.skipped.push(SkippedRule {
                        rule: rule.clone(),
                        error,
                    });
                }
            }
        }

        tracing::debug!(
            target: targets::FILTER,
            visible = visibility.rows.len(),
            skipped = visibility.skipped.len(),
            "visible set computed"
        );
        visibility
    }

    /// Hide every node outside the visible set.
    ///
    /// Each visible node also shows its parent group and its own children, so a
    /// matched row is never stranded inside a hidden group.
    pub fn apply_visibility(projection: &mut TreeProjection, visible: &HashSet<NodeId>) {
        for node in projection.get_all_nodes() {
            projection.set_hidden(node, true);
        }
        for &node in visible {
            projection.set_hidden(node, false);
            if let Some(parent) = projection.parent(node) {
                projection.set_hidden(parent, false);
            }
            for child in projection.children(node).to_vec() {
                projection.set_hidden(child, false);
            }
        }
    }

    /// Compute the visible set and apply it.
    pub fn apply(&self, projection: &mut TreeProjection) -> Visibility {
        let visibility = self.compute_visible(projection);
        Self::apply_visibility(projection, &visibility.rows);
        visibility
    }

    /// Show every node.
    pub fn reset(projection: &mut TreeProjection) {
        projection.show_all();
    }
}

/// Replace group nodes with their member rows.
fn lift_to_rows(projection: &TreeProjection, nodes: HashSet<NodeId>) -> HashSet<NodeId> {
    let mut rows = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if projection.is_group(node) {
            rows.extend(projection.children(node).iter().copied());
        } else {
            rows.insert(node);
        }
    }
    rows
}
