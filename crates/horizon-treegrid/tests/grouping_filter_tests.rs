//! End-to-end grouping and filtering tests.

use std::collections::{HashMap, HashSet};

use horizon_treegrid::prelude::*;
use horizon_treegrid::projection::CATCH_ALL_GROUP;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn projection_from(columns: &[&str], rows: &[(u64, &[(&str, &str)])]) -> TreeProjection {
    let mut store = RowStore::new(columns.iter().copied()).expect("unique columns");
    store.add_rows(rows.iter().map(|(id, attrs)| {
        (
            RowId(*id),
            attrs
                .iter()
                .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
                .collect::<HashMap<_, _>>(),
        )
    }));
    TreeProjection::new(store)
}

fn people() -> TreeProjection {
    projection_from(
        &["ID", "Name", "City"],
        &[
            (1, &[("Name", "Alice"), ("City", "NY")]),
            (2, &[("Name", "Bob"), ("City", "NY")]),
            (3, &[("Name", "Carl"), ("City", "LA")]),
        ],
    )
}

fn top_level_ids(projection: &TreeProjection) -> Vec<u64> {
    projection
        .get_all_items_at_child_level(0)
        .into_iter()
        .filter_map(|node| projection.row_id(node).map(|id| id.0))
        .collect()
}

fn row_ids(projection: &TreeProjection, nodes: &HashSet<NodeId>) -> Vec<u64> {
    let mut ids: Vec<u64> = nodes
        .iter()
        .filter_map(|&node| projection.row_id(node).map(|id| id.0))
        .collect();
    ids.sort_unstable();
    ids
}

#[test]
fn test_concrete_scenario() {
    init_tracing();
    let mut projection = people();

    projection.group_by_column_name("City").unwrap();
    let groups = projection.get_all_items_at_child_level(0);
    let keys: Vec<&str> = groups
        .iter()
        .filter_map(|&group| projection.group_key(group))
        .collect();
    assert_eq!(keys, ["NY", "LA"]);

    let children = |group: NodeId| -> Vec<String> {
        projection
            .children(group)
            .iter()
            .map(|&node| projection.cell_text(node, 1))
            .collect()
    };
    assert_eq!(children(groups[0]), ["Alice", "Bob"]);
    assert_eq!(children(groups[1]), ["Carl"]);

    let rule = MatchRule::new("Name", ConditionKind::Contains, "a");
    let matches = MatchEngine::find_matches(&projection, &rule).unwrap();
    assert_eq!(row_ids(&projection, &matches), vec![1, 3]);

    let mut filters = FilterSet::new();
    filters.add(rule);
    let visibility = filters.apply(&mut projection);
    assert_eq!(row_ids(&projection, &visibility.rows), vec![1, 3]);

    let bob = projection.node_for_row(RowId(2)).unwrap();
    assert!(projection.is_hidden(bob));
    assert!(!projection.is_hidden(groups[0]));
    assert!(!projection.is_hidden(groups[1]));

    projection.ungroup_all();
    assert_eq!(top_level_ids(&projection), vec![1, 2, 3]);
}

#[test]
fn test_round_trip_preserves_rows_and_order() {
    let cases: Vec<TreeProjection> = vec![
        projection_from(&["ID", "City"], &[]),
        people(),
        projection_from(
            &["ID", "City", "Dept"],
            &[
                (10, &[("City", "NY"), ("Dept", "Eng")]),
                (4, &[("City", "LA")]),
                (7, &[("City", "NY"), ("Dept", "Ops")]),
                (2, &[("Dept", "Eng")]),
                (9, &[("City", "LA"), ("Dept", "Ops")]),
            ],
        ),
    ];

    for mut projection in cases {
        for column in 1..projection.store().column_count() {
            let before = top_level_ids(&projection);
            projection.group_by_column(column).unwrap();
            projection.ungroup_all();
            assert_eq!(top_level_ids(&projection), before, "column {column}");
            assert_eq!(projection.row_count(), projection.store().len());
        }
    }
}

#[test]
fn test_catch_all_bucket() {
    for empties in [0u64, 1, 4] {
        let mut rows: Vec<(u64, Vec<(&str, &str)>)> = vec![(100, vec![("City", "NY")])];
        rows.extend((0..empties).map(|id| (id, vec![("City", "")])));
        let rows: Vec<(u64, &[(&str, &str)])> =
            rows.iter().map(|(id, attrs)| (*id, attrs.as_slice())).collect();
        let mut projection = projection_from(&["ID", "City"], &rows);

        projection.group_by_column(1).unwrap();
        let catch_all: Vec<NodeId> = projection
            .get_all_items_at_child_level(0)
            .into_iter()
            .filter(|&group| projection.group_key(group) == Some(CATCH_ALL_GROUP))
            .collect();

        if empties == 0 {
            assert!(catch_all.is_empty());
        } else {
            assert_eq!(catch_all.len(), 1);
            assert_eq!(projection.children(catch_all[0]).len(), empties as usize);
        }
    }
}

#[test]
fn test_filter_order_independence() {
    let mut projection = projection_from(
        &["ID", "Name", "City", "Dept"],
        &[
            (1, &[("Name", "Alice"), ("City", "NY"), ("Dept", "Eng")]),
            (2, &[("Name", "Bob"), ("City", "NY"), ("Dept", "Ops")]),
            (3, &[("Name", "Carl"), ("City", "LA"), ("Dept", "Eng")]),
            (4, &[("Name", "Dale"), ("City", "LA"), ("Dept", "Eng")]),
            (5, &[("Name", "Erin"), ("City", "SF"), ("Dept", "Eng")]),
        ],
    );
    projection.group_by_column_name("City").unwrap();

    let rules = [
        MatchRule::new("Dept", ConditionKind::ExactMatch, "eng"),
        MatchRule::new("City", ConditionKind::ExactMatch, "SF").with_negate(true),
        MatchRule::new("Name", ConditionKind::Wildcard, "*l*"),
    ];
    let orders = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    let mut results = Vec::new();
    for order in orders {
        let mut filters = FilterSet::new();
        for index in order {
            filters.add(rules[index].clone());
        }
        let first = filters.compute_visible(&projection);
        let second = filters.compute_visible(&projection);
        assert_eq!(first.rows, second.rows);
        results.push(row_ids(&projection, &first.rows));
    }

    assert!(results.iter().all(|ids| ids == &vec![1, 3, 4]));
}

#[test]
fn test_empty_filter_set_shows_all_rows() {
    let mut projection = people();
    for grouped in [false, true] {
        if grouped {
            projection.group_by_column(2).unwrap();
        }
        let visibility = FilterSet::new().apply(&mut projection);
        assert_eq!(row_ids(&projection, &visibility.rows), vec![1, 2, 3]);
        assert!(
            projection
                .get_all_nodes()
                .into_iter()
                .all(|node| !projection.is_hidden(node))
        );
    }
}

#[test]
fn test_negate_complement() {
    let mut projection = people();
    for grouped in [false, true] {
        if grouped {
            projection.group_by_column(2).unwrap();
        }
        for rule in [
            MatchRule::new("Name", ConditionKind::EndsWith, "l"),
            MatchRule::new("City", ConditionKind::ExactMatch, "Nowhere"),
        ] {
            let scope = MatchEngine::scope(&projection, &rule).unwrap();
            let in_scope: HashSet<NodeId> = MatchEngine::candidates(&projection, scope)
                .into_iter()
                .collect();
            let plain = MatchEngine::find_matches(&projection, &rule).unwrap();
            let negated =
                MatchEngine::find_matches(&projection, &rule.clone().with_negate(true)).unwrap();

            assert!(plain.is_disjoint(&negated));
            assert_eq!(&plain | &negated, in_scope);
        }
    }
}

#[test]
fn test_visibility_propagation() {
    let mut projection = people();
    projection.group_by_column(2).unwrap();
    projection.collapse_all();

    let carl = projection.node_for_row(RowId(3)).unwrap();
    FilterSet::apply_visibility(&mut projection, &HashSet::from([carl]));

    let la = projection.parent(carl).unwrap();
    assert!(!projection.is_hidden(carl));
    assert!(!projection.is_hidden(la));
    for node in projection.get_all_nodes() {
        if node != carl && node != la {
            assert!(projection.is_hidden(node));
        }
    }
}

#[test]
fn test_wildcard_and_regex_diverge() {
    let projection = projection_from(
        &["ID", "Name"],
        &[(1, &[("Name", "Alice")]), (2, &[("Name", "Abe")])],
    );
    let names = |condition: ConditionKind, keyword: &str| -> Vec<String> {
        let rule = MatchRule::new("Name", condition, keyword).with_case_sensitive(true);
        let mut names: Vec<String> = MatchEngine::find_matches(&projection, &rule)
            .unwrap()
            .into_iter()
            .map(|node| projection.cell_text(node, 1))
            .collect();
        names.sort();
        names
    };

    assert_eq!(names(ConditionKind::Wildcard, "A*e"), ["Abe", "Alice"]);
    assert_eq!(names(ConditionKind::Regex, "A.e"), ["Abe"]);
    assert!(names(ConditionKind::Wildcard, "A.e").is_empty());
}

#[test]
fn test_filters_recompute_after_regroup() {
    let mut projection = people();
    let mut filters = FilterSet::new();
    filters.add(MatchRule::new("City", ConditionKind::ExactMatch, "NY"));

    let flat = filters.compute_visible(&projection);
    projection.group_by_column(2).unwrap();
    let grouped = filters.compute_visible(&projection);

    assert_eq!(row_ids(&projection, &flat.rows), vec![1, 2]);
    assert_eq!(row_ids(&projection, &grouped.rows), vec![1, 2]);
}

#[test]
fn test_remove_rows_cascades() {
    let mut projection = people();
    projection.group_by_column(2).unwrap();
    projection.remove_rows([RowId(3)]);

    let keys: Vec<&str> = projection
        .get_all_items_at_child_level(0)
        .into_iter()
        .filter_map(|group| projection.group_key(group))
        .collect();
    assert_eq!(keys, ["NY"]);

    projection.ungroup_all();
    assert_eq!(top_level_ids(&projection), vec![1, 2]);
}
