//! Match rules and their evaluation against a projection.
//!
//! A [`MatchRule`] names a column, a [`ConditionKind`], a keyword, and the
//! negate and case flags. [`MatchEngine::find_matches`] evaluates one rule and
//! returns the matching nodes at the right tree depth:
//!
//! - Rules on the grouped column match group nodes by their key.
//! - Any other rule matches rows, which sit one level down when grouped.
//!
//! Negation is applied after scoping, so a negated rule returns every node in
//! scope that the plain rule did not match.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use horizon_treegrid_core::logging::targets;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeGridError};
use crate::projection::{NodeId, TreeProjection};

// =========================================================================
// Conditions
// =========================================================================

/// How a keyword is compared against a cell's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// Keyword is a substring of the value.
    #[default]
    Contains,
    /// Value starts with the keyword.
    StartsWith,
    /// Value ends with the keyword.
    EndsWith,
    /// Value equals the keyword.
    ExactMatch,
    /// Whole value matches a glob with `*` and `?`.
    #[serde(alias = "wild_card")]
    Wildcard,
    /// Value contains a match of a regular expression.
    #[serde(alias = "reg_exp")]
    Regex,
}

impl ConditionKind {
    /// Every condition, in menu order.
    pub const ALL: [ConditionKind; 6] = [
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
        Self::ExactMatch,
        Self::Wildcard,
        Self::Regex,
    ];

    /// The canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::ExactMatch => "exact_match",
            Self::Wildcard => "wildcard",
            Self::Regex => "regex",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionKind {
    type Err = TreeGridError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "contains" => Ok(Self::Contains),
            "starts_with" => Ok(Self::StartsWith),
            "ends_with" => Ok(Self::EndsWith),
            "exact_match" => Ok(Self::ExactMatch),
            "wildcard" | "wild_card" => Ok(Self::Wildcard),
            "regex" | "reg_exp" => Ok(Self::Regex),
            other => Err(TreeGridError::unknown_condition(other)),
        }
    }
}

// =========================================================================
// Rules
// =========================================================================

/// One filter or search configuration.
///
/// Rules are compared structurally, so two rules built from the same inputs
/// are the same rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchRule {
    column: String,
    condition: ConditionKind,
    keyword: String,
    #[serde(default)]
    negate: bool,
    #[serde(default)]
    case_sensitive: bool,
}

impl MatchRule {
    /// Create a case-insensitive, non-negated rule.
    pub fn new(
        column: impl Into<String>,
        condition: ConditionKind,
        keyword: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            condition,
            keyword: keyword.into(),
            negate: false,
            case_sensitive: false,
        }
    }

    /// Build a rule from a cell of the projection.
    ///
    /// On a group node of a grouped projection the rule targets the grouped
    /// column with the group key; otherwise it targets `column` with the
    /// cell's text. The condition is [`ConditionKind::ExactMatch`].
    pub fn from_cell(projection: &TreeProjection, node: NodeId, column: usize) -> Option<Self> {
        if let (Some(grouped), Some(key)) =
            (projection.grouped_column_name(), projection.group_key(node))
        {
            return Some(Self::new(grouped, ConditionKind::ExactMatch, key));
        }
        let name = projection.store().column_name(column)?;
        projection.row_id(node)?;
        Some(Self::new(
            name,
            ConditionKind::ExactMatch,
            projection.cell_text(node, column),
        ))
    }

    /// Set the condition.
    pub fn with_condition(mut self, condition: ConditionKind) -> Self {
        self.condition = condition;
        self
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

    /// The column name.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// The condition.
    pub fn condition(&self) -> ConditionKind {
        self.condition
    }

    /// The keyword.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Whether the rule is negated.
    pub fn negate(&self) -> bool {
        self.negate
    }

    /// Whether the rule is case sensitive.
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.column, self.condition, self.keyword)?;
        if self.negate {
            f.write_str(" (negated)")?;
        }
        if self.case_sensitive {
            f.write_str(" (match case)")?;
        }
        Ok(())
    }
}

// =========================================================================
// Compiled predicates
// =========================================================================

/// Plain text comparisons, the conditions that do not compile to a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCondition {
    /// Keyword is a substring of the value.
    Contains,
    /// Value starts with the keyword.
    StartsWith,
    /// Value ends with the keyword.
    EndsWith,
    /// Value equals the keyword.
    ExactMatch,
}

impl TextCondition {
    fn test(self, value: &str, keyword: &str) -> bool {
        match self {
            Self::Contains => value.contains(keyword),
            Self::StartsWith => value.starts_with(keyword),
            Self::EndsWith => value.ends_with(keyword),
            Self::ExactMatch => value == keyword,
        }
    }
}

/// A rule's condition and keyword, ready to test cell text.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches everything (empty keyword).
    Any,
    /// Plain text comparison.
    Text {
        /// The comparison.
        condition: TextCondition,
        /// The keyword, lowercased when not case sensitive.
        keyword: String,
        /// Whether values are compared as-is.
        case_sensitive: bool,
    },
    /// Wildcard or regular expression.
    Pattern(Regex),
}

impl Matcher {
    /// Compile a rule's condition and keyword.
    pub fn compile(rule: &MatchRule) -> Result<Self> {
        Self::build(rule.condition, &rule.keyword, rule.case_sensitive)
    }

    /// Compile a condition and keyword.
    pub fn build(condition: ConditionKind, keyword: &str, case_sensitive: bool) -> Result<Self> {
        if keyword.is_empty() {
            return Ok(Self::Any);
        }
        let flag = if case_sensitive { "" } else { "(?i)" };
        let text = |condition: TextCondition| Self::Text {
            condition,
            keyword: if case_sensitive {
                keyword.to_owned()
            } else {
                keyword.to_lowercase()
            },
            case_sensitive,
        };
        match condition {
            ConditionKind::Contains => Ok(text(TextCondition::Contains)),
            ConditionKind::StartsWith => Ok(text(TextCondition::StartsWith)),
            ConditionKind::EndsWith => Ok(text(TextCondition::EndsWith)),
            ConditionKind::ExactMatch => Ok(text(TextCondition::ExactMatch)),
            ConditionKind::Wildcard => {
                let pattern = format!("{flag}{}", wildcard_to_regex(keyword));
                Regex::new(&pattern)
                    .map(Self::Pattern)
                    .map_err(|err| TreeGridError::invalid_pattern(keyword, err))
            }
            ConditionKind::Regex => Regex::new(&format!("{flag}{keyword}"))
                .map(Self::Pattern)
                .map_err(|err| TreeGridError::invalid_pattern(keyword, err)),
        }
    }

    /// Test one value.
    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Pattern(regex) => regex.is_match(value),
            Self::Text {
                condition,
                keyword,
                case_sensitive: true,
            } => condition.test(value, keyword),
            Self::Text {
                condition,
                keyword,
                case_sensitive: false,
            } => condition.test(&value.to_lowercase(), keyword),
        }
    }
}

/// Translate a glob into an anchored regular expression.
///
/// `*` matches any run of characters and `?` any single character. Everything
/// else is literal.
pub fn wildcard_to_regex(glob: &str) -> String {
    let mut pattern = String::with_capacity(glob.len() + 8);
    pattern.push_str("^(?s:");
    let mut literal = String::new();
    for ch in glob.chars() {
        match ch {
            '*' | '?' => {
                pattern.push_str(&regex::escape(&literal));
                literal.clear();
                pattern.push_str(if ch == '*' { ".*" } else { "." });
            }
            _ => literal.push(ch),
        }
    }
    pattern.push_str(&regex::escape(&literal));
    pattern.push_str(")$");
    pattern
}

// =========================================================================
// Engine
// =========================================================================

/// Where a rule is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScope {
    /// Column position searched.
    pub column: usize,
    /// Child level of the candidate nodes.
    pub level: usize,
    /// Whether candidates are found by descending into groups.
    pub recursive: bool,
}

/// Evaluates match rules against a projection.
pub struct MatchEngine;

impl MatchEngine {
    /// Resolve the column and depth a rule applies to.
    pub fn scope(projection: &TreeProjection, rule: &MatchRule) -> Result<MatchScope> {
        let column = projection.store().column_index(&rule.column)?;
        let scope = match projection.grouped_column_name() {
            Some(grouped) if grouped == rule.column => MatchScope {
                column,
                level: 0,
                recursive: false,
            },
            Some(_) => MatchScope {
                column,
                level: 1,
                recursive: true,
            },
            None => MatchScope {
                column,
                level: 0,
                recursive: false,
            },
        };
        Ok(scope)
    }

    /// Every candidate node for a scope.
    pub fn candidates(projection: &TreeProjection, scope: MatchScope) -> Vec<NodeId> {
        if scope.recursive {
            projection
                .get_all_nodes()
                .into_iter()
                .filter(|&node| projection.child_level(node) == scope.level)
                .collect()
        } else {
            projection.get_all_items_at_child_level(scope.level)
        }
    }

    /// Find the nodes a rule matches, scoped to the rule's tree depth.
    pub fn find_matches(projection: &TreeProjection, rule: &MatchRule) -> Result<HashSet<NodeId>> {
        let scope = Self::scope(projection, rule)?;
        let matcher = Matcher::compile(rule)?;
        let candidates = Self::candidates(projection, scope);

        let matches: HashSet<NodeId> = candidates
            .iter()
            .copied()
            .filter(|&node| matcher.is_match(&projection.cell_text(node, scope.column)) != rule.negate)
            .collect();

        tracing::trace!(
            target: targets::MATCH,
            rule = %rule,
            level = scope.level,
            candidates = candidates.len(),
            matches = matches.len(),
            "rule evaluated"
        );
        Ok(matches)
    }
}
