//! Canonical taxonomy model.
//!
//! Concepts never hold references to each other: edges are sets of
//! [`CanonicalId`]s and the [`ConceptStore`](crate::store::ConceptStore) owns
//! every record. This keeps the (possibly cyclic) source graphs from turning
//! into cyclic ownership on our side.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Prefix of every canonical concept id (`concept_<n>`).
pub const CONCEPT_ID_PREFIX: &str = "concept_";

/// Prefix of every concept scheme id (`scheme_<n>` / `scheme_<letter>`).
pub const SCHEME_ID_PREFIX: &str = "scheme_";

/// The fixed top-level categories of the thesaurus tree forest.
pub const THESAURUS_CATEGORIES: &[(char, &str)] = &[
    ('A', "Anatomy"),
    ('B', "Organisms"),
    ('C', "Diseases"),
    ('D', "Chemicals and Drugs"),
    (
        'E',
        "Analytical, Diagnostic and Therapeutic Techniques and Equipment",
    ),
    ('F', "Psychiatry and Psychology"),
    ('G', "Phenomena and Processes"),
    ('H', "Disciplines and Occupations"),
    (
        'I',
        "Anthropology, Education, Sociology and Social Phenomena",
    ),
    ('J', "Technology, Industry, Agriculture"),
    ('K', "Humanities"),
    ('L', "Information Science"),
    ('M', "Named Groups"),
    ('N', "Health Care"),
    ('V', "Publication Characteristics"),
    ('Z', "Geographicals"),
];

/// Stable, globally unique id of a canonical concept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(String);

impl CanonicalId {
    /// `concept_<suffix>` for a pre-assigned crosswalk value or a counter value.
    pub fn concept(suffix: impl fmt::Display) -> Self {
        Self(format!("{CONCEPT_ID_PREFIX}{suffix}"))
    }

    /// Wrap an id read back from a persisted graph.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric suffix of a counter-style id (`concept_42` -> `42`).
    pub fn numeric_suffix(&self) -> Option<u64> {
        self.0
            .strip_prefix(CONCEPT_ID_PREFIX)
            .and_then(|s| s.parse::<u64>().ok())
    }

    /// The id of the per-tree scheme whose top concept is `self`.
    pub fn scheme_id(&self) -> String {
        match self.0.strip_prefix(CONCEPT_ID_PREFIX) {
            Some(suffix) => format!("{SCHEME_ID_PREFIX}{suffix}"),
            None => format!("{SCHEME_ID_PREFIX}{}", self.0),
        }
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scheme id of the umbrella scheme for one category letter.
pub fn category_scheme_id(category: char) -> String {
    format!("{SCHEME_ID_PREFIX}{category}")
}

/// Label of a category letter, if it is one of the fixed categories.
pub fn category_label(category: char) -> Option<&'static str> {
    THESAURUS_CATEGORIES
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, label)| *label)
}

/// A node in the unified output taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalConcept {
    pub id: CanonicalId,
    /// Set at most once (see [`ConceptStore::populate_once`](crate::store::ConceptStore::populate_once)).
    pub label: Option<String>,
    #[serde(default)]
    pub alt_labels: BTreeSet<String>,
    /// First writer wins.
    pub definition: Option<String>,
    #[serde(default)]
    pub cross_references: BTreeSet<String>,
    #[serde(default)]
    pub broader: BTreeSet<CanonicalId>,
    #[serde(default)]
    pub narrower: BTreeSet<CanonicalId>,
    #[serde(default)]
    pub schemes: BTreeSet<String>,
}

impl CanonicalConcept {
    pub fn new(id: CanonicalId) -> Self {
        Self {
            id,
            label: None,
            alt_labels: BTreeSet::new(),
            definition: None,
            cross_references: BTreeSet::new(),
            broader: BTreeSet::new(),
            narrower: BTreeSet::new(),
            schemes: BTreeSet::new(),
        }
    }

    pub fn is_labeled(&self) -> bool {
        self.label.is_some()
    }

    /// Label for diagnostics; empty when the concept was never labeled.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }
}

/// A named grouping of canonical concepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptScheme {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub top_concepts: BTreeSet<CanonicalId>,
}

impl ConceptScheme {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            top_concepts: BTreeSet::new(),
        }
    }
}

/// Core fields written by the first resolution of a concept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptFields {
    pub label: Option<String>,
    pub definition: Option<String>,
    pub alt_labels: Vec<String>,
}

impl ConceptFields {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn with_definition(mut self, definition: Option<String>) -> Self {
        self.definition = definition;
        self
    }

    pub fn with_alt_labels(mut self, alt_labels: impl IntoIterator<Item = String>) -> Self {
        self.alt_labels.extend(alt_labels);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_id_mirrors_concept_suffix() {
        let id = CanonicalId::concept(100);
        assert_eq!(id.as_str(), "concept_100");
        assert_eq!(id.scheme_id(), "scheme_100");
        assert_eq!(id.numeric_suffix(), Some(100));
    }

    #[test]
    fn non_numeric_suffix_is_not_a_counter_value() {
        let id = CanonicalId::concept("C0004096");
        assert_eq!(id.numeric_suffix(), None);
        assert_eq!(id.scheme_id(), "scheme_C0004096");
    }

    #[test]
    fn categories_cover_disease_letter() {
        assert_eq!(category_label('C'), Some("Diseases"));
        assert_eq!(category_label('X'), None);
        assert_eq!(category_scheme_id('C'), "scheme_C");
    }
}
