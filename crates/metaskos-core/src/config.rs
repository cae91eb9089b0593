//! Merge configuration.
//!
//! Everything has a default matching the 2020 MeSH / UMLS / MONDO releases,
//! so a JSON config file only needs the keys it changes.

use crate::crosswalk::CrosswalkFiles;
use crate::model::{CanonicalId, SCHEME_ID_PREFIX};
use crate::query::local_name;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CANONICAL_NAMESPACE: &str = "http://meta.org/skos#";
pub const DEFAULT_THESAURUS_NAMESPACE: &str = "http://id.nlm.nih.gov/mesh/2020/";
pub const DEFAULT_METATHESAURUS_NAMESPACE: &str = "http://linkedlifedata.com/resource/umls/id/";
pub const DEFAULT_ONTOLOGY_ROOT: &str = "http://purl.obolibrary.org/obo/MONDO_0000001";
pub const DEFAULT_RARE_MODIFIER: &str = "http://purl.obolibrary.org/obo/MONDO_0021136";

/// How ontology classes are grafted onto the thesaurus tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStrategy {
    /// Bounded upward walk from every leaf with a global visited set.
    #[default]
    DepthFirst,
    /// Ordered (anchor, mid, mid, leaf) path segments flushed per group.
    PathTracing,
}

impl AnchorStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            AnchorStrategy::DepthFirst => "depth_first",
            AnchorStrategy::PathTracing => "path_tracing",
        }
    }
}

impl FromStr for AnchorStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "depth_first" | "dfs" => Ok(AnchorStrategy::DepthFirst),
            "path_tracing" | "paths" => Ok(AnchorStrategy::PathTracing),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown anchor strategy `{0}` (expected depth_first or path_tracing)")]
    UnknownStrategy(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Namespace of `concept_<n>` / `scheme_<n>` output IRIs.
    pub canonical_namespace: String,
    pub thesaurus_namespace: String,
    pub metathesaurus_namespace: String,
    /// An ontology `exactMatch` IRI containing this marker points into the thesaurus.
    pub thesaurus_xref_marker: String,
    /// Only classes under this root take part in the ontology merge.
    pub ontology_root: String,
    pub label_language: String,
    pub crosswalk_files: CrosswalkFiles,
    pub anchor_strategy: AnchorStrategy,
    /// Abort on a parent-label disagreement even when the stored label came
    /// from a resumed graph.
    pub strict_resume_labels: bool,
    /// Copy non-thesaurus `exactMatch` IRIs of ontology classes onto their
    /// canonical concepts.
    pub import_ontology_equivalences: bool,
    /// Vocabularies counted by `xref-stats`.
    pub xref_vocabularies: Vec<String>,
    /// A class whose superclass axioms carry `has modifier` this value is
    /// listed in the rare-disease table.
    pub rare_modifier: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            canonical_namespace: DEFAULT_CANONICAL_NAMESPACE.to_string(),
            thesaurus_namespace: DEFAULT_THESAURUS_NAMESPACE.to_string(),
            metathesaurus_namespace: DEFAULT_METATHESAURUS_NAMESPACE.to_string(),
            thesaurus_xref_marker: "mesh".to_string(),
            ontology_root: DEFAULT_ONTOLOGY_ROOT.to_string(),
            label_language: "en".to_string(),
            crosswalk_files: CrosswalkFiles::default(),
            anchor_strategy: AnchorStrategy::default(),
            strict_resume_labels: true,
            import_ontology_equivalences: true,
            xref_vocabularies: ["umls", "mesh", "snomedct", "DOID", "Orphanet"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            rare_modifier: DEFAULT_RARE_MODIFIER.to_string(),
        }
    }
}

impl MergeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Thesaurus URI an ontology cross-reference points at, if it is one.
    pub fn thesaurus_uri_for_xref(&self, xref: &str) -> Option<String> {
        if !xref.contains(&self.thesaurus_xref_marker) {
            return None;
        }
        Some(format!("{}{}", self.thesaurus_namespace, local_name(xref)))
    }

    pub fn metathesaurus_uri(&self, cui: &str) -> String {
        format!("{}{cui}", self.metathesaurus_namespace)
    }

    pub fn concept_iri(&self, id: &CanonicalId) -> String {
        format!("{}{id}", self.canonical_namespace)
    }

    pub fn scheme_iri(&self, scheme_id: &str) -> String {
        format!("{}{scheme_id}", self.canonical_namespace)
    }

    /// Inverse of [`MergeConfig::concept_iri`]; scheme IRIs are rejected.
    pub fn canonical_id_from_iri(&self, iri: &str) -> Option<CanonicalId> {
        let local = iri.strip_prefix(&self.canonical_namespace)?;
        if local.is_empty() || local.starts_with(SCHEME_ID_PREFIX) {
            return None;
        }
        Some(CanonicalId::from_raw(local))
    }

    pub fn scheme_id_from_iri(&self, iri: &str) -> Option<String> {
        iri.strip_prefix(&self.canonical_namespace)
            .filter(|local| local.starts_with(SCHEME_ID_PREFIX))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn xref_marker_reroots_local_name() {
        let config = MergeConfig::default();
        assert_eq!(
            config
                .thesaurus_uri_for_xref("http://identifiers.org/mesh/D001249")
                .as_deref(),
            Some("http://id.nlm.nih.gov/mesh/2020/D001249")
        );
        assert_eq!(
            config.thesaurus_uri_for_xref("http://identifiers.org/doid/DOID_2841"),
            None
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merge.json");
        std::fs::write(
            &path,
            r#"{ "anchor_strategy": "path_tracing", "strict_resume_labels": false }"#,
        )
        .unwrap();
        let config = MergeConfig::load(&path).unwrap();
        assert_eq!(config.anchor_strategy, AnchorStrategy::PathTracing);
        assert!(!config.strict_resume_labels);
        assert_eq!(config.label_language, "en");
        assert_eq!(config.crosswalk_files, CrosswalkFiles::default());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merge.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            MergeConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn strategy_names_parse_with_either_separator() {
        assert_eq!(
            "depth-first".parse::<AnchorStrategy>().unwrap(),
            AnchorStrategy::DepthFirst
        );
        assert_eq!(
            "path_tracing".parse::<AnchorStrategy>().unwrap(),
            AnchorStrategy::PathTracing
        );
        assert!("bfs".parse::<AnchorStrategy>().is_err());
    }

    #[test]
    fn canonical_iris_round_trip() {
        let config = MergeConfig::default();
        let id = CanonicalId::concept(7);
        let iri = config.concept_iri(&id);
        assert_eq!(iri, "http://meta.org/skos#concept_7");
        assert_eq!(config.canonical_id_from_iri(&iri), Some(id));
        assert_eq!(
            config.canonical_id_from_iri("http://meta.org/skos#scheme_C"),
            None
        );
        assert_eq!(
            config
                .scheme_id_from_iri("http://meta.org/skos#scheme_C")
                .as_deref(),
            Some("scheme_C")
        );
    }
}
