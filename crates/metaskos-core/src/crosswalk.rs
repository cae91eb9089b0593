//! Identifier crosswalk between canonical ids, thesaurus ids and
//! metathesaurus CUIs.
//!
//! The crosswalk arrives as four tab-separated dumps (all concepts, merged,
//! new, deleted). Each dump declares its columns in a header row; only the
//! canonical-id, source-id and CUI columns are read. Batches are applied in
//! [`CrosswalkBatch::PRECEDENCE`] order and a later batch overwrites an index
//! entry of an earlier one for the same key.
//!
//! Loading is all-or-nothing: a missing file or a row whose field count does
//! not match its header fails the whole table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Header names accepted for the canonical id column.
pub const CANONICAL_ID_COLUMNS: &[&str] = &["C_ID"];
/// Header names accepted for the thesaurus source id column.
pub const THESAURUS_ID_COLUMNS: &[&str] = &["SRC_ID", "NEW_SRC_ID"];
/// Header names accepted for the metathesaurus CUI column.
pub const METATHESAURUS_ID_COLUMNS: &[&str] = &["CUI", "NEW_CUI"];

/// One row of the crosswalk, reduced to the three identifier spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrosswalkRecord {
    pub canonical_id: Option<String>,
    pub thesaurus_id: Option<String>,
    pub metathesaurus_id: Option<String>,
}

impl CrosswalkRecord {
    pub fn new(
        canonical_id: Option<&str>,
        thesaurus_id: Option<&str>,
        metathesaurus_id: Option<&str>,
    ) -> Self {
        Self {
            canonical_id: non_empty(canonical_id),
            thesaurus_id: non_empty(thesaurus_id),
            metathesaurus_id: non_empty(metathesaurus_id),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// The four record sets of the dump, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrosswalkBatch {
    All,
    Merged,
    New,
    Deleted,
}

impl CrosswalkBatch {
    pub const PRECEDENCE: [CrosswalkBatch; 4] = [
        CrosswalkBatch::All,
        CrosswalkBatch::Merged,
        CrosswalkBatch::New,
        CrosswalkBatch::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrosswalkBatch::All => "all",
            CrosswalkBatch::Merged => "merged",
            CrosswalkBatch::New => "new",
            CrosswalkBatch::Deleted => "deleted",
        }
    }
}

/// File names of the four batches inside a crosswalk directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrosswalkFiles {
    pub all: String,
    pub merged: String,
    pub new: String,
    pub deleted: String,
}

impl Default for CrosswalkFiles {
    fn default() -> Self {
        Self {
            all: "meta-kg-dump-mesh2020.tsv".to_string(),
            merged: "meta-kg-dump-mesh2020-merged_concepts.tsv".to_string(),
            new: "meta-kg-dump-mesh2020-new_concepts.tsv".to_string(),
            deleted: "meta-kg-dump-mesh2020-deleted_concepts.tsv".to_string(),
        }
    }
}

impl CrosswalkFiles {
    pub fn file_name(&self, batch: CrosswalkBatch) -> &str {
        match batch {
            CrosswalkBatch::All => &self.all,
            CrosswalkBatch::Merged => &self.merged,
            CrosswalkBatch::New => &self.new,
            CrosswalkBatch::Deleted => &self.deleted,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrosswalkError {
    #[error("failed to read crosswalk file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("crosswalk source `{source_name}` has no header row")]
    MissingHeader { source_name: String },
    #[error(
        "crosswalk source `{source_name}` line {line}: expected {expected} fields (per header), found {found}"
    )]
    MalformedRow {
        source_name: String,
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Lookup structure over all loaded crosswalk records.
#[derive(Debug, Clone, Default)]
pub struct CrosswalkTable {
    records: Vec<CrosswalkRecord>,
    by_canonical: HashMap<String, usize>,
    by_thesaurus: HashMap<String, usize>,
    by_metathesaurus: HashMap<String, usize>,
}

impl CrosswalkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from record batches. Batches are applied in precedence
    /// order regardless of the order they are passed in.
    pub fn from_batches(
        batches: impl IntoIterator<Item = (CrosswalkBatch, Vec<CrosswalkRecord>)>,
    ) -> Self {
        let mut batches: Vec<(CrosswalkBatch, Vec<CrosswalkRecord>)> =
            batches.into_iter().collect();
        batches.sort_by_key(|(batch, _)| *batch);

        let mut table = Self::new();
        for (batch, records) in batches {
            tracing::debug!(batch = batch.as_str(), records = records.len(), "crosswalk batch");
            table.extend(records);
        }
        table
    }

    /// Load the four batches from `dir`.
    pub fn load_dir(dir: &Path, files: &CrosswalkFiles) -> Result<Self, CrosswalkError> {
        let mut batches = Vec::with_capacity(CrosswalkBatch::PRECEDENCE.len());
        for batch in CrosswalkBatch::PRECEDENCE {
            let path = dir.join(files.file_name(batch));
            let text = std::fs::read_to_string(&path).map_err(|source| CrosswalkError::Io {
                path: path.clone(),
                source,
            })?;
            let records = parse_tsv(&path.display().to_string(), &text)?;
            batches.push((batch, records));
        }

        let table = Self::from_batches(batches);
        tracing::info!(
            records = table.len(),
            canonical = table.by_canonical.len(),
            thesaurus = table.by_thesaurus.len(),
            metathesaurus = table.by_metathesaurus.len(),
            "loaded crosswalk table"
        );
        Ok(table)
    }

    fn extend(&mut self, records: Vec<CrosswalkRecord>) {
        for record in records {
            let index = self.records.len();
            if let Some(key) = &record.canonical_id {
                self.by_canonical.insert(key.clone(), index);
            }
            if let Some(key) = &record.thesaurus_id {
                self.by_thesaurus.insert(key.clone(), index);
            }
            if let Some(key) = &record.metathesaurus_id {
                self.by_metathesaurus.insert(key.clone(), index);
            }
            self.records.push(record);
        }
    }

    pub fn lookup_by_thesaurus_id(&self, id: &str) -> Option<&CrosswalkRecord> {
        self.by_thesaurus.get(id).map(|&i| &self.records[i])
    }

    pub fn lookup_by_canonical_id(&self, id: &str) -> Option<&CrosswalkRecord> {
        self.by_canonical.get(id).map(|&i| &self.records[i])
    }

    pub fn lookup_by_metathesaurus_id(&self, id: &str) -> Option<&CrosswalkRecord> {
        self.by_metathesaurus.get(id).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse one tab-separated dump. `source_name` is only used in errors.
pub fn parse_tsv(source_name: &str, text: &str) -> Result<Vec<CrosswalkRecord>, CrosswalkError> {
    let mut lines = text
        .split('\n')
        .enumerate()
        .map(|(i, line)| (i + 1, line.strip_suffix('\r').unwrap_or(line)))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header_line)) = lines.next() else {
        return Err(CrosswalkError::MissingHeader {
            source_name: source_name.to_string(),
        });
    };
    let header: Vec<&str> = header_line.split('\t').map(str::trim).collect();

    let column = |aliases: &[&str]| header.iter().position(|h| aliases.contains(h));
    let canonical_col = column(CANONICAL_ID_COLUMNS);
    let thesaurus_col = column(THESAURUS_ID_COLUMNS);
    let metathesaurus_col = column(METATHESAURUS_ID_COLUMNS);

    let mut out = Vec::new();
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != header.len() {
            return Err(CrosswalkError::MalformedRow {
                source_name: source_name.to_string(),
                line: line_no,
                expected: header.len(),
                found: fields.len(),
            });
        }
        let field = |col: Option<usize>| col.map(|c| fields[c]);
        out.push(CrosswalkRecord::new(
            field(canonical_col),
            field(thesaurus_col),
            field(metathesaurus_col),
        ));
    }
    Ok(out)
}
