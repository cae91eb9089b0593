//! Tabular export of the disease ontology below its root.
//!
//! Five tables, one row per fact, columns in alphabetical order:
//! `disease` (labeled classes), `parent` (direct superclasses that carry a
//! label), `xref` (every `exactMatch`), `synonym` (every exact synonym) and
//! `rare` (labeled classes whose superclass axioms, on themselves or an
//! ancestor, carry the configured rare modifier).

use metaskos_core::query::{preferred_literal, reachable_objects, reachable_subjects};
use metaskos_core::{GraphQuery, MergeConfig, NodeClass, Relation};
use std::collections::BTreeSet;
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiseaseTable {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl DiseaseTable {
    fn new(name: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            name,
            columns,
            rows: Vec::new(),
        }
    }

    /// Header line, then one line per row. Tabs and line breaks inside
    /// values become spaces.
    pub fn write_tsv<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", self.columns.join("\t"))?;
        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|v| v.replace(['\t', '\n', '\r'], " "))
                .collect();
            writeln!(out, "{}", cells.join("\t"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiseaseTables {
    pub disease: DiseaseTable,
    pub parent: DiseaseTable,
    pub xref: DiseaseTable,
    pub synonym: DiseaseTable,
    pub rare: DiseaseTable,
}

impl DiseaseTables {
    pub fn iter(&self) -> impl Iterator<Item = &DiseaseTable> {
        [
            &self.disease,
            &self.parent,
            &self.xref,
            &self.synonym,
            &self.rare,
        ]
        .into_iter()
    }
}

pub fn disease_tables<G: GraphQuery + ?Sized>(graph: &G, config: &MergeConfig) -> DiseaseTables {
    let language = config.label_language.as_str();
    let root = config.ontology_root.as_str();
    let under_root = reachable_subjects(graph, root, Relation::SubClassOf);
    let label = |node: &str| preferred_literal(graph, node, Relation::Label, language);

    let mut tables = DiseaseTables {
        disease: DiseaseTable::new("disease", &["mondo_id", "name"]),
        parent: DiseaseTable::new("parent", &["mondo_id", "name", "parent_id", "parent_name"]),
        xref: DiseaseTable::new("xref", &["mondo_id", "xref"]),
        synonym: DiseaseTable::new("synonym", &["mondo_id", "synonym"]),
        rare: DiseaseTable::new("rare", &["mondo_id"]),
    };

    let classes = graph
        .instances_of(NodeClass::OwlClass)
        .into_iter()
        .filter(|c| c != root && under_root.contains(c));

    for class in classes {
        for xref in graph.objects(&class, Relation::ExactMatch) {
            tables.xref.rows.push(vec![class.clone(), xref]);
        }
        let synonyms: BTreeSet<String> = graph
            .literals(&class, Relation::ExactSynonym)
            .into_iter()
            .map(|l| l.lexical)
            .collect();
        for synonym in synonyms {
            tables.synonym.rows.push(vec![class.clone(), synonym]);
        }

        let Some(name) = label(&class) else {
            continue;
        };
        tables.disease.rows.push(vec![class.clone(), name.clone()]);
        for parent in graph.objects(&class, Relation::SubClassOf) {
            if let Some(parent_name) = label(&parent) {
                tables
                    .parent
                    .rows
                    .push(vec![class.clone(), name.clone(), parent, parent_name]);
            }
        }
        let rare = reachable_objects(graph, &class, Relation::SubClassOf)
            .iter()
            .any(|holder| {
                graph
                    .objects(holder, Relation::HasModifier)
                    .contains(&config.rare_modifier)
            });
        if rare {
            tables.rare.rows.push(vec![class]);
        }
    }

    tracing::info!(
        diseases = tables.disease.rows.len(),
        parents = tables.parent.rows.len(),
        xrefs = tables.xref.rows.len(),
        synonyms = tables.synonym.rows.len(),
        rare = tables.rare.rows.len(),
        "collected disease tables"
    );
    tables
}
