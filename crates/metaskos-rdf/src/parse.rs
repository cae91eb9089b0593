//! Streaming RDF statement parsing via `sophia`.
//!
//! Terms are read through their N-Triples display form, which is stable
//! across every sophia parser we use, then handed to a callback one
//! statement at a time. Quads are flattened into the default graph.

use anyhow::{anyhow, Result};
use sophia::api::prelude::*;
use std::io::BufRead;
use std::path::Path;

// ============================================================================
// Term model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RdfNode {
    Iri(String),
    BlankNode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RdfLiteral {
    pub lexical: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RdfObject {
    Node(RdfNode),
    Literal(RdfLiteral),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdfStatement {
    pub subject: RdfNode,
    pub predicate_iri: String,
    pub object: RdfObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    NTriples,
    Turtle,
    NQuads,
    TriG,
    RdfXml,
}

impl RdfFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "nt" | "ntriples" => Some(Self::NTriples),
            "ttl" | "turtle" => Some(Self::Turtle),
            "nq" | "nquads" => Some(Self::NQuads),
            "trig" => Some(Self::TriG),
            "rdf" | "owl" | "xml" => Some(Self::RdfXml),
            _ => None,
        }
    }

    /// Format implied by a file's extension.
    pub fn for_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow!("cannot infer RDF format for {}: no extension", path.display()))?;
        Self::from_extension(ext)
            .ok_or_else(|| anyhow!("unsupported RDF extension `.{ext}` for {}", path.display()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NTriples => "ntriples",
            Self::Turtle => "turtle",
            Self::NQuads => "nquads",
            Self::TriG => "trig",
            Self::RdfXml => "rdfxml",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct RdfSinkError {
    message: String,
}

impl From<anyhow::Error> for RdfSinkError {
    fn from(value: anyhow::Error) -> Self {
        Self {
            message: value.to_string(),
        }
    }
}

// ============================================================================
// Display-form term parsing
// ============================================================================

fn unescape_rdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('u') => push_code_point(&mut out, &mut chars, 4),
            Some('U') => push_code_point(&mut out, &mut chars, 8),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn push_code_point(out: &mut String, chars: &mut std::str::Chars<'_>, width: usize) {
    let hex: String = chars.by_ref().take(width).collect();
    match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
        Some(c) if hex.len() == width => out.push(c),
        _ => {
            out.push_str(if width == 4 { "\\u" } else { "\\U" });
            out.push_str(&hex);
        }
    }
}

pub(crate) fn parse_term_display(term: &str) -> Result<RdfObject> {
    let s = term.trim();

    if let Some(rest) = s.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Ok(RdfObject::Node(RdfNode::Iri(rest.to_string())));
    }

    if let Some(rest) = s.strip_prefix("_:") {
        return Ok(RdfObject::Node(RdfNode::BlankNode(rest.to_string())));
    }

    if s.starts_with('"') {
        let mut end_quote = None;
        let mut escaped = false;
        for (i, ch) in s.char_indices().skip(1) {
            if escaped {
                escaped = false;
                continue;
            }
            match ch {
                '\\' => escaped = true,
                '"' => {
                    end_quote = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let Some(end) = end_quote else {
            return Err(anyhow!("invalid literal term (missing closing quote): {s}"));
        };

        let lexical = unescape_rdf_string(&s[1..end]);
        let rest = s[end + 1..].trim();

        let mut language = None;
        let mut datatype = None;
        if let Some(lang) = rest.strip_prefix('@') {
            language = Some(lang.to_string());
        } else if let Some(dt) = rest.strip_prefix("^^") {
            let dt = dt.trim();
            if let Some(dt_iri) = dt.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
                datatype = Some(dt_iri.to_string());
            } else if !dt.is_empty() {
                datatype = Some(dt.to_string());
            }
        }

        return Ok(RdfObject::Literal(RdfLiteral {
            lexical,
            datatype,
            language,
        }));
    }

    Err(anyhow!("unsupported RDF term form: {s}"))
}

fn parse_node_term_display(term: &str) -> Result<RdfNode> {
    match parse_term_display(term)? {
        RdfObject::Node(node) => Ok(node),
        RdfObject::Literal(_) => Err(anyhow!("expected IRI/blank node, got literal: {term}")),
    }
}

fn statement_from_display(subject: &str, predicate: &str, object: &str) -> Result<Option<RdfStatement>> {
    let subject = parse_node_term_display(subject)?;
    let RdfNode::Iri(predicate_iri) = parse_node_term_display(predicate)? else {
        return Ok(None);
    };
    let object = parse_term_display(object)?;
    Ok(Some(RdfStatement {
        subject,
        predicate_iri,
        object,
    }))
}

// ============================================================================
// Streaming entry point
// ============================================================================

/// Parse `reader` as `format`, calling `on_statement` for every statement.
pub fn for_each_statement<R, F>(reader: R, format: RdfFormat, mut on_statement: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(RdfStatement) -> Result<()>,
{
    let mut emit = |s: String, p: String, o: String| -> std::result::Result<(), RdfSinkError> {
        if let Some(statement) = statement_from_display(&s, &p, &o)? {
            on_statement(statement)?;
        }
        Ok(())
    };

    match format {
        RdfFormat::NTriples => sophia::turtle::parser::nt::parse_bufread(reader)
            .try_for_each_triple(|t| emit(t.s().to_string(), t.p().to_string(), t.o().to_string()))
            .map_err(|e| anyhow!("failed to parse N-Triples: {e}")),
        RdfFormat::Turtle => sophia::turtle::parser::turtle::parse_bufread(reader)
            .try_for_each_triple(|t| emit(t.s().to_string(), t.p().to_string(), t.o().to_string()))
            .map_err(|e| anyhow!("failed to parse Turtle: {e}")),
        RdfFormat::NQuads => sophia::turtle::parser::nq::parse_bufread(reader)
            .try_for_each_quad(|q| emit(q.s().to_string(), q.p().to_string(), q.o().to_string()))
            .map_err(|e| anyhow!("failed to parse N-Quads: {e}")),
        RdfFormat::TriG => sophia::turtle::parser::trig::parse_bufread(reader)
            .try_for_each_quad(|q| emit(q.s().to_string(), q.p().to_string(), q.o().to_string()))
            .map_err(|e| anyhow!("failed to parse TriG: {e}")),
        RdfFormat::RdfXml => sophia::xml::parser::parse_bufread(reader)
            .try_for_each_triple(|t| emit(t.s().to_string(), t.p().to_string(), t.o().to_string()))
            .map_err(|e| anyhow!("failed to parse RDF/XML: {e}")),
    }
}
