//! Path-segment grafting, grouped by `(anchor, leaf)`.
//!
//! For a leaf and one of its cross-referenced ancestors, every direct edge
//! `lower ⊑ upper` with `leaf ⊑* lower` and `upper ⊑* anchor` is a segment.
//! Segments are processed deepest first (descending distance of `upper` from
//! the anchor). They accumulate in a buffer until a segment's upper end is
//! already a labeled concept or carries a thesaurus cross-reference; then the
//! buffer is flushed into canonical edges and the climb stops at that node.

use super::OntologyMerger;
use crate::MergeContext;
use metaskos_core::query::{reachable_objects, reachable_subjects};
use metaskos_core::{GraphQuery, MergeEvent, Relation};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    lower: String,
    upper: String,
    position: usize,
}

pub(super) fn run<G: GraphQuery + ?Sized>(
    ctx: &mut MergeContext<'_>,
    merger: &mut OntologyMerger<'_, G>,
    leaves: &[String],
) {
    let mut below_cache: HashMap<String, BTreeSet<String>> = HashMap::new();

    for leaf in leaves {
        let ancestors: BTreeSet<String> = reachable_objects(merger.graph, leaf, Relation::SubClassOf)
            .into_iter()
            .filter(|c| merger.under_root.contains(c))
            .collect();
        let mut anchors = Vec::new();
        for class in &ancestors {
            if *class != merger.root && merger.thesaurus_xref(ctx, class).is_some() {
                anchors.push(class.clone());
            }
        }

        for anchor in anchors {
            let below_anchor = below_cache
                .entry(anchor.clone())
                .or_insert_with(|| reachable_subjects(merger.graph, &anchor, Relation::SubClassOf));
            let segments = segments(merger, &ancestors, below_anchor);
            if segments.is_empty() {
                continue;
            }
            if !merger.is_anchor(ctx, &anchor) {
                merger.report.skipped_groups += 1;
                tracing::debug!(anchor = %anchor, leaf = %leaf, "anchor cross-reference unresolved; skipping paths");
                ctx.sink.record(&MergeEvent::AnchorGroupSkipped {
                    anchor: anchor.clone(),
                    leaf: leaf.clone(),
                });
                continue;
            }

            merger.resolve(ctx, leaf);
            trace_group(ctx, merger, leaf, &anchor, segments);
        }
    }
}

fn trace_group<G: GraphQuery + ?Sized>(
    ctx: &mut MergeContext<'_>,
    merger: &mut OntologyMerger<'_, G>,
    leaf: &str,
    anchor: &str,
    segments: Vec<Segment>,
) {
    let anchor_id = merger.resolve(ctx, anchor);
    let mut reachable: HashSet<String> = HashSet::from([leaf.to_string()]);
    let mut buffer: Vec<Segment> = Vec::new();

    for segment in segments {
        if !reachable.contains(&segment.lower) {
            continue;
        }
        let populated = merger.is_populated(ctx, &segment.upper);
        let cross_referenced = merger.thesaurus_xref(ctx, &segment.upper).is_some();
        let upper = segment.upper.clone();
        buffer.push(segment);

        if !(populated || cross_referenced) {
            reachable.insert(upper);
            continue;
        }

        flush(ctx, merger, &mut buffer);
        if !populated {
            let top_id = merger.resolve(ctx, &upper);
            if top_id != anchor_id {
                merger.link(ctx, &anchor_id, &top_id);
            }
        }
    }

    // Every path ends at the (cross-referenced) anchor, so this only matters
    // for malformed input.
    if !buffer.is_empty() {
        flush(ctx, merger, &mut buffer);
    }
}

fn flush<G: GraphQuery + ?Sized>(
    ctx: &mut MergeContext<'_>,
    merger: &mut OntologyMerger<'_, G>,
    buffer: &mut Vec<Segment>,
) {
    for segment in buffer.drain(..) {
        let upper_id = merger.resolve(ctx, &segment.upper);
        let lower_id = merger.resolve(ctx, &segment.lower);
        merger.link(ctx, &upper_id, &lower_id);
    }
}

/// Segments between `ancestors` (the leaf's ancestors-or-self) and the anchor
/// whose descendants-or-self are `below_anchor`, in processing order.
fn segments<G: GraphQuery + ?Sized>(
    merger: &OntologyMerger<'_, G>,
    ancestors: &BTreeSet<String>,
    below_anchor: &BTreeSet<String>,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    for upper in ancestors.intersection(below_anchor) {
        let position = reachable_objects(merger.graph, upper, Relation::SubClassOf)
            .intersection(below_anchor)
            .count();
        for lower in merger.graph.subjects(Relation::SubClassOf, upper) {
            if ancestors.contains(&lower) {
                segments.push(Segment {
                    lower,
                    upper: upper.clone(),
                    position,
                });
            }
        }
    }
    segments.sort_by(|a, b| {
        (Reverse(a.position), &a.upper, &a.lower).cmp(&(Reverse(b.position), &b.upper, &b.lower))
    });
    segments
}
