//! Concept-scheme assignment.
//!
//! One umbrella scheme per category letter (`scheme_C`) and one scheme per
//! first-level tree (`C08`), keyed by the canonical id of the tree's top
//! descriptor (`concept_100` -> `scheme_100`).

use crate::error::MergeError;
use crate::thesaurus::{labeled_in, preferred_concept, resolve_thesaurus_node, tree_numbers};
use crate::MergeContext;
use metaskos_core::query::reachable_objects;
use metaskos_core::{
    category_label, category_scheme_id, GraphQuery, NodeClass, Relation, THESAURUS_CATEGORIES,
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemeReport {
    pub category_schemes: usize,
    pub tree_schemes: usize,
    pub memberships_added: usize,
}

struct TopCandidate {
    depth: usize,
    tree_number: String,
    descriptor: String,
    label: String,
}

/// First-level tree of a tree number (`C08.127.446` -> `C08`).
pub fn top_tree(tree_number: &str) -> &str {
    tree_number.split('.').next().unwrap_or(tree_number)
}

pub fn assign_schemes<G: GraphQuery + ?Sized>(
    ctx: &mut MergeContext<'_>,
    graph: &G,
) -> Result<SchemeReport, MergeError> {
    let mut report = SchemeReport::default();
    for (letter, label) in THESAURUS_CATEGORIES {
        ctx.store.ensure_scheme(&category_scheme_id(*letter), label);
        report.category_schemes += 1;
    }

    let language = ctx.config.label_language.clone();
    let mut descriptors = Vec::new();
    for descriptor in graph.instances_of(NodeClass::TopicalDescriptor) {
        let Some(label) = labeled_in(graph, &descriptor, &language) else {
            continue;
        };
        let trees = tree_numbers(graph, &descriptor);
        descriptors.push((descriptor, label, trees));
    }

    // The top node of a tree is the descriptor carrying the bare tree number,
    // else the shallowest one (ties broken by tree number).
    let mut tops: BTreeMap<String, TopCandidate> = BTreeMap::new();
    for (descriptor, label, trees) in &descriptors {
        for tree_number in trees {
            let candidate = TopCandidate {
                depth: tree_number.matches('.').count(),
                tree_number: tree_number.clone(),
                descriptor: descriptor.clone(),
                label: label.clone(),
            };
            let key = top_tree(tree_number).to_string();
            let better = tops.get(&key).map_or(true, |current| {
                (candidate.depth, &candidate.tree_number) < (current.depth, &current.tree_number)
            });
            if better {
                tops.insert(key, candidate);
            }
        }
    }

    let mut scheme_of_tree: BTreeMap<String, String> = BTreeMap::new();
    let mut populated = 0;
    for (tree, top) in &tops {
        let preferred = preferred_concept(graph, &top.descriptor, &top.label)?;
        let id = resolve_thesaurus_node(ctx, graph, Some(&top.descriptor), &preferred, &mut populated);
        let scheme_id = id.scheme_id();
        if ctx.store.scheme(&scheme_id).is_none() {
            report.tree_schemes += 1;
        }
        ctx.store.ensure_scheme(&scheme_id, &top.label);
        ctx.store.set_top_concept(&scheme_id, &id);

        if let Some(letter) = tree.chars().next().filter(|c| category_label(*c).is_some()) {
            if ctx.store.add_to_scheme(&id, &category_scheme_id(letter)) {
                report.memberships_added += 1;
            }
        }
        tracing::debug!(tree = %tree, descriptor = %top.descriptor, scheme = %scheme_id, "tree scheme");
        scheme_of_tree.insert(tree.clone(), scheme_id);
    }

    for (descriptor, _, trees) in &descriptors {
        let Some(id) = ctx.store.lookup(descriptor).cloned() else {
            continue;
        };
        let mut members = vec![id];
        if let Some(preferred) = graph.objects(descriptor, Relation::PreferredConcept).first() {
            members.extend(
                reachable_objects(graph, preferred, Relation::NarrowerConcept)
                    .iter()
                    .filter_map(|node| ctx.store.lookup(node).cloned()),
            );
        }
        for tree_number in trees {
            let Some(scheme_id) = scheme_of_tree.get(top_tree(tree_number)) else {
                continue;
            };
            for member in &members {
                if ctx.store.add_to_scheme(member, scheme_id) {
                    report.memberships_added += 1;
                }
            }
        }
    }

    tracing::info!(
        categories = report.category_schemes,
        trees = report.tree_schemes,
        memberships = report.memberships_added,
        "schemes assigned"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_tree_is_prefix_before_first_dot() {
        assert_eq!(top_tree("C08.127.446"), "C08");
        assert_eq!(top_tree("C08"), "C08");
    }
}
