//! Bounded upward walk from every leaf.
//!
//! Each leaf climbs its superclasses, linking every direct subclass edge on
//! the way. The leaf itself is always expanded; anchors above it are linked
//! but never expanded. The visited set is shared
//! across leaves, so a class reached through several children (diamonds) is
//! expanded exactly once.

use super::OntologyMerger;
use crate::MergeContext;
use metaskos_core::GraphQuery;
use std::collections::HashSet;

pub(super) fn run<G: GraphQuery + ?Sized>(
    ctx: &mut MergeContext<'_>,
    merger: &mut OntologyMerger<'_, G>,
    leaves: &[String],
) {
    let mut visited: HashSet<String> = HashSet::new();

    for leaf in leaves {
        if !visited.insert(leaf.clone()) {
            continue;
        }
        merger.resolve(ctx, leaf);

        let mut stack = vec![leaf.clone()];
        while let Some(class) = stack.pop() {
            let id = merger.resolve(ctx, &class);
            if class == merger.root || (class != *leaf && merger.is_anchor(ctx, &class)) {
                continue;
            }
            for parent in merger.parents(&class) {
                let parent_id = merger.resolve(ctx, &parent);
                merger.link(ctx, &parent_id, &id);
                if visited.insert(parent.clone()) {
                    stack.push(parent);
                }
            }
        }
    }
}
