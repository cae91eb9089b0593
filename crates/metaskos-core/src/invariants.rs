//! Structural checks over a finished (or loaded) store.

use crate::model::CanonicalId;
use crate::store::ConceptStore;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// `child` lists `parent` as broader but `parent` does not list `child` as narrower.
    MissingNarrower { parent: CanonicalId, child: CanonicalId },
    /// `parent` lists `child` as narrower but `child` does not list `parent` as broader.
    MissingBroader { parent: CanonicalId, child: CanonicalId },
    /// An edge points at a concept the store does not contain.
    DanglingEdge { from: CanonicalId, to: CanonicalId },
    SelfLoop(CanonicalId),
    Unlabeled(CanonicalId),
}

impl InvariantViolation {
    /// Unlabeled concepts are tolerated; everything else is structural.
    pub fn is_structural(&self) -> bool {
        !matches!(self, InvariantViolation::Unlabeled(_))
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::MissingNarrower { parent, child } => {
                write!(f, "{child} has broader {parent} without the reciprocal narrower edge")
            }
            InvariantViolation::MissingBroader { parent, child } => {
                write!(f, "{parent} has narrower {child} without the reciprocal broader edge")
            }
            InvariantViolation::DanglingEdge { from, to } => {
                write!(f, "{from} links to unknown concept {to}")
            }
            InvariantViolation::SelfLoop(id) => write!(f, "{id} is linked to itself"),
            InvariantViolation::Unlabeled(id) => write!(f, "{id} has no label"),
        }
    }
}

pub fn verify_invariants(store: &ConceptStore) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for concept in store.concepts() {
        let id = &concept.id;
        if concept.broader.contains(id) || concept.narrower.contains(id) {
            violations.push(InvariantViolation::SelfLoop(id.clone()));
        }
        if !concept.is_labeled() {
            violations.push(InvariantViolation::Unlabeled(id.clone()));
        }

        for parent in concept.broader.iter().filter(|p| *p != id) {
            match store.get(parent) {
                None => violations.push(InvariantViolation::DanglingEdge {
                    from: id.clone(),
                    to: parent.clone(),
                }),
                Some(p) if !p.narrower.contains(id) => {
                    violations.push(InvariantViolation::MissingNarrower {
                        parent: parent.clone(),
                        child: id.clone(),
                    })
                }
                Some(_) => {}
            }
        }
        for child in concept.narrower.iter().filter(|c| *c != id) {
            match store.get(child) {
                None => violations.push(InvariantViolation::DanglingEdge {
                    from: id.clone(),
                    to: child.clone(),
                }),
                Some(c) if !c.broader.contains(id) => {
                    violations.push(InvariantViolation::MissingBroader {
                        parent: id.clone(),
                        child: child.clone(),
                    })
                }
                Some(_) => {}
            }
        }
    }

    violations
}
