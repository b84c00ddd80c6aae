use crate::enrichment::AnnotationCollection;
use crate::targets::TargetSet;
use std::collections::{BTreeSet, HashSet};

/// Number of distinct entities across every annotation set (including ones
/// too small to be tested) and the target set.
pub fn universe_size(collection: &AnnotationCollection, targets: &TargetSet) -> usize {
    let mut universe: HashSet<&str> = collection
        .iter()
        .flat_map(|(_, members)| members.iter().map(String::as_str))
        .collect();
    universe.extend(targets.genes());
    universe.len()
}

/// Number of members of `annotation` that are also targets.
pub fn overlap(annotation: &BTreeSet<String>, targets: &HashSet<&str>) -> usize {
    annotation
        .iter()
        .filter(|m| targets.contains(m.as_str()))
        .count()
}
