//! Name-keyed annotation reconciliation.

use crate::model::AnnotationTag;

/// Merge `desired` into `existing`.
///
/// For each desired tag in order, every existing tag with the same name is
/// removed and the desired tag is appended. Argument values are never
/// compared, so a merge that leaves the list textually identical still
/// reports `true`. Only an empty `desired` returns `false`.
pub fn merge(existing: &mut Vec<AnnotationTag>, desired: &[AnnotationTag]) -> bool {
    for tag in desired {
        existing.retain(|current| current.name != tag.name);
        existing.push(tag.clone());
    }
    !desired.is_empty()
}
