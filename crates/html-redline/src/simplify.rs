//! Structural simplification.
//!
//! Heavily nested markup produces large cloned subtrees and noisy output.
//! Simplification replaces every element outside an allow-list by its
//! children, leaving text and the permitted structure in place.

use crate::dom::Dom;

/// Unwrap every element whose tag is not in `keep`. Returns how many were removed.
pub fn simplify<S: AsRef<str>>(dom: &mut Dom, keep: &[S]) -> usize {
    let doomed: Vec<_> = dom
        .descendants(dom.document())
        .into_iter()
        .filter(|&id| {
            dom.tag_name(id)
                .is_some_and(|name| !keep.iter().any(|tag| tag.as_ref().eq_ignore_ascii_case(name)))
        })
        .collect();

    for &id in &doomed {
        dom.replace_with_children(id);
    }

    trace!(removed = doomed.len(), "simplified document");
    doomed.len()
}
