//! Cycle detection over the parent-edge graph.
//!
//! Keys form a directed graph through their parent edges (child to
//! parents, `_root` included). A key is cyclic when following parents
//! outward leads back to it.

use std::collections::HashSet;

/// Find a derivation chain leading from `key` back to itself.
///
/// `parents_of` lists the parent keys of a key; unknown keys (and
/// `_root`) have none. Each parent is visited at most once per call.
/// The trail starts and ends with `key`, e.g. `[A, B, A]`.
pub fn detect_cycle<F, I>(key: &str, parents_of: F) -> Option<Vec<String>>
where
    F: Fn(&str) -> I,
    I: IntoIterator<Item = String>,
{
    let mut checked = HashSet::new();
    let mut trail = vec![key.to_string()];
    let parents: Vec<String> = parents_of(key).into_iter().collect();
    walk(key, parents, &mut trail, &mut checked, &parents_of).then_some(trail)
}

/// Depth-first search outward; `trail` holds the current path.
fn walk<F, I>(
    key: &str,
    parents: Vec<String>,
    trail: &mut Vec<String>,
    checked: &mut HashSet<String>,
    parents_of: &F,
) -> bool
where
    F: Fn(&str) -> I,
    I: IntoIterator<Item = String>,
{
    if let Some(closing) = parents.iter().find(|parent| parent.as_str() == key) {
        trail.push(closing.clone());
        return true;
    }

    for parent in parents {
        if !checked.insert(parent.clone()) {
            continue;
        }
        let grandparents: Vec<String> = parents_of(&parent).into_iter().collect();
        if grandparents.is_empty() {
            continue;
        }
        trail.push(parent);
        if walk(key, grandparents, trail, checked, parents_of) {
            return true;
        }
        trail.pop();
    }

    false
}
