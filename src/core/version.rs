//! Dotted numeric version comparison.

use std::cmp::Ordering;

/// Compare two dotted version strings component by component.
///
/// Missing trailing components count as `0`, so `2.0 == 2.0.0`. Each
/// component is read as its leading decimal digits; a component without any
/// (e.g. `beta`) counts as `0`. Pre-release suffixes are therefore not
/// distinguished: `1.0.0-rc1` compares equal to `1.0.0`.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use pmw::core::version::compare_versions;
///
/// assert_eq!(compare_versions("2.1.0", "2.0.9"), Ordering::Greater);
/// assert_eq!(compare_versions("2.0", "2.0.0"), Ordering::Equal);
/// assert_eq!(compare_versions("1.9", "1.10"), Ordering::Less);
/// ```
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<u64> = a.split('.').map(component_value).collect();
    let right: Vec<u64> = b.split('.').map(component_value).collect();
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Strip a single leading `v` from a tag name.
pub fn normalize_tag(name: &str) -> &str {
    name.strip_prefix('v').unwrap_or(name)
}

fn component_value(component: &str) -> u64 {
    let digits: &str = component
        .find(|c: char| !c.is_ascii_digit())
        .map_or(component, |end| &component[..end]);
    digits.parse().unwrap_or(0)
}
