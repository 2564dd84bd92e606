//! Attribute diffs between two views of the same resource.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::flatmap::path_within;

/// Paths always elided from import comparisons.
pub const ALWAYS_IGNORED: &[&str] = &["timeouts"];

/// One diverging attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDiff {
    pub path: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl fmt::Display for AttributeDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<String>| match v {
            Some(v) => format!("{v:?}"),
            None => "<absent>".to_string(),
        };
        write!(
            f,
            "{}: {} => {}",
            self.path,
            show(&self.before),
            show(&self.after)
        )
    }
}

/// Compare two flat attribute maps, skipping every path within `ignore`.
///
/// A collection count (`name.#` or `name.%`) is compared over the children
/// that survive the ignore list, so eliding `tags.foo` does not surface as a
/// `tags.%` mismatch. Results are ordered by path.
pub fn diff_attributes(
    before: &BTreeMap<String, String>,
    after: &BTreeMap<String, String>,
    ignore: &[String],
) -> Vec<AttributeDiff> {
    let ignored = |path: &str| {
        ALWAYS_IGNORED.iter().any(|p| path_within(path, p))
            || ignore.iter().any(|p| path_within(path, p))
    };

    let paths: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    paths
        .into_iter()
        .filter(|path| !ignored(path))
        .filter_map(|path| {
            let (b, a) = match count_parent(path) {
                Some(parent) if has_ignored_child(parent, before, after, &ignored) => (
                    remaining_count(parent, path, before, &ignored),
                    remaining_count(parent, path, after, &ignored),
                ),
                _ => (before.get(path).cloned(), after.get(path).cloned()),
            };
            (b != a).then(|| AttributeDiff {
                path: path.clone(),
                before: b,
                after: a,
            })
        })
        .collect()
}

/// `tags` for `tags.%`, `flavor` for `flavor.#`.
fn count_parent(path: &str) -> Option<&str> {
    path.strip_suffix(".%").or_else(|| path.strip_suffix(".#"))
}

fn children<'m>(
    parent: &'m str,
    count_path: &'m str,
    attrs: &'m BTreeMap<String, String>,
) -> impl Iterator<Item = &'m String> + 'm {
    attrs.keys().filter(move |k| {
        k.as_str() != count_path && k.as_str() != parent && path_within(k, parent)
    })
}

fn has_ignored_child(
    parent: &str,
    before: &BTreeMap<String, String>,
    after: &BTreeMap<String, String>,
    ignored: &dyn Fn(&str) -> bool,
) -> bool {
    let marker_pct = format!("{parent}.%");
    let marker_hash = format!("{parent}.#");
    before.keys().chain(after.keys()).any(|k| {
        *k != marker_pct
            && *k != marker_hash
            && k.as_str() != parent
            && path_within(k, parent)
            && ignored(k)
    })
}

/// The count recomputed from children that are not ignored. Absent when the
/// map has no count at `count_path`.
fn remaining_count(
    parent: &str,
    count_path: &str,
    attrs: &BTreeMap<String, String>,
    ignored: &dyn Fn(&str) -> bool,
) -> Option<String> {
    attrs.get(count_path)?;
    let offset = parent.len() + 1;
    let elements: BTreeSet<&str> = children(parent, count_path, attrs)
        .filter(|k| !ignored(k))
        .map(|k| {
            let rest = &k[offset..];
            rest.split_once('.').map_or(rest, |(head, _)| head)
        })
        .collect();
    Some(elements.len().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_identical_maps_have_no_diff() {
        let a = attrs(&[("id", "1"), ("name", "x")]);
        assert!(diff_attributes(&a, &a.clone(), &[]).is_empty());
    }

    #[test]
    fn test_reports_changed_missing_and_extra() {
        let before = attrs(&[("id", "1"), ("name", "x"), ("mode", "single")]);
        let after = attrs(&[("id", "1"), ("name", "y"), ("port", "8635")]);
        let diffs = diff_attributes(&before, &after, &[]);
        let paths: Vec<_> = diffs.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["mode", "name", "port"]);
        assert_eq!(diffs[1].to_string(), "name: \"x\" => \"y\"");
        assert_eq!(diffs[2].before, None);
    }

    #[test]
    fn test_ignore_elides_nested_paths() {
        let before = attrs(&[
            ("id", "1"),
            ("password", "secret"),
            ("flavor.#", "1"),
            ("flavor.0.num", "3"),
            ("availability_zone", "eu-de-01"),
            ("timeouts.create", "30m"),
        ]);
        let after = attrs(&[("id", "1"), ("availability_zone", "eu-de-02")]);
        let ignore = vec![
            "flavor".to_string(),
            "password".to_string(),
            "availability_zone".to_string(),
        ];
        assert!(diff_attributes(&before, &after, &ignore).is_empty());
    }

    #[test]
    fn test_count_ignores_elided_map_entries() {
        let before = attrs(&[
            ("tags.%", "2"),
            ("tags.foo", "bar"),
            ("tags.key", "value"),
        ]);
        let after = attrs(&[("tags.%", "1"), ("tags.key", "value")]);
        let diffs = diff_attributes(&before, &after, &["tags.foo".to_string()]);
        assert!(diffs.is_empty(), "{diffs:?}");
    }

    #[test]
    fn test_count_still_reports_real_length_changes() {
        let before = attrs(&[
            ("tags.%", "2"),
            ("tags.foo", "bar"),
            ("tags.key", "value"),
        ]);
        let after = attrs(&[("tags.%", "2"), ("tags.foo", "bar"), ("tags.other", "x")]);
        let diffs = diff_attributes(&before, &after, &["tags.foo".to_string()]);
        let paths: Vec<_> = diffs.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["tags.key", "tags.other"]);

        let grown = attrs(&[
            ("tags.%", "3"),
            ("tags.foo", "bar"),
            ("tags.key", "value"),
            ("tags.new", "1"),
        ]);
        let diffs = diff_attributes(&before, &grown, &["tags.foo".to_string()]);
        let counts: Vec<_> = diffs.iter().filter(|d| d.path == "tags.%").collect();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].before.as_deref(), Some("1"));
        assert_eq!(counts[0].after.as_deref(), Some("2"));
    }

    #[test]
    fn test_list_count_ignores_elided_elements() {
        let before = attrs(&[
            ("rules.#", "2"),
            ("rules.0.port", "22"),
            ("rules.1.port", "80"),
        ]);
        let after = attrs(&[("rules.#", "1"), ("rules.0.port", "22")]);
        let diffs = diff_attributes(&before, &after, &["rules.1".to_string()]);
        assert!(diffs.is_empty(), "{diffs:?}");
    }
}
