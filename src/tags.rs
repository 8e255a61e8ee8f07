//! Tag sets attached to image variants.
//!
//! A [`Tags`] value is an ordered, duplicate-free list of string labels. Order
//! is first-seen insertion order so results print and compare deterministically;
//! membership follows set semantics. Every operation returns a new value, so a
//! tag set handed to several variants during fan-out can never be mutated
//! through one of them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

/// Tag carried by the source image passed to [`Pipeline::run`](crate::Pipeline::run).
pub const ORIGINAL: &str = "original";

/// Tag added by [`Resizer`](crate::stages::Resizer) to every derived image.
pub const RESIZED: &str = "resized";

/// Tag added by [`Compressor`](crate::stages::Compressor) to every compressed image.
pub const COMPRESSED: &str = "compressed";

/// Prefix of the tag naming the configured size of a resized image (`size=md`).
pub const SIZE_PREFIX: &str = "size=";

/// Ordered set of tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Tags(Vec<String>);

impl Tags {
    /// Build a tag set from any list of labels. Duplicates are removed.
    pub fn new<I>(tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self(unique(tags.into_iter().map(Into::into)))
    }

    /// Returns a copy with `add` appended, keeping the first occurrence of each tag.
    pub fn with<I>(&self, add: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self(unique(
            self.0.iter().cloned().chain(add.into_iter().map(Into::into)),
        ))
    }

    /// Returns a copy without any of the tags in `remove`.
    pub fn without<I>(&self, remove: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let remove: Vec<I::Item> = remove.into_iter().collect();
        Self(
            self.0
                .iter()
                .filter(|tag| !remove.iter().any(|r| r.as_ref() == tag.as_str()))
                .cloned()
                .collect(),
        )
    }

    pub fn contains(&self, tag: &str) -> bool {
        contains(&self.0, &tag)
    }

    /// Returns the tags accepted by `pred`, in order.
    pub fn matching<F>(&self, mut pred: F) -> Vec<&str>
    where
        F: FnMut(&str) -> bool,
    {
        self.0
            .iter()
            .map(String::as_str)
            .filter(|tag| pred(tag))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Tags {
    fn from(tags: Vec<String>) -> Self {
        Self::new(tags)
    }
}

impl From<Tags> for Vec<String> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}

impl<S: Into<String>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a str;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, String>, fn(&String) -> &str>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.join(", "))
    }
}

/// Remove duplicates, keeping the first occurrence of each value.
pub fn unique<T, I>(values: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Whether `needle` occurs in `haystack`.
pub fn contains<T, U>(haystack: &[T], needle: &U) -> bool
where
    T: PartialEq<U>,
    U: ?Sized,
{
    haystack.iter().any(|v| v == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_removes_duplicates_keeping_first_order() {
        let tags = Tags::new(["b", "a", "b", "c", "a"]);
        assert_eq!(tags.as_slice(), &["b", "a", "c"]);
    }

    #[test]
    fn with_appends_and_collapses() {
        let base = Tags::new([ORIGINAL]);
        let tags = base.with(["foo", ORIGINAL, "bar", "foo"]);
        assert_eq!(tags.as_slice(), &[ORIGINAL, "foo", "bar"]);
        // receiver untouched
        assert_eq!(base.as_slice(), &[ORIGINAL]);
    }

    #[test]
    fn with_is_idempotent() {
        let once = Tags::new(["x"]).with(["foo", "bar"]);
        let twice = once.with(["foo", "bar"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn without_preserves_remaining_order() {
        let tags = Tags::new(["a", "b", "c", "d"]);
        assert_eq!(tags.without(["b", "d", "zzz"]).as_slice(), &["a", "c"]);
    }

    #[test]
    fn contains_is_exact() {
        let tags = Tags::new(["size=sm"]);
        assert!(tags.contains("size=sm"));
        assert!(!tags.contains("size"));
        assert!(!tags.contains("size=s"));
    }

    #[test]
    fn matching_filters_with_predicate() {
        let tags = Tags::new(["resized", "size=lg", "compressed", "size=x"]);
        assert_eq!(
            tags.matching(|t| t.starts_with(SIZE_PREFIX)),
            vec!["size=lg", "size=x"]
        );
        assert!(tags.matching(|_| false).is_empty());
    }

    #[test]
    fn deserialize_dedups() {
        let tags: Tags = serde_json::from_str(r#"["a","a","b"]"#).unwrap();
        assert_eq!(tags.as_slice(), &["a", "b"]);
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn display_lists_tags() {
        assert_eq!(Tags::new(["a", "b"]).to_string(), "{a, b}");
    }

    #[test]
    fn unique_generic() {
        assert_eq!(unique([3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn contains_generic() {
        assert!(contains(&[1, 2, 3], &2));
        assert!(!contains(&["a".to_string()], "b"));
    }
}
