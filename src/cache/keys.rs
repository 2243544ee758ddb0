//! Query key definitions.
//!
//! A `QueryKey` is an ordered list of segments. Invalidation works on key
//! prefixes, so `["blog"]` reaches every `["blog", id]` entry while leaving
//! `["blogs"]` alone.

use std::fmt;

use crate::domain::BlogId;

const BLOGS: &str = "blogs";
const BLOG: &str = "blog";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// The blog collection: `["blogs"]`.
    pub fn blogs() -> Self {
        Self::new([BLOGS])
    }

    /// A single blog: `["blog", id]`.
    pub fn blog(id: &BlogId) -> Self {
        Self::new([BLOG, id.as_str()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Segment-wise prefix test. The empty key is a prefix of every key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, segment) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{segment:?}")?;
        }
        f.write_str("]")
    }
}
