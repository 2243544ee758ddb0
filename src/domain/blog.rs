//! Blog entity and its display fallbacks.

use std::fmt;

use monk_api_types::{AuthorRecord, BlogRecord};
use time::OffsetDateTime;

pub const PLACEHOLDER_COVER_IMAGE: &str =
    "https://images.unsplash.com/photo-1497215728101-856f4ea42174?w=800&auto=format&fit=crop&q=60";
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";
pub const DEFAULT_AUTHOR_ROLE: &str = "Author";
pub const DEFAULT_READ_TIME: &str = "5 min read";
pub const DEFAULT_CATEGORY: &str = "GENERAL";

/// Opaque identifier assigned by the remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlogId(String);

impl BlogId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlogId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BlogId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub name: Option<String>,
    pub role: Option<String>,
    pub avatar: Option<String>,
}

impl From<AuthorRecord> for Author {
    fn from(record: AuthorRecord) -> Self {
        Self {
            name: record.name,
            role: record.role,
            avatar: record.avatar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blog {
    pub id: BlogId,
    pub title: String,
    pub category: Vec<String>,
    pub description: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub date: OffsetDateTime,
    pub author: Option<Author>,
    pub read_time: Option<String>,
}

impl Blog {
    /// First tag, or `GENERAL` for an untagged blog.
    pub fn primary_category(&self) -> &str {
        self.category
            .first()
            .map(String::as_str)
            .filter(|tag| !tag.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn cover_image_or_placeholder(&self) -> &str {
        self.cover_image
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(PLACEHOLDER_COVER_IMAGE)
    }

    pub fn read_time_or_default(&self) -> &str {
        self.read_time
            .as_deref()
            .filter(|hint| !hint.is_empty())
            .unwrap_or(DEFAULT_READ_TIME)
    }

    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .and_then(|author| author.name.as_deref())
            .unwrap_or(ANONYMOUS_AUTHOR)
    }

    /// Role line shown under the author name; absent for anonymous blogs.
    pub fn author_role(&self) -> Option<&str> {
        self.author
            .as_ref()
            .map(|author| author.role.as_deref().unwrap_or(DEFAULT_AUTHOR_ROLE))
    }
}

impl From<BlogRecord> for Blog {
    fn from(record: BlogRecord) -> Self {
        Self {
            id: BlogId(record.id),
            title: record.title,
            category: record.category,
            description: record.description,
            content: record.content,
            cover_image: record.cover_image,
            date: record.date,
            author: record.author.map(Author::from),
            read_time: record.read_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn bare_blog() -> Blog {
        Blog {
            id: BlogId::new("1"),
            title: "Hello".into(),
            category: Vec::new(),
            description: String::new(),
            content: String::new(),
            cover_image: None,
            date: datetime!(2025-03-04 10:00:00 UTC),
            author: None,
            read_time: None,
        }
    }

    #[test]
    fn bare_blog_uses_fallbacks() {
        let blog = bare_blog();
        assert_eq!(blog.primary_category(), DEFAULT_CATEGORY);
        assert_eq!(blog.cover_image_or_placeholder(), PLACEHOLDER_COVER_IMAGE);
        assert_eq!(blog.read_time_or_default(), DEFAULT_READ_TIME);
        assert_eq!(blog.author_name(), ANONYMOUS_AUTHOR);
        assert_eq!(blog.author_role(), None);
    }

    #[test]
    fn author_without_role_reads_as_author() {
        let blog = Blog {
            author: Some(Author {
                name: Some("Ada".into()),
                ..Author::default()
            }),
            ..bare_blog()
        };
        assert_eq!(blog.author_name(), "Ada");
        assert_eq!(blog.author_role(), Some(DEFAULT_AUTHOR_ROLE));
    }

    #[test]
    fn converts_from_wire_record() {
        let record = BlogRecord {
            id: "42".into(),
            title: "Rust".into(),
            category: vec!["TECH".into(), "NEWS".into()],
            description: "d".into(),
            content: "c".into(),
            cover_image: Some("https://cdn.example/a.png".into()),
            date: datetime!(2025-03-04 10:00:00 UTC),
            author: None,
            read_time: Some("2 min read".into()),
        };

        let blog = Blog::from(record);
        assert_eq!(blog.id, BlogId::new("42"));
        assert_eq!(blog.primary_category(), "TECH");
        assert_eq!(blog.cover_image_or_placeholder(), "https://cdn.example/a.png");
        assert_eq!(blog.read_time_or_default(), "2 min read");
    }
}
