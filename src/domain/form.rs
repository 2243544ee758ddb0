//! Create-form state and its conversion into a submission draft.
//!
//! The raw comma-separated category text is turned into uppercase tags here and
//! nowhere else; everything downstream only ever sees `Vec<String>`.

use monk_api_types::BlogCreateRequest;
use time::OffsetDateTime;

use super::error::FormError;

/// Transient state of the create view. Dropped when the view is left.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogForm {
    pub title: String,
    pub category: String,
    pub description: String,
    pub content: String,
    pub cover_image: String,
}

/// A blog ready to be sent to the remote collaborator, without an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogDraft {
    pub title: String,
    pub category: Vec<String>,
    pub description: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub date: OffsetDateTime,
}

impl BlogForm {
    /// Validate the form and build a draft stamped with `date`.
    ///
    /// The form itself is left untouched so a failed submission can be retried
    /// without retyping.
    pub fn submit(&self, date: OffsetDateTime) -> Result<BlogDraft, FormError> {
        let title = required("title", &self.title)?;
        let category = parse_categories(&self.category);
        if category.is_empty() {
            return Err(FormError::missing("category"));
        }
        let description = required("description", &self.description)?;
        let content = required("content", &self.content)?;
        let cover_image = Some(self.cover_image.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        Ok(BlogDraft {
            title,
            category,
            description,
            content,
            cover_image,
            date,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, FormError> {
    if value.trim().is_empty() {
        return Err(FormError::missing(field));
    }
    Ok(value.to_string())
}

/// Split `"tech, news"` into `["TECH", "NEWS"]`, dropping empty tokens.
pub fn parse_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_uppercase)
        .collect()
}

impl From<BlogDraft> for BlogCreateRequest {
    fn from(draft: BlogDraft) -> Self {
        Self {
            title: draft.title,
            category: draft.category,
            description: draft.description,
            content: draft.content,
            cover_image: draft.cover_image,
            date: draft.date,
        }
    }
}
