//! Wire shapes of the blog API.
//!
//! Field names follow the remote collaborator's camelCase JSON. These types carry
//! no display fallbacks; the `monk` crate converts them into domain records.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Author block attached to a blog. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// A blog as returned by `GET /blogs`, `GET /blogs/{id}` and `POST /blogs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time: Option<String>,
}

/// Body of `POST /blogs`. The server assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogCreateRequest {
    pub title: String,
    pub category: Vec<String>,
    pub description: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}
