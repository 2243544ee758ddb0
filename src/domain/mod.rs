//! Domain layer types and invariants.

pub mod blog;
pub mod error;
pub mod form;

pub use blog::{Author, Blog, BlogId};
pub use error::FormError;
pub use form::{BlogDraft, BlogForm, parse_categories};
