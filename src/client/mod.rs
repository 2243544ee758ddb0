//! Entity client: the translation layer between domain blogs and the remote API.

mod error;
mod http;

use async_trait::async_trait;

use crate::domain::{Blog, BlogDraft, BlogId};

pub use error::ClientError;
pub use http::HttpBlogClient;

/// Remote source of blog entities.
#[async_trait]
pub trait BlogSource: Send + Sync {
    async fn list_blogs(&self) -> Result<Vec<Blog>, ClientError>;

    async fn get_blog(&self, id: &BlogId) -> Result<Blog, ClientError>;

    async fn create_blog(&self, draft: BlogDraft) -> Result<Blog, ClientError>;
}
