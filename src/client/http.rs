use std::time::Duration;

use async_trait::async_trait;
use monk_api_types::{BlogCreateRequest, BlogRecord};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ApiSettings;
use crate::domain::{Blog, BlogDraft, BlogId};

use super::{BlogSource, ClientError};

const BLOGS_PATH: &str = "blogs";

/// What a request was for; decides how non-2xx answers are classified.
#[derive(Debug, Clone, Copy)]
enum Call<'a> {
    List,
    Get(&'a BlogId),
    Create,
}

impl Call<'_> {
    fn op(self) -> &'static str {
        match self {
            Call::List => "list_blogs",
            Call::Get(_) => "get_blog",
            Call::Create => "create_blog",
        }
    }
}

/// `BlogSource` backed by the JSON-over-HTTP blog API.
#[derive(Clone, Debug)]
pub struct HttpBlogClient {
    client: Client,
    base: Url,
}

impl HttpBlogClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, ClientError> {
        let base = with_trailing_slash(base);
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(ClientError::network)?;
        Ok(Self { client, base })
    }

    pub fn from_settings(settings: &ApiSettings) -> Result<Self, ClientError> {
        Self::new(settings.base_url.clone(), settings.timeout)
    }

    pub fn user_agent() -> &'static str {
        concat!("monk/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn blogs_url(&self) -> Result<Url, ClientError> {
        self.base.join(BLOGS_PATH).map_err(ClientError::Url)
    }

    fn blog_url(&self, id: &BlogId) -> Result<Url, ClientError> {
        let mut url = self.blogs_url()?;
        url.path_segments_mut()
            .map_err(|()| ClientError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(id.as_str());
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        call: Call<'_>,
        req: RequestBuilder,
    ) -> Result<T, ClientError> {
        let resp = req.send().await.map_err(|err| {
            warn!(op = call.op(), error = %err, "blog API request failed");
            ClientError::network(err)
        })?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(ClientError::network)?;
        debug!(op = call.op(), status = status.as_u16(), bytes = bytes.len(), "blog API response");

        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            return Err(classify(call, status, text));
        }

        serde_json::from_slice(&bytes).map_err(|err| {
            ClientError::server(status.as_u16(), format!("failed to parse body: {err}"))
        })
    }
}

fn classify(call: Call<'_>, status: StatusCode, text: String) -> ClientError {
    match (call, status) {
        (Call::Get(id), StatusCode::NOT_FOUND) => ClientError::NotFound {
            id: id.to_string(),
        },
        (Call::Create, StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY) => {
            ClientError::Validation(text)
        }
        _ => ClientError::server(status.as_u16(), text),
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait]
impl BlogSource for HttpBlogClient {
    async fn list_blogs(&self) -> Result<Vec<Blog>, ClientError> {
        let req = self.client.get(self.blogs_url()?);
        let records: Vec<BlogRecord> = self.execute(Call::List, req).await?;
        Ok(records.into_iter().map(Blog::from).collect())
    }

    async fn get_blog(&self, id: &BlogId) -> Result<Blog, ClientError> {
        let req = self.client.get(self.blog_url(id)?);
        let record: BlogRecord = self.execute(Call::Get(id), req).await?;
        Ok(record.into())
    }

    async fn create_blog(&self, draft: BlogDraft) -> Result<Blog, ClientError> {
        let body = BlogCreateRequest::from(draft);
        let req = self.client.post(self.blogs_url()?).json(&body);
        let record: BlogRecord = self.execute(Call::Create, req).await?;
        Ok(record.into())
    }
}
