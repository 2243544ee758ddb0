//! Session: one browsing session over a blog source.
//!
//! User actions move the view controller first; reads then go through the
//! query cache and writes through the create mutation. `screen()` always
//! renders from the active route, so a response for a blog that is no longer
//! selected can land in the cache without ever reaching the screen.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::cache::{CacheConfig, CacheEntry, QueryCache, QueryKey, mutex_lock};
use crate::client::{BlogSource, ClientError};
use crate::domain::{Blog, BlogForm, BlogId, FormError};
use crate::mutation::{MutationError, MutationRunner, MutationState, MutationStatus};
use crate::navigation::{Route, ViewController};

const SOURCE: &str = "session";

/// Values stored in the session's query cache.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    List(Vec<Blog>),
    Detail(Blog),
}

impl QueryData {
    pub fn into_list(self) -> Option<Vec<Blog>> {
        match self {
            QueryData::List(blogs) => Some(blogs),
            QueryData::Detail(_) => None,
        }
    }

    pub fn into_blog(self) -> Option<Blog> {
        match self {
            QueryData::Detail(blog) => Some(blog),
            QueryData::List(_) => None,
        }
    }
}

pub type BlogCache = QueryCache<QueryData, ClientError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("the create view is not open")]
    NotCreating,
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("a submission is already pending")]
    Pending,
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl From<MutationError<ClientError>> for SubmitError {
    fn from(err: MutationError<ClientError>) -> Self {
        match err {
            MutationError::Pending => SubmitError::Pending,
            MutationError::Failed(err) => SubmitError::Client(err),
        }
    }
}

/// View model of the active view.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    List {
        entry: CacheEntry<Vec<Blog>, ClientError>,
    },
    Detail {
        id: BlogId,
        entry: CacheEntry<Blog, ClientError>,
    },
    Create {
        form: BlogForm,
        pending: bool,
        error: Option<SubmitError>,
    },
}

pub struct Session {
    source: Arc<dyn BlogSource>,
    cache: BlogCache,
    create: MutationRunner<Blog, ClientError>,
    nav: Mutex<ViewController>,
    form_error: Mutex<Option<FormError>>,
}

impl Session {
    pub fn new(source: Arc<dyn BlogSource>, config: CacheConfig) -> Self {
        Self::with_cache(source, QueryCache::new(config))
    }

    /// Build a session over an existing cache handle.
    pub fn with_cache(source: Arc<dyn BlogSource>, cache: BlogCache) -> Self {
        let create = MutationRunner::new(
            "create_blog",
            Arc::new(cache.clone()),
            vec![QueryKey::blogs()],
        );
        Self {
            source,
            cache,
            create,
            nav: Mutex::new(ViewController::new()),
            form_error: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &BlogCache {
        &self.cache
    }

    pub fn route(&self) -> Route {
        self.nav().route()
    }

    pub fn create_state(&self) -> MutationState<Blog, ClientError> {
        self.create.state()
    }

    pub fn watch_create(&self) -> watch::Receiver<MutationState<Blog, ClientError>> {
        self.create.subscribe()
    }

    pub fn watch_list(&self) -> watch::Receiver<CacheEntry<QueryData, ClientError>> {
        self.cache.subscribe(&QueryKey::blogs())
    }

    pub fn watch_blog(&self, id: &BlogId) -> watch::Receiver<CacheEntry<QueryData, ClientError>> {
        self.cache.subscribe(&QueryKey::blog(id))
    }

    /// Go to the list view and load it.
    pub async fn show_list(&self) -> Screen {
        self.nav().back_to_list();
        self.load_list().await;
        self.screen()
    }

    /// Refetch the list regardless of freshness.
    pub async fn refresh_list(&self) -> Screen {
        let source = Arc::clone(&self.source);
        self.cache
            .refetch(QueryKey::blogs(), move || async move {
                source.list_blogs().await.map(QueryData::List)
            })
            .await;
        self.screen()
    }

    /// Select `id` and load it.
    pub async fn open_blog(&self, id: BlogId) -> Screen {
        self.nav().select_blog(id.clone());

        let source = Arc::clone(&self.source);
        let fetch_id = id.clone();
        let entry = self
            .cache
            .query(QueryKey::blog(&id), move || async move {
                source.get_blog(&fetch_id).await.map(QueryData::Detail)
            })
            .await;

        if !self.nav().is_showing(&id) {
            debug!(
                blog_id = %id,
                status = ?entry.status,
                "Ignoring result for a blog that is no longer selected"
            );
        }
        self.screen()
    }

    pub fn start_create(&self) -> Screen {
        let opening = {
            let mut nav = self.nav();
            let opening = nav.form().is_none();
            nav.start_create();
            opening
        };
        if opening {
            self.create.reset();
            self.clear_form_error();
        }
        self.screen()
    }

    pub fn cancel_create(&self) -> Screen {
        if self.nav().cancel_create() {
            self.clear_form_error();
        }
        self.screen()
    }

    pub fn back_to_list(&self) -> Screen {
        if self.nav().back_to_list() {
            self.clear_form_error();
        }
        self.screen()
    }

    /// Apply `edit` to the open form. Returns false when no form is open.
    pub fn edit_form(&self, edit: impl FnOnce(&mut BlogForm)) -> bool {
        let edited = self.nav().form_mut().map(edit).is_some();
        if edited {
            self.clear_form_error();
        }
        edited
    }

    /// Validate and publish the open form.
    ///
    /// On success the list is invalidated, the created blog is cached under
    /// its own key, the view returns to the list and the list is reloaded. On
    /// failure the view and the form are left as they were.
    pub async fn submit_create(&self) -> Result<Blog, SubmitError> {
        let form = self.nav().form().cloned().ok_or(SubmitError::NotCreating)?;
        let draft = form.submit(OffsetDateTime::now_utc()).map_err(|err| {
            *mutex_lock(&self.form_error, SOURCE, "submit_create") = Some(err.clone());
            err
        })?;
        self.clear_form_error();

        let source = Arc::clone(&self.source);
        let created = self
            .create
            .run(async move { source.create_blog(draft).await }, |blog| {
                self.cache
                    .prime(QueryKey::blog(&blog.id), QueryData::Detail(blog.clone()));
                self.nav().on_create_success();
            })
            .await?;

        info!(blog_id = %created.id, title = %created.title, "Blog published");
        if self.route() == Route::List {
            self.load_list().await;
        }
        Ok(created)
    }

    /// View model of the active route, read from the cache without fetching.
    pub fn screen(&self) -> Screen {
        let route = self.nav().route();
        match route {
            Route::List => Screen::List {
                entry: self.cache.peek(&QueryKey::blogs()).map(QueryData::into_list),
            },
            Route::Detail(id) => Screen::Detail {
                entry: self.cache.peek(&QueryKey::blog(&id)).map(QueryData::into_blog),
                id,
            },
            Route::Create => {
                let form = self.nav().form().cloned().unwrap_or_default();
                let mutation = self.create.state();
                let pending = mutation.is_pending();
                let form_error = mutex_lock(&self.form_error, SOURCE, "screen").clone();
                let error = form_error.map(SubmitError::Form).or_else(|| {
                    (mutation.status == MutationStatus::Error)
                        .then_some(mutation.error)
                        .flatten()
                        .map(SubmitError::Client)
                });
                Screen::Create {
                    form,
                    pending,
                    error,
                }
            }
        }
    }

    /// End the session: drop cached data and return to a fresh list view.
    pub fn teardown(&self) {
        self.cache.clear();
        *self.nav() = ViewController::new();
        self.create.reset();
        self.clear_form_error();
    }

    async fn load_list(&self) -> CacheEntry<QueryData, ClientError> {
        let source = Arc::clone(&self.source);
        self.cache
            .query(QueryKey::blogs(), move || async move {
                source.list_blogs().await.map(QueryData::List)
            })
            .await
    }

    fn nav(&self) -> std::sync::MutexGuard<'_, ViewController> {
        mutex_lock(&self.nav, SOURCE, "nav")
    }

    fn clear_form_error(&self) {
        *mutex_lock(&self.form_error, SOURCE, "clear_form_error") = None;
    }
}
