use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use futures::future::join_all;
use monk::{
    cache::{CacheConfig, QueryStatus},
    client::{BlogSource, ClientError},
    domain::{Blog, BlogDraft, BlogId, FormError},
    navigation::Route,
    presentation,
    session::{Screen, Session, SubmitError},
};
use time::macros::datetime;
use tokio::sync::oneshot;

fn blog(id: &str) -> Blog {
    Blog {
        id: BlogId::new(id),
        title: format!("Story {id}"),
        category: vec!["TECH".into()],
        description: format!("About {id}"),
        content: "Body".into(),
        cover_image: None,
        date: datetime!(2025-03-04 10:00 UTC),
        author: None,
        read_time: None,
    }
}

/// In-memory blog source whose reads can be held open per id.
#[derive(Default)]
struct FakeSource {
    blogs: Mutex<Vec<Blog>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
    create_calls: AtomicUsize,
    fail_create: AtomicBool,
    drafts: Mutex<Vec<BlogDraft>>,
}

impl FakeSource {
    fn with_blogs(ids: &[&str]) -> Arc<Self> {
        let source = Self::default();
        *source.blogs.lock().unwrap() = ids.iter().map(|id| blog(id)).collect();
        Arc::new(source)
    }

    fn gate(&self, id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(id.to_string(), rx);
        tx
    }

    async fn wait_for_gets(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.get_calls.load(Ordering::SeqCst) < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("get_blog was called");
    }
}

#[async_trait]
impl BlogSource for FakeSource {
    async fn list_blogs(&self) -> Result<Vec<Blog>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(self.blogs.lock().unwrap().clone())
    }

    async fn get_blog(&self, id: &BlogId) -> Result<Blog, ClientError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().remove(id.as_str());
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.blogs
            .lock()
            .unwrap()
            .iter()
            .find(|blog| &blog.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound { id: id.to_string() })
    }

    async fn create_blog(&self, draft: BlogDraft) -> Result<Blog, ClientError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.drafts.lock().unwrap().push(draft.clone());
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ClientError::server(500, "database unavailable"));
        }
        let mut blogs = self.blogs.lock().unwrap();
        let created = Blog {
            id: BlogId::new(format!("{}", blogs.len() + 1)),
            title: draft.title,
            category: draft.category,
            description: draft.description,
            content: draft.content,
            cover_image: draft.cover_image,
            date: draft.date,
            author: None,
            read_time: None,
        };
        blogs.push(created.clone());
        Ok(created)
    }
}

fn session(source: &Arc<FakeSource>) -> Arc<Session> {
    Arc::new(Session::new(
        Arc::clone(source) as Arc<dyn BlogSource>,
        CacheConfig::default(),
    ))
}

fn fill_form(session: &Session, category: &str) {
    assert!(session.edit_form(|form| {
        form.title = "Fresh".into();
        form.category = category.into();
        form.description = "Summary".into();
        form.content = "Words".into();
    }));
}

#[tokio::test]
async fn late_detail_response_does_not_replace_current_selection() {
    let source = FakeSource::with_blogs(&["1", "2"]);
    let session = session(&source);
    let release_first = source.gate("1");

    let first = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.open_blog(BlogId::new("1")).await }
    });
    source.wait_for_gets(1).await;

    let second = session.open_blog(BlogId::new("2")).await;
    release_first.send(()).expect("fetch for 1 is waiting");
    let late = first.await.expect("task");

    for screen in [second, late, session.screen()] {
        match screen {
            Screen::Detail { id, entry } => {
                assert_eq!(id, BlogId::new("2"));
                assert_eq!(entry.value.map(|blog| blog.id), Some(BlogId::new("2")));
            }
            other => panic!("expected detail for 2, got {other:?}"),
        }
    }
    let text = presentation::render(&session.screen()).expect("detail renders");
    assert!(text.starts_with("Story 2\n"));
}

#[tokio::test]
async fn concurrent_list_reads_share_one_fetch() {
    let source = FakeSource::with_blogs(&["1"]);
    let session = session(&source);

    let screens = join_all((0..5).map(|_| session.show_list())).await;

    assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);
    for screen in screens {
        match screen {
            Screen::List { entry } => assert_eq!(entry.value.map(|blogs| blogs.len()), Some(1)),
            other => panic!("expected list, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn successful_create_returns_to_refetched_list() {
    let source = FakeSource::with_blogs(&["1"]);
    let session = session(&source);
    session.show_list().await;
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);

    session.start_create();
    fill_form(&session, "tech, news");
    let created = session.submit_create().await.expect("create succeeds");

    assert_eq!(created.category, vec!["TECH".to_string(), "NEWS".to_string()]);
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
    assert_eq!(session.route(), Route::List);
    match session.screen() {
        Screen::List { entry } => {
            assert_eq!(entry.status, QueryStatus::Success);
            assert!(!entry.is_stale);
            let ids: Vec<_> = entry.value.unwrap_or_default().into_iter().map(|b| b.id).collect();
            assert_eq!(ids, vec![BlogId::new("1"), created.id.clone()]);
        }
        other => panic!("expected list, got {other:?}"),
    }

    let drafts = source.drafts.lock().unwrap();
    assert_eq!(drafts[0].category, vec!["TECH".to_string(), "NEWS".to_string()]);
}

#[tokio::test]
async fn created_blog_is_readable_without_a_fetch() {
    let source = FakeSource::with_blogs(&[]);
    let session = session(&source);
    session.start_create();
    fill_form(&session, "tech");
    let created = session.submit_create().await.expect("create succeeds");

    let screen = session.open_blog(created.id.clone()).await;
    assert_eq!(source.get_calls.load(Ordering::SeqCst), 0);
    match screen {
        Screen::Detail { entry, .. } => assert_eq!(entry.value, Some(created)),
        other => panic!("expected detail, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_blog_is_not_found() {
    let source = FakeSource::with_blogs(&["1"]);
    let session = session(&source);

    match session.open_blog(BlogId::new("missing-id")).await {
        Screen::Detail { entry, .. } => {
            assert!(!entry.is_success());
            assert_eq!(entry.status, QueryStatus::Error);
            assert!(entry.error.as_ref().is_some_and(ClientError::is_not_found));
            assert!(entry.value.is_none());
        }
        other => panic!("expected detail, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_create_keeps_form_and_can_be_resubmitted() {
    let source = FakeSource::with_blogs(&[]);
    source.fail_create.store(true, Ordering::SeqCst);
    let session = session(&source);

    session.start_create();
    fill_form(&session, "tech");
    let err = session.submit_create().await.expect_err("server fails");
    assert!(matches!(err, SubmitError::Client(ClientError::Server { status: 500, .. })));

    assert_eq!(session.route(), Route::Create);
    match session.screen() {
        Screen::Create {
            form,
            pending,
            error,
        } => {
            assert_eq!(form.title, "Fresh");
            assert!(!pending);
            assert!(matches!(error, Some(SubmitError::Client(_))));
        }
        other => panic!("expected create, got {other:?}"),
    }

    source.fail_create.store(false, Ordering::SeqCst);
    session.submit_create().await.expect("retry succeeds");
    assert_eq!(source.create_calls.load(Ordering::SeqCst), 2);
    assert_eq!(session.route(), Route::List);
}

#[tokio::test]
async fn incomplete_form_is_rejected_locally() {
    let source = FakeSource::with_blogs(&[]);
    let session = session(&source);
    session.start_create();
    session.edit_form(|form| {
        form.title = "Only a title".into();
        form.category = " , ".into();
    });

    let err = session.submit_create().await.expect_err("form incomplete");
    assert_eq!(err, SubmitError::Form(FormError::missing("category")));
    assert_eq!(source.create_calls.load(Ordering::SeqCst), 0);
    assert!(matches!(
        session.screen(),
        Screen::Create { error: Some(SubmitError::Form(_)), .. }
    ));
}

#[tokio::test]
async fn submit_outside_create_is_refused() {
    let source = FakeSource::with_blogs(&[]);
    let session = session(&source);
    assert_eq!(
        session.submit_create().await,
        Err(SubmitError::NotCreating)
    );
}

#[tokio::test]
async fn selecting_then_creating_leaves_only_create() {
    let source = FakeSource::with_blogs(&["42"]);
    let session = session(&source);

    session.open_blog(BlogId::new("42")).await;
    let screen = session.start_create();

    assert_eq!(session.route(), Route::Create);
    assert!(matches!(screen, Screen::Create { .. }));

    session.cancel_create();
    assert_eq!(session.route(), Route::List);
    session.start_create();
    assert!(matches!(session.screen(), Screen::Create { form, .. } if form.title.is_empty()));
}

#[tokio::test]
async fn teardown_closes_subscriptions() {
    let source = FakeSource::with_blogs(&["1"]);
    let session = session(&source);
    let mut list = session.watch_list();
    session.show_list().await;

    session.teardown();

    while list.changed().await.is_ok() {}
    assert!(session.cache().is_empty());
    assert_eq!(session.route(), Route::List);
}

#[tokio::test]
async fn refresh_list_always_refetches() {
    let source = FakeSource::with_blogs(&["1"]);
    let session = session(&source);
    session.show_list().await;
    session.show_list().await;
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);

    source.blogs.lock().unwrap().push(blog("2"));
    match session.refresh_list().await {
        Screen::List { entry } => assert_eq!(entry.value.map(|blogs| blogs.len()), Some(2)),
        other => panic!("expected list, got {other:?}"),
    }
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn blog_subscription_sees_loading_then_success() {
    let source = FakeSource::with_blogs(&["7"]);
    let session = session(&source);
    let mut detail = session.watch_blog(&BlogId::new("7"));
    let release = source.gate("7");

    let open = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.open_blog(BlogId::new("7")).await }
    });
    source.wait_for_gets(1).await;
    assert!(detail.borrow_and_update().is_loading());

    release.send(()).expect("fetch is waiting");
    open.await.expect("task");
    detail.changed().await.expect("sender alive");
    assert!(detail.borrow().is_success());
    assert_eq!(session.create_state().status, monk::mutation::MutationStatus::Idle);
}
