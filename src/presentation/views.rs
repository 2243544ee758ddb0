use askama::{Error as AskamaError, Template};
use thiserror::Error;
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::cache::{CacheEntry, QueryStatus};
use crate::client::ClientError;
use crate::domain::{Blog, BlogForm, BlogId};
use crate::session::{Screen, SubmitError};

const LIST_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day padding:none]");
const DETAIL_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

pub const PUBLISHING_MARKER: &str = "Publishing...";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) view: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(view: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            view,
            public_message,
            error,
        }
    }

    pub fn view(&self) -> &'static str {
        self.view
    }
}

/// `Mar 4`
pub fn format_list_date(date: OffsetDateTime) -> String {
    date.format(LIST_DATE).unwrap_or_else(|_| date.date().to_string())
}

/// `March 4, 2025`
pub fn format_detail_date(date: OffsetDateTime) -> String {
    date.format(DETAIL_DATE).unwrap_or_else(|_| date.date().to_string())
}

pub fn render(screen: &Screen) -> Result<String, TemplateRenderError> {
    match screen {
        Screen::List { entry } => render_template(
            "list",
            ListTemplate {
                view: ListView::from_entry(entry),
            },
        ),
        Screen::Detail { id, entry } => render_template(
            "detail",
            DetailTemplate {
                view: DetailView::from_entry(id, entry),
            },
        ),
        Screen::Create {
            form,
            pending,
            error,
        } => render_template(
            "form",
            FormTemplate {
                view: FormView::new(form, *pending, error.as_ref()),
            },
        ),
    }
}

fn render_template<T: Template>(
    view: &'static str,
    template: T,
) -> Result<String, TemplateRenderError> {
    template
        .render()
        .map_err(|err| TemplateRenderError::new(view, "Screen rendering failed", err))
}

pub struct ListRowView {
    pub id: String,
    pub title: String,
    pub category: String,
    pub date: String,
    pub read_time: String,
    pub description: String,
    pub author: String,
}

impl From<&Blog> for ListRowView {
    fn from(blog: &Blog) -> Self {
        Self {
            id: blog.id.to_string(),
            title: blog.title.clone(),
            category: blog.primary_category().to_string(),
            date: format_list_date(blog.date),
            read_time: blog.read_time_or_default().to_string(),
            description: blog.description.clone(),
            author: blog.author_name().to_string(),
        }
    }
}

/// List screen state. At most one of `loading`, `error` and `empty` is set.
#[derive(Default)]
pub struct ListView {
    pub loading: bool,
    pub error: Option<String>,
    pub refreshing: bool,
    pub refresh_error: Option<String>,
    pub empty: bool,
    pub rows: Vec<ListRowView>,
}

impl ListView {
    fn from_entry(entry: &CacheEntry<Vec<Blog>, ClientError>) -> Self {
        let failure = match (&entry.status, entry.error.as_ref()) {
            (QueryStatus::Error, Some(err)) => Some(err.to_string()),
            _ => None,
        };
        let Some(blogs) = entry.value.as_ref() else {
            return Self {
                loading: failure.is_none(),
                error: failure,
                ..Self::default()
            };
        };

        Self {
            refreshing: entry.is_loading(),
            refresh_error: failure,
            empty: blogs.is_empty(),
            rows: blogs.iter().map(ListRowView::from).collect(),
            ..Self::default()
        }
    }
}

pub struct StoryView {
    pub title: String,
    pub categories: String,
    pub date: String,
    pub read_time: String,
    pub author: String,
    pub role: Option<String>,
    pub cover_image: String,
    pub description: String,
    pub content: String,
}

impl From<&Blog> for StoryView {
    fn from(blog: &Blog) -> Self {
        Self {
            title: blog.title.clone(),
            categories: blog.category.join(", "),
            date: format_detail_date(blog.date),
            read_time: blog.read_time_or_default().to_string(),
            author: blog.author_name().to_string(),
            role: blog.author_role().map(str::to_string),
            cover_image: blog.cover_image_or_placeholder().to_string(),
            description: blog.description.clone(),
            content: blog.content.clone(),
        }
    }
}

#[derive(Default)]
pub struct DetailView {
    pub id: String,
    pub loading: bool,
    pub not_found: bool,
    pub error: Option<String>,
    pub story: Option<StoryView>,
}

impl DetailView {
    fn from_entry(id: &BlogId, entry: &CacheEntry<Blog, ClientError>) -> Self {
        let id = id.to_string();
        if let Some(blog) = entry.value.as_ref() {
            return Self {
                id,
                story: Some(StoryView::from(blog)),
                ..Self::default()
            };
        }

        match entry.error.as_ref() {
            Some(err) if err.is_not_found() => Self {
                id,
                not_found: true,
                ..Self::default()
            },
            Some(err) if entry.is_error() => Self {
                id,
                error: Some(err.to_string()),
                ..Self::default()
            },
            _ => Self {
                id,
                loading: true,
                ..Self::default()
            },
        }
    }
}

pub struct FormView {
    pub title: String,
    pub category: String,
    pub description: String,
    pub cover_image: String,
    pub content_chars: usize,
    pub pending: bool,
    pub error: Option<String>,
}

impl FormView {
    fn new(form: &BlogForm, pending: bool, error: Option<&SubmitError>) -> Self {
        Self {
            title: form.title.clone(),
            category: form.category.clone(),
            description: form.description.clone(),
            cover_image: form.cover_image.clone(),
            content_chars: form.content.chars().count(),
            pending,
            error: error.map(ToString::to_string),
        }
    }
}

#[derive(Template)]
#[template(path = "list.txt")]
pub struct ListTemplate {
    pub view: ListView,
}

#[derive(Template)]
#[template(path = "detail.txt")]
pub struct DetailTemplate {
    pub view: DetailView,
}

#[derive(Template)]
#[template(path = "form.txt")]
pub struct FormTemplate {
    pub view: FormView,
}
