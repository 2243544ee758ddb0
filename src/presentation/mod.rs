//! Plain-text rendering of session screens.

pub mod views;

pub use views::{TemplateRenderError, format_detail_date, format_list_date, render};
