//! View navigation.
//!
//! Exactly one view is active at a time. The create form lives inside the
//! `Create` state, so leaving that state drops any unsaved input with it.

use tracing::debug;

use crate::domain::{BlogForm, BlogId};

/// Which view is active, without the form payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    List,
    Detail(BlogId),
    Create,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum View {
    List,
    Detail(BlogId),
    Create(BlogForm),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewController {
    view: View,
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewController {
    pub fn new() -> Self {
        Self { view: View::List }
    }

    pub fn route(&self) -> Route {
        match &self.view {
            View::List => Route::List,
            View::Detail(id) => Route::Detail(id.clone()),
            View::Create(_) => Route::Create,
        }
    }

    /// Identifier of the blog being shown, if the detail view is active.
    pub fn selected(&self) -> Option<&BlogId> {
        match &self.view {
            View::Detail(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_showing(&self, id: &BlogId) -> bool {
        self.selected() == Some(id)
    }

    pub fn form(&self) -> Option<&BlogForm> {
        match &self.view {
            View::Create(form) => Some(form),
            _ => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut BlogForm> {
        match &mut self.view {
            View::Create(form) => Some(form),
            _ => None,
        }
    }

    pub fn select_blog(&mut self, id: BlogId) {
        debug!(from = ?self.route(), blog_id = %id, "Selecting blog");
        self.view = View::Detail(id);
    }

    /// Open the create view with an empty form. A form already open is kept.
    pub fn start_create(&mut self) {
        if matches!(self.view, View::Create(_)) {
            return;
        }
        debug!(from = ?self.route(), "Starting create");
        self.view = View::Create(BlogForm::default());
    }

    /// Leave `Detail` or `Create` for `List`. Returns whether anything changed.
    pub fn back_to_list(&mut self) -> bool {
        if self.view == View::List {
            return false;
        }
        debug!(from = ?self.route(), "Back to list");
        self.view = View::List;
        true
    }

    pub fn cancel_create(&mut self) -> bool {
        self.back_to_list()
    }

    /// Return to the list after a successful submission. Ignored outside `Create`.
    pub fn on_create_success(&mut self) -> bool {
        if !matches!(self.view, View::Create(_)) {
            return false;
        }
        self.view = View::List;
        true
    }
}
