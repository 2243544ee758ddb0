use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("`{field}` is required")]
    Missing { field: &'static str },
}

impl FormError {
    pub fn missing(field: &'static str) -> Self {
        Self::Missing { field }
    }
}
