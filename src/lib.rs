//! Browse and publish stories against a JSON blog API.
//!
//! The crate is a client-side state core: an HTTP client for the remote blog
//! collection, a keyed query cache with request de-duplication and
//! invalidation, a mutation runner for writes, and a view controller. A
//! [`session::Session`] ties them together and [`presentation`] renders its
//! screens as text.

pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod mutation;
pub mod navigation;
pub mod presentation;
pub mod session;
