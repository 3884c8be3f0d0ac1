//! Client for the CRM records API.
//!
//! The `data` feature provides the record model, form state, normalization and
//! search. The `client` feature adds the HTTP data client and the coordinator
//! that caches the `records` and `config` queries.

pub mod api;
pub mod domain;
pub mod forms;
pub mod models;
#[cfg(feature = "client")]
pub mod query;
pub mod services;

/// API used when no `api_base_url` is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://147.93.36.49:3002";

/// Records requested with the single list page.
pub const DEFAULT_PAGE_SIZE: usize = 100;
