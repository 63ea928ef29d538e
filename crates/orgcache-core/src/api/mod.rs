//! REST API client module for the organization service.
//!
//! This module provides the `RemoteDataSource` port used by the section
//! caches, and `ApiClient`, its reqwest implementation. The client also
//! carries the report transfer flows (presigned download and upload).
//!
//! Responses are wrapped in a `{message, data}` envelope which the client
//! unwraps before handing typed data back.

pub mod client;
pub mod error;
pub mod source;

pub use client::{ApiClient, ReportUpload};
pub use error::ApiError;
pub use source::RemoteDataSource;
