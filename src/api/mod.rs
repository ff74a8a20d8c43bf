//! Request API for tabvault
//!
//! JSON requests in, JSON responses out. Each request carries the acting
//! user's id; the handler resolves it through the identity provider and
//! forwards to the file service.
//!
//! # Supported Operations
//!
//! - upload, replace, revert
//! - delete, reset
//! - list, find, history, data
//! - grant, revoke, access

mod errors;
mod handler;
mod request;
mod response;

pub use errors::{ApiError, ApiErrorCode, ApiResult};
pub use handler::ApiHandler;
pub use request::{Envelope, Request};
pub use response::Response;
