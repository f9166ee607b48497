//! Request handlers.
//!
//! Handlers delegate to the repositories in `precinct_db` and map errors
//! via [`AppError`](crate::error::AppError).

pub mod device_review;
pub mod devices;
