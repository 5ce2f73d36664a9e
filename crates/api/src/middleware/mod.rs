//! Request extractors.
//!
//! - [`auth::AuthSession`] -- Requires a live login session.

pub mod auth;
