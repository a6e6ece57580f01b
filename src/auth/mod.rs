//! # Authentication Module
//!
//! Session token decoding, protected route matching, cookie-backed session
//! storage and the gate middleware that keeps anonymous callers out of
//! protected pages.

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod protected;
pub mod session;
