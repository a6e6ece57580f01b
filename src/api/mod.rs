//! # API Client Module
//!
//! Outbound calls to the kanban API. Every call reads the session token,
//! attaches it as a bearer credential and normalizes the reply into an
//! [`envelope::ApiResponse`].

pub mod auth;
pub mod client;
pub mod envelope;
pub mod query;
