// # Routes Module
//
// - HTTP route handlers, organized by functionality into submodules.
// - Every route is registered in `server.rs`; all of them may be reached
//   with a locale prefix (`/en/login`).
//
//  ## Available Route Modules
// - `health`: Health check endpoint
// - `pages`: Home, login, registration and settings pages
// - `auth`: Login, registration and logout submissions
// - `locale`: Locale prefix resolution middleware

/// Health check endpoint
pub mod health;

/// Page documents
pub mod pages;

/// Form submissions against the identity service
pub mod auth;

/// Locale prefix resolution
pub mod locale;
