/*!
# SellerDesk

A small internal web tool for e-commerce sellers, built in Rust.

## Overview

A logged-in seller can upload and preview product images, resize and
recompress them, draft listing text, and run a simulated listing analysis and
keyword extraction. Admins additionally get a configuration view.

## Architecture

### Session Gate
- **credentials**: the fixed credential table behind the `Authenticator` trait
  (plain text by default, argon2 hashes with `hash_secrets`)
- **session**: the three-flag `Session` (authenticated, username, admin) with
  `login`/`logout`, and the per-cookie `SessionStore`

### Tab Router
- **router**: the closed `View` enum, `build_menu`, `require_auth` and `dispatch`

### Views
- **tools**: stateless transformations behind the views (image resize and JPEG
  recompression, listing summary, canned analysis and keyword tables)
- **views** / **templates**: handlebars rendering of every page
- **app**: axum routing, session cookies and the auth middleware

## HTTP Endpoints

- `GET /?view={slug}` - Login form, or the workspace with the selected view
- `POST /login`, `POST /logout` - Session gate
- `POST /views/{slug}` - Submit a view's form
- `POST /api/optimize` - Download an optimized JPEG
*/

pub mod app;
pub mod config;
pub mod credentials;
pub mod error;
pub mod router;
pub mod session;
pub mod templates;
pub mod tools;
pub mod views;

/// Re-export the core types to make them easier to use
pub use config::AppConfig;
pub use credentials::{Account, Authenticator, CredentialEntry, CredentialTable};
pub use error::{ConfigError, ImageError};
pub use router::{Surface, View, build_menu, require_auth};
pub use session::{LoginOutcome, Session, SessionState, SessionStore};
