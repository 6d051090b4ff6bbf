//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Admin login, admin creation and bearer token handling live here; the HTTP
//! layer only maps requests and errors.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;
pub mod token;

pub use service::AuthService;
pub use token::TokenIssuer;
