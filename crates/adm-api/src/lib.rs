//! # adm-api
//!
//! REST API handlers for Admin RS.
//!
//! Every response uses the `{code, msg, data}` envelope. Routes other than
//! login and logout sit behind the bearer-token middleware.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

pub use extractors::AppState;
pub use routes::router;
