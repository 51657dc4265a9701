//! HTTP middleware.

mod auth;

pub use auth::{
    auth_middleware, require_privileged, require_self_or_privileged, Claims, CurrentUser,
    TokenVerifier,
};
