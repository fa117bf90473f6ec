mod auth;

pub use auth::{auth_middleware, origin_guard_middleware};
