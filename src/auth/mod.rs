//! Authentication: signed access tokens and the per-request auth context.

mod token;

pub use token::{Auth, CallerSource, TokenClaims, TokenService};
