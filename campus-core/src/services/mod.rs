//! Services layer for the campus trust core.
//!
//! Business logic for challenge login, session issuing and revocation,
//! administrative bulk mutations and the wiki version ledger.

mod admin;
mod auth;
pub mod error;
mod jwt;
mod session;
mod wiki;

pub use admin::AdminService;
pub use auth::AuthService;
pub use error::ServiceError;
pub use jwt::{AccessTokenClaims, JwtService, RefreshTokenClaims, TokenResponse};
pub use session::SessionService;
pub use wiki::WikiService;
