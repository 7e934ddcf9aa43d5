//! Hosted identity-provider integration

pub mod gotrue;

pub use gotrue::{AdminUser, IdentityClient, IdentityError, TokenResponse};
