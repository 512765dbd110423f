//! Services layer - Business logic
//!
//! - `auth`: registration, login, token minting
//! - `profile`: the authenticated user's home location
//! - `token`: stateless bearer token signing and verification
//! - `password`: Argon2id hashing

pub mod auth;
pub mod password;
pub mod profile;
pub mod token;

pub use auth::{AuthError, AuthService, Credentials};
pub use password::{check_password, hash_password, verify_password};
pub use profile::{ProfileError, ProfileService};
pub use token::{TokenError, TokenService};
