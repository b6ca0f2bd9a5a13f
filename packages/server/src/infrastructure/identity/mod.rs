//! Identity Verifier implementations.

pub mod jwt;

pub use jwt::{JwtIdentityVerifier, TokenClaims};
