//! Authentication primitives: password hashing, signed tokens and the
//! per-request [`Principal`].

pub mod password;
pub mod principal;
pub mod token;

pub use password::{hash_password, verify_password};
pub use principal::Principal;
pub use token::{Claims, TokenError, TokenKind, TokenService};
