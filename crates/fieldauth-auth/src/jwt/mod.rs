//! JWT claims, signing, and verification.

pub mod claims;
pub mod decoder;
pub mod encoder;

pub use claims::{Claims, TokenKind, TokenSubject};
pub use decoder::JwtDecoder;
pub use encoder::JwtEncoder;
