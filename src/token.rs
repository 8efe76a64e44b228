//! Bearer token model: redacted secrets plus an unverified claims codec.
//!
//! Tokens are compact `header.payload.signature` strings. The client only reads the payload to
//! learn when the token expires and whom it names; signatures are never checked here because
//! authorization stays with the backend.

pub mod claims;
pub mod secret;

pub use claims::*;
pub use secret::*;
