//! JWT assertion building and signing for the jwt-bearer grant.

pub mod claims;
pub mod signer;

pub use claims::*;
pub use signer::*;
