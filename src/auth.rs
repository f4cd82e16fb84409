//! Service account descriptions, cache identities, scope lists, and token wrappers.

pub mod credential;
pub mod id;
pub mod key;
pub mod scope;
pub mod token;

pub use credential::*;
pub use id::*;
pub use key::*;
pub use scope::*;
pub use token::*;
