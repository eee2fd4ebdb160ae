//! Auth-domain identifiers, secrets, and the cached bearer credential.

pub mod credential;
pub mod id;
pub mod key;
pub mod secret;

pub use credential::*;
pub use id::*;
pub use key::*;
pub use secret::*;
