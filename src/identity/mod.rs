//! # Identity
//!
//! Who is calling and what their role allows.

pub mod caller;
pub mod directory;

pub use caller::{Caller, Capabilities};
pub use directory::{CapabilityProvider, Directory, IdentityProvider, UserProfile};
