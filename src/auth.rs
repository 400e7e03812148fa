//! Token model and login contracts.

#[cfg(feature = "reqwest")] pub mod approle;
pub mod login;
pub mod token;

#[cfg(feature = "reqwest")] pub use approle::*;
pub use login::*;
pub use token::{record::*, secret::*};
