//! Public extension contracts the embedding application implements.
//!
//! The crate never renders progress or drives an interactive authorization itself; it reports
//! through [`ProgressReporter`] and hands authorization codes to an [`AuthorizationResolver`].

pub mod authorization;
pub mod progress;

pub use authorization::*;
pub use progress::*;
