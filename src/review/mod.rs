//! Reviewer assignment engine.
//!
//! Eligibility rules, the rotating reviewer selector, the transactional
//! reassignment coordinator and the open/merged pull request lifecycle.

mod eligibility;
mod lifecycle;
mod reassign;
mod selector;

#[cfg(test)]
pub(crate) mod fake;

pub use eligibility::*;
pub use lifecycle::*;
pub use reassign::*;
pub use selector::*;
