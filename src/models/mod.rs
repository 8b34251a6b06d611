//! Data models for the pull request reviewer service.
//!
//! Identifiers, members, teams and pull requests, plus the request bodies the
//! REST surface accepts.

mod history;
mod ids;
mod member;
mod pull_request;
mod team;

pub use history::*;
pub use ids::*;
pub use member::*;
pub use pull_request::*;
pub use team::*;
