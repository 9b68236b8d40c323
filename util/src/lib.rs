//! Shared plumbing for the tutor attendance workspace: environment configuration,
//! HTTP reachability checks and test helpers.

pub mod config;
pub mod http;
pub mod test_helpers;
