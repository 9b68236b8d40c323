//!
//! Traits Module
//!
//! The two external collaborators the attendance session suspends on.
//!
//! - [`location`]: where the tutor currently is.
//! - [`backend`]: durable recording of attendance and the server-side policy facts.
//!
//! Implement these to plug the session into a real device and a real API, or into
//! test doubles.

pub mod backend;
pub mod location;
