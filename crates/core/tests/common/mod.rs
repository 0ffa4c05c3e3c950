//! Common test utilities shared by the integration tests.
//!
//! - Fixtures: settings, channel directories, helper processes
//! - Assertions over controller events and OS process state

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
