//! Resolve one build identity per build, stamp it into the artifacts a
//! front-end build consumes, and verify the finished output.

pub mod config;
pub mod env;
pub mod git;
pub mod identity;
pub mod logging;
pub mod placeholder;
pub mod resolve;
pub mod stamp;
pub mod verify;

pub use identity::{BuildIdentity, UNKNOWN_COMMIT};
pub use resolve::{resolve, Resolution};
