//! One module per command family. Every handler is a pure function of its
//! arguments, the invocation [`Context`](crate::command::Context) and a
//! read-only view of the stores.

pub mod challenge;
pub mod docs;
pub mod format;
pub mod github;
pub mod goal;
pub mod interview;
pub mod learn;
pub mod progress;
pub mod review;
pub mod snippet;
pub mod timer;
pub mod welcome;
