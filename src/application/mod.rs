// Application layer - use cases and orchestration.
// Every operation takes a RequestContext naming the authenticated actor.

pub mod config;
pub mod context;
pub mod error;
pub mod service;

pub use config::*;
pub use context::*;
pub use error::*;
pub use service::*;
