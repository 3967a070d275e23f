//! Outbound gateway core contracts and pipeline stages.
//!
//! This crate holds the send-request data model, the structural validator, the
//! channel/provider policy engine, the envelope builder and the capability
//! traits for the two external collaborators (adapter resolution and
//! dispatch). [`OutboundService`] wires them into a single request pipeline.
pub mod dispatch;
pub mod error;
pub mod outbound;
pub mod policy;
pub mod resolver;
pub mod service;
pub mod types;
pub mod validate;

pub use dispatch::*;
pub use error::*;
pub use outbound::*;
pub use policy::*;
pub use resolver::*;
pub use service::*;
pub use types::*;
pub use validate::*;

/// Returns the semantic version advertised by this crate.
///
/// ```
/// assert_eq!(ogw_core::version(), env!("CARGO_PKG_VERSION"));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
