//! Navegar 360 HTTP Collaborators
//!
//! Implementations of the shared collaborator traits over HTTP:
//! - [`RestStore`]: record store and session provider for the hosted
//!   PostgREST backend
//! - [`ViaCepClient`]: postal-code address lookup
//! - [`Backend`]: both clients built from the process settings

pub mod connect;
pub mod query;
pub mod store;
pub mod viacep;

pub use connect::{Backend, ConnectError};
pub use store::RestStore;
pub use viacep::ViaCepClient;
