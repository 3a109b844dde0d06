//! Network transparency for [`crate::Matrix`]: a client proxy, a server, and the line-based
//! JSON protocol between them.

/// Client-side matrix proxy.
pub mod client;
/// Request/response messages.
pub mod protocol;
/// Server wrapping a local matrix.
pub mod server;

pub use client::RemoteMatrix;
pub use server::MatrixServer;
