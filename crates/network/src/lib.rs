// crates/network/src/lib.rs
//! HTTP plumbing between a client device and the sync server
//!
//! - [`Client`]: reqwest wrapper with retry and circuit breaking
//! - [`ConnectivityChecker`] / [`ConnectivityMonitor`]: reachability probes
//! - [`HttpSnapshotTransport`]: delivers collection snapshots to the server

mod client;
mod connectivity;
mod error;
mod transport;

pub use client::{Client, ClientConfig};
pub use connectivity::{ConnectivityChecker, ConnectivityMonitor};
pub use error::{NetworkError, NetworkResult};
pub use transport::HttpSnapshotTransport;
