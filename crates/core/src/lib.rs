//! Domain types shared by the Precinct device trust service and its review
//! client.
//!
//! Nothing here touches the network or the database: the admission rules,
//! fingerprint and policy validation, and the typed review RPC live here so
//! both sides of the wire agree on them at compile time.

pub mod admission;
pub mod device_policy;
pub mod error;
pub mod fingerprint;
pub mod review;
pub mod roles;
pub mod types;
