//! Operator-side client for the device review workflow.
//!
//! [`panel::ReviewPanel`] owns an id-keyed [`store::DeviceStore`], talks to
//! the service through a [`backend::ReviewBackend`], applies mutations
//! optimistically via [`optimistic::Tentative`], and reconciles with a
//! concurrent re-fetch of both lists after every successful write.

pub mod backend;
pub mod config;
pub mod error;
pub mod optimistic;
pub mod panel;
pub mod store;
