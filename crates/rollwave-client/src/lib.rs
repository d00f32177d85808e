//! OpenShift-style REST implementation of the rollwave cluster client.
//!
//! Covers exactly the capability surface the engine consumes: project
//! listing, deploymentconfig get/update, forced instantiate, and
//! imagestreamtag resolution.

pub mod rest;
pub mod wire;

pub use rest::{ClientConfig, OpenShiftClient};
