//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering the token and API
//! endpoints, the requested scope, model names, and the request policy (timeouts, retry
//! ceiling, refresh margin, upload limit). `strategy` defines [`ProviderStrategy`], an
//! HTTP-client-agnostic hook the executor uses to classify API responses.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
