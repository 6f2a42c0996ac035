//! API-facing descriptors: validated token endpoint and collection API base.
//!
//! `descriptor` exposes [`ApiDescriptor`], the configuration every client is built from, together
//! with its validating builder. Endpoints must use HTTPS unless they point at a loopback host.

pub mod descriptor;

pub use descriptor::*;
