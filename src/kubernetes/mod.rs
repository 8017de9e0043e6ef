// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for client creation, CRD discovery, namespaces and
//! untyped resource access.

pub mod client;
pub mod crd;
pub mod diagnostics;
pub mod dynamic;
pub mod namespaces;
pub mod routes;
pub mod status;

pub use client::{connect, read_secret_value};
pub use crd::wait_for_crd;
pub use dynamic::{apply_object, get_object, merge_patch, wait_for_resource, ResourceRef};
pub use namespaces::ensure_namespace_exists;
pub use routes::{route_host, route_url, wait_for_route_termination};
pub use status::FieldProbe;
