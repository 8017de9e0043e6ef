// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed views of the OLM and OpenShift resources we read and write.

pub mod olm;
pub mod route;

pub use olm::{
    ClusterServiceVersion, InstallPlan, OperatorGroup, Subscription, SubscriptionSpec,
};
pub use route::Route;
