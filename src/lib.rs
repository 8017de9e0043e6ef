// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod acs;
pub mod apps;
pub mod certs;
pub mod cli;
pub mod compliance;
pub mod config;
pub mod constants;
pub mod error;
pub mod keycloak;
pub mod kubernetes;
pub mod olm;
pub mod rest;
pub mod rhoai;
pub mod rhtas;
pub mod setup;
pub mod state;
pub mod types;
pub mod wait;

#[cfg(test)]
pub mod test_utils;
