/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */

//! Object Storage Transfer Manager
//!
//! Moves objects of arbitrary size to and within an object storage service. Small objects are
//! sent with a single request; larger objects and streams of unknown size are split into parts
//! that are uploaded concurrently into a multipart session and then assembled, or cleaned up
//! when the transfer fails. Server side copies are paced while the service completes them.
//!
//! # Crate Features
//!
//! - `test-util`: Enables the in-memory storage and size limit overrides for tests. DO NOT ENABLE IN PRODUCTION.

#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

/// Error types emitted by `oos-transfer-manager`
pub mod error;

/// Common types used by `oos-transfer-manager`
pub mod types;

/// Types and helpers for I/O
pub mod io;

/// Transfer manager client
pub mod client;

/// Transfer manager operations
pub mod operation;

/// Transfer manager configuration
pub mod config;

/// Metrics collected by the transfer manager client
pub mod metrics;

/// Deciding how an object is transferred
pub mod plan;

/// The remote object storage a transfer runs against
pub mod storage;

pub(crate) mod middleware;

pub(crate) mod runtime;

pub use self::client::Client;
pub use self::config::Config;
use self::config::loader::ConfigLoader;

/// Create a config loader backed by Amazon S3 and the shared AWS configuration
pub fn from_env() -> ConfigLoader {
    ConfigLoader::default()
}
