/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::io::{Cursor, Write};

use bytes::Bytes;
use oos_transfer_manager::config::Builder;
use oos_transfer_manager::io::InputStream;
use oos_transfer_manager::plan::ChunkLimits;
use oos_transfer_manager::storage::in_memory::InMemoryStorage;
use tempfile::NamedTempFile;

/// Stand-in for a kibibyte in tests that shrink every production limit by 1024
pub const KIB: u64 = 1024;

/// Production limits scaled down by 1024: 5 MiB parts become 5 KiB parts, 5 GiB becomes 5 MiB.
///
/// The part count ceiling is kept at its production value of 10 000.
pub fn scaled_limits() -> ChunkLimits {
    ChunkLimits::default()
        .with_min_chunk_size(5 * KIB)
        .with_max_chunk_size(5 * KIB * KIB)
        .with_max_upload_cutoff(5 * KIB * KIB)
        .with_granularity(KIB)
}

/// A config builder wired to `storage` using [`scaled_limits`] and the scaled down defaults
/// (200 KiB upload cutoff, 5 KiB chunks, 4768 KiB copy cutoff).
pub fn scaled_config(storage: &InMemoryStorage) -> Builder {
    oos_transfer_manager::Config::builder()
        .chunk_limits(scaled_limits())
        .upload_cutoff(200 * KIB)
        .chunk_size(5 * KIB)
        .copy_cutoff(4768 * KIB)
        .storage(storage.clone())
}

/// Build a client from `config`
pub fn client(config: Builder) -> oos_transfer_manager::Client {
    oos_transfer_manager::Client::new(config.build().expect("valid config"))
}

/// Deterministic test data of `len` bytes
pub fn payload(len: usize) -> Bytes {
    (0..len)
        .map(|i| (i % 251) as u8)
        .collect::<Vec<u8>>()
        .into()
}

/// A stream over `data` that does not report its size
pub fn unknown_size(data: Bytes) -> InputStream {
    InputStream::from_reader(Cursor::new(data.to_vec()))
}

/// A temporary file containing `data`
pub fn temp_file(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(data).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

/// Install a log formatter honoring `RUST_LOG` for debugging a test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
