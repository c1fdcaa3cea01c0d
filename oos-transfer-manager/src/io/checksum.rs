/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

/// Incrementally computes the MD5 digest of an object as its bytes are read.
///
/// Bytes must be fed in source order. The accumulator never touches the data itself.
pub(crate) struct ChecksumAccumulator {
    context: md5::Context,
    bytes: u64,
}

impl ChecksumAccumulator {
    pub(crate) fn new() -> Self {
        Self {
            context: md5::Context::new(),
            bytes: 0,
        }
    }

    pub(crate) fn update(&mut self, data: &[u8]) {
        self.context.consume(data);
        self.bytes += data.len() as u64;
    }

    /// Base64 encoded digest of everything fed so far
    pub(crate) fn finalize(self) -> String {
        aws_smithy_types::base64::encode(self.context.compute().0)
    }
}

impl fmt::Debug for ChecksumAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChecksumAccumulator")
            .field("bytes", &self.bytes)
            .finish_non_exhaustive()
    }
}

/// Base64 encoded MD5 digest of `data`
pub(crate) fn md5_base64(data: &[u8]) -> String {
    let mut acc = ChecksumAccumulator::new();
    acc.update(data);
    acc.finalize()
}
