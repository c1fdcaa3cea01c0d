/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Bounds on the number of bytes an [`InputStream`](crate::io::InputStream) yields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeHint {
    lower: u64,
    upper: Option<u64>,
}

impl SizeHint {
    /// A size hint with upper and lower set to `size` bytes.
    pub fn exact(size: u64) -> Self {
        Self {
            lower: size,
            upper: Some(size),
        }
    }

    /// A size hint for a stream whose length is not known up front
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Set the lower bound on the body size
    pub fn with_lower(self, lower: u64) -> Self {
        Self { lower, ..self }
    }

    /// Set the upper bound on the body size
    pub fn with_upper(self, upper: Option<u64>) -> Self {
        Self { upper, ..self }
    }

    /// Get the lower bound of the body size
    pub fn lower(&self) -> u64 {
        self.lower
    }

    /// Get the upper bound of the body size if known.
    ///
    /// This is the size transfers are classified and planned with.
    pub fn upper(&self) -> Option<u64> {
        self.upper
    }
}
