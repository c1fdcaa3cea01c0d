/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::atomic::{AtomicU64, Ordering};

/// Units of measurement
pub mod unit {
    use std::{fmt, str::FromStr};

    /// Binary byte units
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ByteUnit {
        /// 1 byte
        Byte,
        /// 2<sup>10</sup> bytes.
        Kibibyte,
        /// 2<sup>20</sup> bytes.
        Mebibyte,
        /// 2<sup>30</sup> bytes.
        Gibibyte,
    }

    impl ByteUnit {
        /// Figure out the best unit to display the given number of bytes in
        /// and return a [`ByteCountDisplayContext`] with the appropriate units set
        pub fn display(total_bytes: u64) -> ByteCountDisplayContext {
            let unit = [ByteUnit::Gibibyte, ByteUnit::Mebibyte, ByteUnit::Kibibyte]
                .into_iter()
                .find(|u| total_bytes >= u.as_bytes_u64())
                .unwrap_or(ByteUnit::Byte);
            ByteCountDisplayContext {
                total_bytes,
                unit,
            }
        }

        /// The number of bytes represented by this unit
        pub const fn as_bytes_u64(&self) -> u64 {
            match self {
                ByteUnit::Byte => 1,
                ByteUnit::Kibibyte => 1 << 10,
                ByteUnit::Mebibyte => 1 << 20,
                ByteUnit::Gibibyte => 1 << 30,
            }
        }

        /// `count` of this unit in bytes
        pub const fn bytes(&self, count: u64) -> u64 {
            count * self.as_bytes_u64()
        }

        pub(crate) const fn as_str(&self) -> &'static str {
            match self {
                ByteUnit::Byte => "B",
                ByteUnit::Kibibyte => "KiB",
                ByteUnit::Mebibyte => "MiB",
                ByteUnit::Gibibyte => "GiB",
            }
        }
    }

    impl FromStr for ByteUnit {
        type Err = crate::error::Error;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let unit = match s {
                "B" => ByteUnit::Byte,
                "KiB" => ByteUnit::Kibibyte,
                "MiB" => ByteUnit::Mebibyte,
                "GiB" => ByteUnit::Gibibyte,
                _ => {
                    return Err(crate::error::invalid_input(format!(
                        "unknown byte unit '{s}'"
                    )))
                }
            };
            Ok(unit)
        }
    }

    /// Display context to format a number of bytes in a particular unit
    #[derive(Debug)]
    pub struct ByteCountDisplayContext {
        /// The number of bytes to display
        pub total_bytes: u64,
        /// The unit to display the bytes in
        pub unit: ByteUnit,
    }

    impl fmt::Display for ByteCountDisplayContext {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let per_unit = self.unit.as_bytes_u64();
            if self.total_bytes % per_unit == 0 {
                return write!(f, "{} {}", self.total_bytes / per_unit, self.unit.as_str());
            }
            let precision = f.precision().unwrap_or(3);
            write!(
                f,
                "{:.*} {}",
                precision,
                self.total_bytes as f64 / per_unit as f64,
                self.unit.as_str()
            )
        }
    }

    #[cfg(test)]
    mod tests {
        use super::ByteUnit;
        use std::str::FromStr;

        #[test]
        fn test_from_str() {
            for u in [
                ByteUnit::Byte,
                ByteUnit::Kibibyte,
                ByteUnit::Mebibyte,
                ByteUnit::Gibibyte,
            ] {
                assert_eq!(u, ByteUnit::from_str(u.as_str()).unwrap());
            }
            assert!(ByteUnit::from_str("mb").is_err());
        }

        #[test]
        fn test_byte_display_context() {
            assert_eq!("5 MiB", format!("{}", ByteUnit::display(5 * 1024 * 1024)));
            assert_eq!("727 B", format!("{}", ByteUnit::display(727)));
            assert_eq!("3.420 KiB", format!("{}", ByteUnit::display(3502)));
            assert_eq!("4.656 GiB", ByteUnit::display(ByteUnit::Mebibyte.bytes(4768)).to_string());
        }
    }
}

/// Client-level metrics aggregating all transfers
#[derive(Debug, Default)]
pub struct ClientMetrics {
    transfers_initiated: AtomicU64,
    transfers_completed: AtomicU64,
    transfers_failed: AtomicU64,
    bytes_transferred: AtomicU64,
}

impl ClientMetrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment_transfers_initiated(&self) {
        self.transfers_initiated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_transfers_completed(&self) {
        self.transfers_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_transfers_failed(&self) {
        self.transfers_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_bytes_transferred(&self, bytes: u64) {
        self.bytes_transferred.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Get the number of transfers initiated
    pub fn transfers_initiated(&self) -> u64 {
        self.transfers_initiated.load(Ordering::Relaxed)
    }

    /// Get the number of transfers completed
    pub fn transfers_completed(&self) -> u64 {
        self.transfers_completed.load(Ordering::Relaxed)
    }

    /// Get the number of transfers failed (including cancelled transfers)
    pub fn transfers_failed(&self) -> u64 {
        self.transfers_failed.load(Ordering::Relaxed)
    }

    /// Get the total number of bytes successfully transferred
    pub fn total_bytes_transferred(&self) -> u64 {
        self.bytes_transferred.load(Ordering::Relaxed)
    }

    /// Get the number of transfers that have neither completed nor failed yet
    pub fn active_transfers(&self) -> u64 {
        self.transfers_initiated()
            .saturating_sub(self.transfers_completed() + self.transfers_failed())
    }

    /// Record the outcome of a finished transfer
    pub(crate) fn record<T>(&self, result: &Result<T, crate::error::Error>, bytes: u64) {
        match result {
            Ok(_) => {
                self.increment_transfers_completed();
                self.add_bytes_transferred(bytes);
            }
            Err(_) => self.increment_transfers_failed(),
        }
    }
}
