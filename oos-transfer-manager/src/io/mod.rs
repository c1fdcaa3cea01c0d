/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

pub(crate) mod checksum;
pub(crate) mod part_reader;
mod size_hint;
mod stream;

pub use self::size_hint::SizeHint;
pub use self::stream::InputStream;
