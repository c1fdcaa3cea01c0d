/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::PathBuf;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{self, Error};
use crate::io::checksum::ChecksumAccumulator;
use crate::io::stream::{self, RawInputStream};
use crate::io::InputStream;
use crate::plan::ChunkPlan;

/// Contents of a single part of a multipart upload
#[derive(Debug, Clone)]
pub(crate) struct PartData {
    // 1-indexed
    pub(crate) part_number: u64,
    pub(crate) data: Bytes,
}

/// Splits an [`InputStream`] into sequential parts.
///
/// Parts are read one at a time in source order, so at most one part is being filled at any
/// point and the checksum tap sees every byte exactly once.
#[derive(Debug)]
pub(crate) struct PartReader {
    source: Source,
    part_size: u64,
    max_parts: u64,
    declared_size: Option<u64>,
    next_part_number: u64,
    bytes_read: u64,
    checksum: Option<ChecksumAccumulator>,
    digest: Option<String>,
    done: bool,
}

#[derive(Debug)]
enum Source {
    Buf(Bytes),
    Fs {
        path: PathBuf,
        file: Option<tokio::fs::File>,
    },
    Reader(stream::ReaderBody),
}

impl PartReader {
    pub(crate) fn new(stream: InputStream, plan: &ChunkPlan, compute_checksum: bool) -> Self {
        let declared_size = stream.size_hint().upper();
        let source = match stream.inner {
            RawInputStream::Buf(buf) => Source::Buf(buf),
            RawInputStream::Fs(path_body) => Source::Fs {
                path: path_body.path,
                file: None,
            },
            RawInputStream::Reader(body) => Source::Reader(body),
        };
        Self {
            source,
            part_size: plan.chunk_size(),
            max_parts: plan.max_chunk_count(),
            declared_size,
            next_part_number: 1,
            bytes_read: 0,
            checksum: compute_checksum.then(ChecksumAccumulator::new),
            digest: None,
            done: false,
        }
    }

    /// Base64 encoded MD5 of the whole stream.
    ///
    /// Only available once the stream has been read to the end.
    pub(crate) fn content_md5(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Total number of bytes read so far
    pub(crate) fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Read the next part, `None` once the stream is exhausted.
    ///
    /// An empty stream yields a single empty part.
    pub(crate) async fn read_part(&mut self) -> Result<Option<PartData>, Error> {
        if self.done {
            return Ok(None);
        }

        let data = self.fill().await?;
        let len = data.len() as u64;
        if len == 0 && self.next_part_number > 1 {
            self.finish()?;
            return Ok(None);
        }
        if self.next_part_number > self.max_parts {
            return Err(error::part_count_exceeded(self.max_parts, self.part_size));
        }

        self.bytes_read += len;
        if let Some(declared) = self.declared_size {
            if self.bytes_read > declared {
                return Err(error::invalid_input(format!(
                    "stream yielded more data than its declared length of {declared} bytes"
                )));
            }
        }
        if let Some(checksum) = self.checksum.as_mut() {
            checksum.update(&data);
        }

        let part_number = self.next_part_number;
        self.next_part_number += 1;
        if len < self.part_size {
            // short read means EOF
            self.finish()?;
        }
        tracing::trace!(part_number, len, "read part");
        Ok(Some(PartData { part_number, data }))
    }

    async fn fill(&mut self) -> Result<Bytes, Error> {
        let part_size = self.part_size;
        match &mut self.source {
            Source::Buf(buf) => {
                let n = buf.len().min(part_size as usize);
                Ok(buf.split_to(n))
            }
            Source::Fs { path, file } => {
                if file.is_none() {
                    *file = Some(tokio::fs::File::open(&*path).await?);
                }
                match file {
                    Some(file) => read_chunk(file, part_size).await,
                    None => Ok(Bytes::new()),
                }
            }
            Source::Reader(body) => read_chunk(&mut body.reader, part_size).await,
        }
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.done = true;
        self.digest = self.checksum.take().map(ChecksumAccumulator::finalize);
        match self.declared_size {
            Some(declared) => stream::check_length(self.bytes_read, declared),
            None => Ok(()),
        }
    }
}

async fn read_chunk<R>(reader: &mut R, part_size: u64) -> Result<Bytes, Error>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = Vec::with_capacity(part_size as usize);
    reader.take(part_size).read_to_end(&mut buf).await?;
    Ok(buf.into())
}
