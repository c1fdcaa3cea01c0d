/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{self, Error};
use crate::io::size_hint::SizeHint;

/// Source of binary data.
///
/// To create an `InputStream`:
///
/// * From an in-memory source: use [`from_static`] or one of the provided `From` implementations.
/// * From a file path: use [`from_path`]
/// * From any [`AsyncRead`]: use [`from_reader`] (unknown length) or [`from_reader_with_length`]
///
/// [`from_static`]: InputStream::from_static
/// [`from_path`]: InputStream::from_path
/// [`from_reader`]: InputStream::from_reader
/// [`from_reader_with_length`]: InputStream::from_reader_with_length
#[derive(Debug)]
pub struct InputStream {
    pub(super) inner: RawInputStream,
}

#[derive(Debug)]
pub(super) enum RawInputStream {
    /// In-memory buffer to read from
    Buf(Bytes),
    /// File based input
    Fs(PathBody),
    /// Caller provided reader
    Reader(ReaderBody),
}

#[derive(Debug)]
pub(super) struct PathBody {
    pub(super) path: PathBuf,
    pub(super) length: u64,
}

pub(super) struct ReaderBody {
    pub(super) reader: Box<dyn AsyncRead + Send + Unpin>,
    pub(super) size_hint: SizeHint,
}

impl fmt::Debug for ReaderBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderBody")
            .field("size_hint", &self.size_hint)
            .finish_non_exhaustive()
    }
}

impl InputStream {
    /// Create a new `InputStream` from a static byte slice
    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self::from(Bytes::from_static(bytes))
    }

    /// Create a new `InputStream` that reads data from a given `path`.
    ///
    /// The length of the file is taken from its metadata now; the file is only opened once the
    /// transfer starts reading it.
    ///
    /// ## Warning
    /// The contents of the file MUST not change while it is being transferred. A file that grows
    /// fails the transfer.
    pub fn from_path(path: impl AsRef<Path>) -> Result<InputStream, Error> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(error::invalid_input(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        Ok(Self {
            inner: RawInputStream::Fs(PathBody {
                path,
                length: metadata.len(),
            }),
        })
    }

    /// Create a new `InputStream` from a reader of unknown length.
    ///
    /// Streams of unknown length are always transferred in chunks.
    pub fn from_reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            inner: RawInputStream::Reader(ReaderBody {
                reader: Box::new(reader),
                size_hint: SizeHint::unknown(),
            }),
        }
    }

    /// Create a new `InputStream` from a reader that yields exactly `length` bytes.
    ///
    /// A reader that yields a different number of bytes fails the transfer.
    pub fn from_reader_with_length(
        reader: impl AsyncRead + Send + Unpin + 'static,
        length: u64,
    ) -> Self {
        Self {
            inner: RawInputStream::Reader(ReaderBody {
                reader: Box::new(reader),
                size_hint: SizeHint::exact(length),
            }),
        }
    }

    /// Return the bounds on the remaining length of the `InputStream`
    pub fn size_hint(&self) -> SizeHint {
        match &self.inner {
            RawInputStream::Buf(bytes) => SizeHint::exact(bytes.len() as u64),
            RawInputStream::Fs(path_body) => SizeHint::exact(path_body.length),
            RawInputStream::Reader(reader) => reader.size_hint,
        }
    }

    /// Read the entire stream into memory, enforcing the declared length
    pub(crate) async fn collect(self) -> Result<Bytes, Error> {
        match self.inner {
            RawInputStream::Buf(bytes) => Ok(bytes),
            RawInputStream::Fs(path_body) => {
                let mut file = tokio::fs::File::open(&path_body.path).await?;
                read_exactly(&mut file, Some(path_body.length)).await
            }
            RawInputStream::Reader(mut body) => {
                read_exactly(&mut body.reader, body.size_hint.upper()).await
            }
        }
    }
}

async fn read_exactly<R>(reader: &mut R, length: Option<u64>) -> Result<Bytes, Error>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = Vec::new();
    match length {
        Some(length) => {
            buf.reserve(length as usize);
            // one extra byte is enough to detect a stream longer than declared
            reader.take(length + 1).read_to_end(&mut buf).await?;
            check_length(buf.len() as u64, length)?;
        }
        None => {
            reader.read_to_end(&mut buf).await?;
        }
    }
    Ok(buf.into())
}

pub(crate) fn check_length(actual: u64, declared: u64) -> Result<(), Error> {
    if actual > declared {
        return Err(error::invalid_input(format!(
            "stream yielded more data than its declared length of {declared} bytes"
        )));
    }
    if actual < declared {
        return Err(error::invalid_input(format!(
            "stream ended after {actual} of its declared {declared} bytes"
        )));
    }
    Ok(())
}

impl Default for InputStream {
    fn default() -> Self {
        Self::from(Bytes::default())
    }
}

impl From<Bytes> for InputStream {
    fn from(value: Bytes) -> Self {
        Self {
            inner: RawInputStream::Buf(value),
        }
    }
}

impl From<Vec<u8>> for InputStream {
    fn from(value: Vec<u8>) -> Self {
        Self::from(Bytes::from(value))
    }
}

impl From<&'static [u8]> for InputStream {
    fn from(slice: &'static [u8]) -> InputStream {
        Self::from(Bytes::from_static(slice))
    }
}

impl From<&'static str> for InputStream {
    fn from(slice: &'static str) -> InputStream {
        Self::from(Bytes::from_static(slice.as_bytes()))
    }
}
