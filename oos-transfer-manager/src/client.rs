/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::metrics::ClientMetrics;
use crate::Config;

/// Transfer manager client for object storage services.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) handle: Arc<Handle>,
}

/// Whatever is needed to carry out operations, e.g. config and metrics
#[derive(Debug)]
pub(crate) struct Handle {
    pub(crate) config: Config,
    pub(crate) metrics: ClientMetrics,
}

impl Drop for Handle {
    fn drop(&mut self) {
        // Log final metrics summary when the client is dropped
        tracing::debug!(
            "Client metrics summary - Transfers initiated: {}, completed: {}, failed: {}, total bytes: {}",
            self.metrics.transfers_initiated(),
            self.metrics.transfers_completed(),
            self.metrics.transfers_failed(),
            self.metrics.total_bytes_transferred()
        );
    }
}

impl Client {
    /// Creates a new client from a transfer manager config.
    pub fn new(config: Config) -> Client {
        let handle = Arc::new(Handle {
            config,
            metrics: ClientMetrics::new(),
        });
        Client { handle }
    }

    /// Returns the client's configuration
    pub fn config(&self) -> &Config {
        &self.handle.config
    }

    /// Returns the client's metrics
    pub fn metrics(&self) -> &ClientMetrics {
        &self.handle.metrics
    }

    /// Upload a single object.
    ///
    /// Objects up to the configured upload cutoff are stored with a single request. Larger
    /// objects, and streams of unknown size, are split into parts that are uploaded concurrently
    /// into a multipart session.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::error::Error;
    /// use std::path::Path;
    /// use oos_transfer_manager::io::InputStream;
    ///
    /// async fn upload_file(
    ///     client: &oos_transfer_manager::Client,
    ///     path: impl AsRef<Path>
    /// ) -> Result<(), Box<dyn Error>> {
    ///     let stream = InputStream::from_path(path)?;
    ///     let handle = client.upload()
    ///         .key("my-key")
    ///         .body(stream)
    ///         .initiate()?;
    ///
    ///     // initiate() will return before the transfer is complete.
    ///     // Call the `join()` method on the returned handle to drive the transfer to completion.
    ///     let response = handle.join().await?;
    ///     // ... do something with response
    ///     Ok(())
    /// }
    /// ```
    pub fn upload(&self) -> crate::operation::upload::builders::UploadFluentBuilder {
        crate::operation::upload::builders::UploadFluentBuilder::new(self.handle.clone())
    }

    /// Copy a single object within the storage.
    ///
    /// Objects up to the configured copy cutoff are copied with a single request, polling its
    /// status if the storage completes copies asynchronously. Larger objects are copied in
    /// ranges into a multipart session.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::error::Error;
    ///
    /// async fn copy_object(client: &oos_transfer_manager::Client) -> Result<(), Box<dyn Error>> {
    ///     let handle = client.copy()
    ///         .source_key("from-key")
    ///         .destination_key("to-key")
    ///         .initiate()?;
    ///
    ///     let response = handle.join().await?;
    ///     // ... do something with response
    ///     Ok(())
    /// }
    /// ```
    pub fn copy(&self) -> crate::operation::copy::builders::CopyFluentBuilder {
        crate::operation::copy::builders::CopyFluentBuilder::new(self.handle.clone())
    }
}
