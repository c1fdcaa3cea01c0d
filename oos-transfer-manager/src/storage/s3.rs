/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, StorageClass};

use crate::error::{self, Error};
use crate::storage::{
    CompleteMultipartUploadRequest, CompleteMultipartUploadResponse, CompletedPart,
    CopyObjectRequest, CopyStart, CopyStatus, CopyToken, CreateMultipartUploadRequest,
    ObjectMetadata, ObjectStorage, PutObjectRequest, PutObjectResponse, UploadPartCopyRequest,
    UploadPartRequest,
};
use crate::types::StorageTier;

/// [`ObjectStorage`] implementation backed by a single Amazon S3 bucket.
///
/// Server side copies in S3 finish before `CopyObject` responds, so [`ObjectStorage::copy_object`]
/// never hands out a [`CopyToken`].
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Storage {
    /// Create a new storage for `bucket` using the given S3 client
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// The bucket objects are stored in
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn copy_source(&self, source_key: &str) -> String {
        format!("{}/{}", self.bucket, source_key)
    }
}

fn storage_class(tier: StorageTier) -> StorageClass {
    match tier {
        StorageTier::Standard => StorageClass::Standard,
        StorageTier::InfrequentAccess => StorageClass::StandardIa,
        StorageTier::Archive => StorageClass::Glacier,
    }
}

fn part_number(part_number: u64) -> Result<i32, Error> {
    i32::try_from(part_number)
        .map_err(|_| error::invalid_input(format!("part number {part_number} is invalid")))
}

fn content_length(len: usize) -> Result<i64, Error> {
    i64::try_from(len)
        .map_err(|_| error::invalid_input(format!("content_length:{len} is invalid.")))
}

fn missing_field(field: &'static str) -> Error {
    Error::new(
        error::ErrorKind::ServiceError,
        format!("response is missing required field `{field}`"),
    )
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectResponse, Error> {
        let content_length = content_length(request.body.len())?;
        let metadata = (!request.metadata.is_empty()).then_some(request.metadata);
        let resp = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&request.key)
            .content_length(content_length)
            .body(ByteStream::from(request.body))
            .storage_class(storage_class(request.storage_tier))
            .set_content_md5(request.content_md5)
            .set_metadata(metadata)
            .send()
            .await?;

        Ok(PutObjectResponse {
            e_tag: resp.e_tag,
            // S3 verifies `Content-MD5` itself and rejects mismatches with `BadDigest`
            content_md5: None,
        })
    }

    async fn create_multipart_upload(
        &self,
        request: CreateMultipartUploadRequest,
    ) -> Result<String, Error> {
        let metadata = (!request.metadata.is_empty()).then_some(request.metadata);
        let resp = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(&request.key)
            .storage_class(storage_class(request.storage_tier))
            .set_metadata(metadata)
            .send()
            .await?;

        resp.upload_id.ok_or_else(|| missing_field("UploadId"))
    }

    async fn upload_part(&self, request: UploadPartRequest) -> Result<CompletedPart, Error> {
        let resp = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(&request.key)
            .upload_id(&request.upload_id)
            .part_number(part_number(request.part_number)?)
            .content_length(content_length(request.body.len())?)
            .body(ByteStream::from(request.body))
            .send()
            .await?;

        Ok(CompletedPart {
            part_number: request.part_number,
            e_tag: resp.e_tag.ok_or_else(|| missing_field("ETag"))?,
        })
    }

    async fn upload_part_copy(
        &self,
        request: UploadPartCopyRequest,
    ) -> Result<CompletedPart, Error> {
        if request.range.is_empty() {
            return Err(error::invalid_input(format!(
                "cannot copy an empty range into part {}",
                request.part_number
            )));
        }
        let resp = self
            .client
            .upload_part_copy()
            .bucket(&self.bucket)
            .key(&request.destination_key)
            .upload_id(&request.upload_id)
            .part_number(part_number(request.part_number)?)
            .copy_source(self.copy_source(&request.source_key))
            .copy_source_range(format!(
                "bytes={}-{}",
                request.range.start,
                request.range.end - 1
            ))
            .send()
            .await?;

        let e_tag = resp
            .copy_part_result
            .and_then(|result| result.e_tag)
            .ok_or_else(|| missing_field("CopyPartResult.ETag"))?;
        Ok(CompletedPart {
            part_number: request.part_number,
            e_tag,
        })
    }

    async fn complete_multipart_upload(
        &self,
        request: CompleteMultipartUploadRequest,
    ) -> Result<CompleteMultipartUploadResponse, Error> {
        let parts = request
            .parts
            .iter()
            .map(|part| {
                Ok(aws_sdk_s3::types::CompletedPart::builder()
                    .part_number(part_number(part.part_number)?)
                    .e_tag(&part.e_tag)
                    .build())
            })
            .collect::<Result<Vec<_>, Error>>()?;

        if request.content_md5.is_some() {
            tracing::trace!("S3 does not store a whole object MD5 for multipart uploads");
        }

        let resp = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(&request.key)
            .upload_id(&request.upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await?;

        Ok(CompleteMultipartUploadResponse { e_tag: resp.e_tag })
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<(), Error> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await?;
        Ok(())
    }

    async fn head_object(&self, key: &str) -> Result<ObjectMetadata, Error> {
        let resp = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;

        let content_length = resp
            .content_length
            .ok_or_else(|| missing_field("ContentLength"))?;
        let content_length = u64::try_from(content_length).map_err(|_| {
            Error::new(
                error::ErrorKind::ServiceError,
                format!("invalid content length {content_length}"),
            )
        })?;
        Ok(ObjectMetadata {
            content_length,
            e_tag: resp.e_tag,
            metadata: resp.metadata.unwrap_or_default(),
        })
    }

    async fn copy_object(&self, request: CopyObjectRequest) -> Result<CopyStart, Error> {
        let resp = self
            .client
            .copy_object()
            .bucket(&self.bucket)
            .key(&request.destination_key)
            .copy_source(self.copy_source(&request.source_key))
            .storage_class(storage_class(request.storage_tier))
            .send()
            .await?;

        Ok(CopyStart::Completed {
            e_tag: resp.copy_object_result.and_then(|result| result.e_tag),
        })
    }

    async fn copy_status(&self, token: &CopyToken) -> Result<CopyStatus, Error> {
        Err(error::invalid_input(format!(
            "S3 copies complete synchronously; there is no status to poll for copy `{token}`"
        )))
    }
}
