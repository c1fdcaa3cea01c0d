/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::BTreeMap;

use crate::error::{Error, ErrorKind};
use crate::storage::CompletedPart;
use crate::types::{FailedMultipartUpload, SessionState};

/// Attempt state of a single part
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PartState {
    InFlight,
    Succeeded(String),
    Failed(String),
}

/// Local view of one remote multipart session.
///
/// Owned by a single transfer. Workers never touch it directly; the scheduler records their
/// results as they are joined.
#[derive(Debug)]
pub(crate) struct MultipartSession {
    key: String,
    upload_id: String,
    state: SessionState,
    parts: BTreeMap<u64, PartState>,
}

impl MultipartSession {
    pub(crate) fn new(key: impl Into<String>, upload_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            upload_id: upload_id.into(),
            state: SessionState::Open,
            parts: BTreeMap::new(),
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn upload_id(&self) -> &str {
        &self.upload_id
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        tracing::trace!(upload_id = %self.upload_id, from = ?self.state, to = ?state, "session state");
        self.state = state;
    }

    pub(crate) fn dispatched(&mut self, part_number: u64) {
        self.parts.insert(part_number, PartState::InFlight);
    }

    pub(crate) fn succeeded(&mut self, part: CompletedPart) {
        self.parts
            .insert(part.part_number, PartState::Succeeded(part.e_tag));
    }

    pub(crate) fn failed(&mut self, part_number: u64, err: &Error) {
        self.parts
            .insert(part_number, PartState::Failed(err.to_string()));
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.parts
            .values()
            .filter(|state| **state == PartState::InFlight)
            .count()
    }

    #[cfg(test)]
    pub(crate) fn part_state(&self, part_number: u64) -> Option<&PartState> {
        self.parts.get(&part_number)
    }

    /// Parts that made it to the service, ordered by part number
    pub(crate) fn completed_parts(&self) -> Vec<CompletedPart> {
        self.parts
            .iter()
            .filter_map(|(part_number, state)| match state {
                PartState::Succeeded(e_tag) => Some(CompletedPart {
                    part_number: *part_number,
                    e_tag: e_tag.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// The part list to finalize the session with.
    ///
    /// Fails unless every part succeeded and the part numbers are exactly `1..=n`.
    pub(crate) fn ordered_parts(&self) -> Result<Vec<CompletedPart>, Error> {
        if self.parts.is_empty() {
            return Err(Error::new(
                ErrorKind::RuntimeError,
                "cannot complete a multipart upload without parts",
            ));
        }
        let mut parts = Vec::with_capacity(self.parts.len());
        for (expected, (part_number, state)) in (1u64..).zip(self.parts.iter()) {
            if *part_number != expected {
                return Err(Error::new(
                    ErrorKind::RuntimeError,
                    format!("part {expected} is missing from the multipart upload"),
                ));
            }
            match state {
                PartState::Succeeded(e_tag) => parts.push(CompletedPart {
                    part_number: *part_number,
                    e_tag: e_tag.clone(),
                }),
                other => {
                    return Err(Error::new(
                        ErrorKind::RuntimeError,
                        format!("part {part_number} is not complete: {other:?}"),
                    ))
                }
            }
        }
        Ok(parts)
    }

    pub(crate) fn failure_report(&self) -> FailedMultipartUpload {
        FailedMultipartUpload {
            key: self.key.clone(),
            upload_id: self.upload_id.clone(),
            state: self.state,
            completed_parts: self.completed_parts(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{MultipartSession, PartState};
    use crate::error::{Error, ErrorKind};
    use crate::storage::CompletedPart;

    fn part(part_number: u64) -> CompletedPart {
        CompletedPart {
            part_number,
            e_tag: format!("etag-{part_number}"),
        }
    }

    #[test]
    fn test_ordered_parts_regardless_of_completion_order() {
        let mut session = MultipartSession::new("key", "upload");
        for n in [3, 1, 2] {
            session.dispatched(n);
        }
        assert_eq!(3, session.in_flight());
        for n in [2, 3, 1] {
            session.succeeded(part(n));
        }
        let numbers: Vec<_> = session
            .ordered_parts()
            .unwrap()
            .iter()
            .map(|p| p.part_number)
            .collect();
        assert_eq!(vec![1, 2, 3], numbers);
    }

    #[test]
    fn test_gap_is_rejected() {
        let mut session = MultipartSession::new("key", "upload");
        session.succeeded(part(1));
        session.succeeded(part(3));
        let err = session.ordered_parts().unwrap_err();
        assert_eq!(&ErrorKind::RuntimeError, err.kind());
    }

    #[test]
    fn test_failed_part_is_not_reported_as_completed() {
        let mut session = MultipartSession::new("key", "upload");
        session.succeeded(part(1));
        session.dispatched(2);
        session.failed(2, &Error::new(ErrorKind::ServiceError, "denied"));

        assert!(session.ordered_parts().is_err());
        assert!(matches!(session.part_state(2), Some(PartState::Failed(_))));
        let report = session.failure_report();
        assert_eq!("upload", report.upload_id());
        assert_eq!(vec![part(1)], report.completed_parts());
    }
}
