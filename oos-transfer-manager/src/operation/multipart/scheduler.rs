/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::future::Future;

use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tower::{Service, ServiceExt};

use crate::error::{self, Error};
use crate::operation::multipart::session::MultipartSession;
use crate::storage::CompletedPart;

/// Lazily produces the requests for the parts of a multipart session, in part number order.
pub(crate) trait PartSource {
    /// Request handed to the part service
    type Request: Send + 'static;

    /// The next part number and its request, `None` once every part has been produced
    fn next_request(
        &mut self,
    ) -> impl Future<Output = Result<Option<(u64, Self::Request)>, Error>> + Send;
}

type PartResult = (u64, Result<CompletedPart, Error>);

/// Remembers the failure of the lowest numbered part
#[derive(Debug, Default)]
struct FirstFailure(Option<(u64, Error)>);

impl FirstFailure {
    fn record(&mut self, part_number: u64, err: Error) {
        match &self.0 {
            Some((existing, _)) if *existing <= part_number => {
                tracing::debug!(part_number, "additional part failure: {err}");
            }
            _ => self.0 = Some((part_number, err)),
        }
    }

    fn is_some(&self) -> bool {
        self.0.is_some()
    }
}

fn settle(
    session: &mut MultipartSession,
    failure: &mut FirstFailure,
    joined: Result<PartResult, JoinError>,
) -> Result<(), Error> {
    let (part_number, result) = joined?;
    match result {
        Ok(part) => {
            tracing::trace!(part_number, "part complete");
            session.succeeded(part);
        }
        Err(err) => {
            session.failed(part_number, &err);
            failure.record(part_number, err);
        }
    }
    Ok(())
}

/// Transfer every part produced by `source` through `svc`.
///
/// Parts are read one at a time and only once `svc` has capacity for another request, so the
/// service's concurrency limit bounds both in-flight requests and buffered parts. After the
/// first failure nothing new is dispatched; parts already in flight are allowed to settle and the
/// failure of the lowest numbered part is returned. Cancelling `token` aborts in-flight requests
/// and yields [`ErrorKind::OperationCancelled`](crate::error::ErrorKind::OperationCancelled).
pub(crate) async fn schedule<Src, S>(
    session: &mut MultipartSession,
    source: &mut Src,
    mut svc: S,
    token: &CancellationToken,
) -> Result<(), Error>
where
    Src: PartSource + Send,
    S: Service<Src::Request, Response = CompletedPart, Error = Error> + Send,
    S::Future: Send + 'static,
{
    let mut tasks: JoinSet<PartResult> = JoinSet::new();
    let mut failure = FirstFailure::default();
    let mut next_part_number = 1;

    loop {
        while let Some(joined) = tasks.try_join_next() {
            settle(session, &mut failure, joined)?;
        }
        if failure.is_some() || token.is_cancelled() {
            break;
        }

        let ready = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            ready = ServiceExt::<Src::Request>::ready(&mut svc) => ready,
        };
        if let Err(err) = ready {
            failure.record(next_part_number, err);
            break;
        }

        // parts may have failed while waiting for capacity
        while let Some(joined) = tasks.try_join_next() {
            settle(session, &mut failure, joined)?;
        }
        if failure.is_some() {
            break;
        }

        let next = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            next = source.next_request() => next,
        };
        let (part_number, request) = match next {
            Ok(Some(next)) => next,
            Ok(None) => break,
            Err(err) => {
                failure.record(next_part_number, err);
                break;
            }
        };
        next_part_number = part_number + 1;

        session.dispatched(part_number);
        let call = svc.call(request);
        let cancel = token.clone();
        tasks.spawn(async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(error::operation_cancelled()),
                result = call => result.map_err(|err| error::chunk_failed(part_number, err)),
            };
            (part_number, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        settle(session, &mut failure, joined)?;
    }

    if token.is_cancelled() {
        return Err(error::operation_cancelled());
    }
    match failure.0 {
        Some((part_number, err)) => {
            tracing::debug!(part_number, "stopped scheduling parts after failure");
            Err(err)
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;
    use tower::{service_fn, ServiceBuilder};

    use super::{schedule, PartSource};
    use crate::error::{Error, ErrorKind};
    use crate::operation::multipart::session::{MultipartSession, PartState};
    use crate::storage::CompletedPart;

    struct Numbers(std::ops::RangeInclusive<u64>);

    impl PartSource for Numbers {
        type Request = u64;

        fn next_request(
            &mut self,
        ) -> impl Future<Output = Result<Option<(u64, u64)>, Error>> + Send {
            let next = self.0.next().map(|n| (n, n));
            async move { Ok(next) }
        }
    }

    fn completed(part_number: u64) -> CompletedPart {
        CompletedPart {
            part_number,
            e_tag: format!("etag-{part_number}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let svc = {
            let in_flight = in_flight.clone();
            let max_in_flight = max_in_flight.clone();
            service_fn(move |n: u64| {
                let in_flight = in_flight.clone();
                let max_in_flight = max_in_flight.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_in_flight.fetch_max(now, Ordering::SeqCst);
                    // later parts finish first
                    tokio::time::sleep(Duration::from_millis(100 - n)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, Error>(completed(n))
                }
            })
        };
        let svc = ServiceBuilder::new().concurrency_limit(3).service(svc);
        let mut session = MultipartSession::new("key", "upload");

        schedule(
            &mut session,
            &mut Numbers(1..=20),
            svc,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(3, max_in_flight.load(Ordering::SeqCst));
        let numbers: Vec<_> = session
            .ordered_parts()
            .unwrap()
            .into_iter()
            .map(|p| p.part_number)
            .collect();
        assert_eq!((1..=20).collect::<Vec<_>>(), numbers);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lowest_failure_wins() {
        let svc = service_fn(|n: u64| async move {
            match n {
                // part 2 fails after part 3
                2 => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Err(Error::new(ErrorKind::ServiceError, "part 2 rejected"))
                }
                3 => Err(Error::new(ErrorKind::ServiceError, "part 3 rejected")),
                n => {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok(completed(n))
                }
            }
        });
        let svc = ServiceBuilder::new().concurrency_limit(4).service(svc);
        let mut session = MultipartSession::new("key", "upload");

        let err = schedule(
            &mut session,
            &mut Numbers(1..=100),
            svc,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        match err.kind() {
            ErrorKind::ChunkFailed(chunk) => assert_eq!(2, chunk.part_number()),
            kind => panic!("unexpected error kind {kind:?}"),
        }
        assert_eq!(0, session.in_flight());
        assert!(session.part_state(100).is_none(), "dispatch continued after failure");
        assert!(matches!(session.part_state(3), Some(PartState::Failed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_in_flight_parts() {
        let started = Arc::new(AtomicUsize::new(0));
        let svc = {
            let started = started.clone();
            service_fn(move |n: u64| {
                started.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok::<_, Error>(completed(n))
                }
            })
        };
        let svc = ServiceBuilder::new().concurrency_limit(2).service(svc);
        let token = CancellationToken::new();
        let mut session = MultipartSession::new("key", "upload");

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                token.cancel();
            })
        };

        let err = schedule(&mut session, &mut Numbers(1..=10), svc, &token)
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert_eq!(&ErrorKind::OperationCancelled, err.kind());
        assert_eq!(2, started.load(Ordering::SeqCst));
        assert_eq!(0, session.in_flight());
        assert!(session.completed_parts().is_empty());
    }
}
