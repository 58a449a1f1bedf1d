//! Concurrent processing utilities for platform probes.
//!
//! Futures are launched with their original index and collected back into
//! a pre-sized container, so output order never depends on which request
//! finished first.

use futures_util::stream::{self, Stream, StreamExt};
use std::future::Future;

/// Runs a batch of futures with bounded concurrency.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrentProcessor {
    max_concurrency: usize,
}

impl ConcurrentProcessor {
    /// Create a new concurrent processor.
    ///
    /// A limit of zero is treated as one.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Yield `(index, output)` pairs in completion order.
    pub fn stream_indexed<F, T>(&self, futures: Vec<F>) -> impl Stream<Item = (usize, T)>
    where
        F: Future<Output = T>,
    {
        let limit = self.max_concurrency;
        stream::iter(
            futures
                .into_iter()
                .enumerate()
                .map(|(index, future)| async move { (index, future.await) }),
        )
        .buffer_unordered(limit)
    }

    /// Run every future and return outputs in input order.
    ///
    /// Slot `i` holds the output of `futures[i]`. Every slot is filled once
    /// the returned future resolves; slots are `Option` so callers never
    /// have to assume that.
    pub async fn run_indexed<F, T>(&self, futures: Vec<F>) -> Vec<Option<T>>
    where
        F: Future<Output = T>,
    {
        let mut slots: Vec<Option<T>> = (0..futures.len()).map(|_| None).collect();

        let mut completed = Box::pin(self.stream_indexed(futures));
        while let Some((index, output)) = completed.next().await {
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(output);
            }
        }

        slots
    }
}
