// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::pin::Pin;
use std::task::{Context, Poll};

use crate::{Packet, Sink};

/// A [`Sink`] that records every packet it accepts.
///
/// Besides recording, the sink can be configured to suspend the caller once per operation
/// and to fail specific operations, to exercise the error paths of code that writes to it.
///
/// This is for test and example purposes only and is not optimized for performance.
#[derive(Debug)]
pub struct RecordingSink {
    packets: Vec<Packet>,
    put_count: usize,
    close_count: usize,

    yield_on_each_call: bool,
    fail_put_at: Option<usize>,
    fail_close: bool,
}

impl RecordingSink {
    /// Starts building a new `RecordingSink`.
    #[must_use]
    pub fn builder() -> RecordingSinkBuilder {
        RecordingSinkBuilder {
            yield_on_each_call: false,
            fail_put_at: None,
            fail_close: false,
        }
    }

    /// Creates a new `RecordingSink` with the default configuration, which never fails
    /// and never suspends.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// The packets accepted so far, in the order they were accepted.
    #[must_use]
    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    /// Consumes the sink and returns the packets it accepted.
    #[must_use]
    pub fn into_packets(self) -> Vec<Packet> {
        self.packets
    }

    /// The concatenated contents of all accepted packets.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.packets.iter().flat_map(|packet| packet.fragments().flatten().copied()).collect()
    }

    /// The number of times [`put()`][Self::put] was called, including failed calls.
    #[must_use]
    pub fn put_count(&self) -> usize {
        self.put_count
    }

    /// The number of times [`close()`][Self::close] was called, including failed calls.
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.close_count
    }

    /// Records the packet, unless this call was configured to fail.
    ///
    /// # Errors
    ///
    /// Fails if this is the call configured via [`RecordingSinkBuilder::fail_put_at()`].
    /// The packet is dropped in that case.
    pub async fn put(&mut self, packet: Packet) -> Result<(), SinkFailure> {
        let index = self.put_count;
        self.put_count += 1;

        self.maybe_yield().await;

        if self.fail_put_at == Some(index) {
            return Err(SinkFailure::new());
        }

        self.packets.push(packet);
        Ok(())
    }

    /// Counts the close operation.
    ///
    /// # Errors
    ///
    /// Fails if the sink was configured via [`RecordingSinkBuilder::fail_close()`].
    pub async fn close(&mut self) -> Result<(), SinkFailure> {
        self.close_count += 1;

        self.maybe_yield().await;

        if self.fail_close {
            return Err(SinkFailure::new());
        }

        Ok(())
    }

    async fn maybe_yield(&self) {
        if self.yield_on_each_call {
            YieldOnce::default().await;
        }
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // Trivial forwarder.
impl Sink for RecordingSink {
    type Error = SinkFailure;

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    async fn put(&mut self, packet: Packet) -> Result<(), SinkFailure> {
        self.put(packet).await
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    async fn close(&mut self) -> Result<(), SinkFailure> {
        self.close().await
    }
}

/// Creates an instance of [`RecordingSink`].
///
/// Access through [`RecordingSink::builder()`][RecordingSink::builder].
#[derive(Debug)]
pub struct RecordingSinkBuilder {
    yield_on_each_call: bool,
    fail_put_at: Option<usize>,
    fail_close: bool,
}

impl RecordingSinkBuilder {
    /// Whether every operation suspends the caller once before completing.
    ///
    /// Optional. Defaults to `false`.
    #[must_use]
    pub fn yield_on_each_call(mut self, value: bool) -> Self {
        self.yield_on_each_call = value;
        self
    }

    /// Makes the `put` call with the given zero-based index fail.
    ///
    /// Optional. By default, no `put` call fails.
    #[must_use]
    pub fn fail_put_at(mut self, index: usize) -> Self {
        self.fail_put_at = Some(index);
        self
    }

    /// Whether closing the sink fails.
    ///
    /// Optional. Defaults to `false`.
    #[must_use]
    pub fn fail_close(mut self, value: bool) -> Self {
        self.fail_close = value;
        self
    }

    /// Builds the `RecordingSink` with the provided configuration.
    #[must_use]
    pub fn build(self) -> RecordingSink {
        RecordingSink {
            packets: Vec::new(),
            put_count: 0,
            close_count: 0,
            yield_on_each_call: self.yield_on_each_call,
            fail_put_at: self.fail_put_at,
            fail_close: self.fail_close,
        }
    }
}

/// The error returned by a [`RecordingSink`] operation that was configured to fail.
#[ohno::error]
#[display("injected sink failure")]
pub struct SinkFailure;

/// Completes on the second poll, giving other tasks a chance to run in between.
#[derive(Debug, Default)]
struct YieldOnce {
    polled: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.polled {
            Poll::Ready(())
        } else {
            self.polled = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use futures::FutureExt;
    use testing_aids::async_test;

    use super::*;

    #[test]
    fn records_packets_in_order() {
        async_test(async || {
            let mut sink = RecordingSink::new();

            sink.put(Packet::from(b"ab".as_slice())).await.unwrap();
            sink.put(Packet::from(b"cd".as_slice())).await.unwrap();
            sink.close().await.unwrap();

            assert_eq!(sink.put_count(), 2);
            assert_eq!(sink.close_count(), 1);
            assert_eq!(sink.contents(), b"abcd");

            let packets = sink.into_packets();
            assert_eq!(packets.len(), 2);
            assert_eq!(packets[1].to_vec(), b"cd");
        });
    }

    #[test]
    fn configured_put_fails_and_drops_packet() {
        async_test(async || {
            let mut sink = RecordingSink::builder().fail_put_at(1).build();

            sink.put(Packet::from(b"ab".as_slice())).await.unwrap();
            sink.put(Packet::from(b"cd".as_slice())).await.unwrap_err();
            sink.put(Packet::from(b"ef".as_slice())).await.unwrap();

            assert_eq!(sink.put_count(), 3);
            assert_eq!(sink.contents(), b"abef");
        });
    }

    #[test]
    fn configured_close_fails() {
        async_test(async || {
            let mut sink = RecordingSink::builder().fail_close(true).build();

            let error = sink.close().await.unwrap_err();

            assert!(error.to_string().contains("injected sink failure"));
            assert_eq!(sink.close_count(), 1);
        });
    }

    #[test]
    fn yielding_sink_suspends_once() {
        let mut sink = RecordingSink::builder().yield_on_each_call(true).build();

        let mut put = Box::pin(sink.put(Packet::from(b"x".as_slice())));
        assert!(put.as_mut().now_or_never().is_none());
        assert!(matches!(put.as_mut().now_or_never(), Some(Ok(()))));
        drop(put);

        assert_eq!(sink.packets().len(), 1);
    }

    #[test]
    fn default_does_not_yield() {
        let mut sink = RecordingSink::default();

        assert!(matches!(sink.put(Packet::from(b"x".as_slice())).now_or_never(), Some(Ok(()))));
        assert!(matches!(sink.close().now_or_never(), Some(Ok(()))));
    }
}
