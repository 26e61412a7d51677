// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::convert::Infallible;

use crate::{Packet, Sink};

/// A [`Sink`] that discards everything it receives.
///
/// Intended for simple tests and examples only.
#[derive(Debug, Default)]
pub struct NullSink;

impl NullSink {
    /// Creates a new `NullSink`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Accepts the packet and discards it.
    ///
    /// # Errors
    ///
    /// This call never fails.
    #[cfg_attr(test, mutants::skip)] // This does nothing, pointless to mutate.
    #[expect(
        clippy::needless_pass_by_ref_mut,
        clippy::unused_async,
        reason = "API compatibility between trait and inherent fn"
    )]
    pub async fn put(&mut self, _packet: Packet) -> Result<(), Infallible> {
        Ok(())
    }

    /// Does nothing.
    ///
    /// # Errors
    ///
    /// This call never fails.
    #[cfg_attr(test, mutants::skip)] // This does nothing, pointless to mutate.
    #[expect(
        clippy::needless_pass_by_ref_mut,
        clippy::unused_async,
        reason = "API compatibility between trait and inherent fn"
    )]
    pub async fn close(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // Trivial forwarder.
impl Sink for NullSink {
    type Error = Infallible;

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    async fn put(&mut self, packet: Packet) -> Result<(), Infallible> {
        self.put(packet).await
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    async fn close(&mut self) -> Result<(), Infallible> {
        self.close().await
    }
}
