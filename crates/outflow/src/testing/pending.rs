// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::convert::Infallible;
use std::future;

use crate::{Packet, Sink};

/// A [`Sink`] that never completes any operation.
///
/// Intended for tests that need to tell apart operations that suspend on the sink from
/// operations that complete without it.
#[derive(Debug, Default)]
pub struct PendingSink;

impl PendingSink {
    /// Creates a new `PendingSink`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Starts accepting a packet, never completing.
    ///
    /// # Errors
    ///
    /// This call never fails (because it never completes).
    #[cfg_attr(test, mutants::skip)] // This does nothing, pointless to mutate.
    #[expect(clippy::needless_pass_by_ref_mut, reason = "API compatibility between trait and inherent fn")]
    pub async fn put(&mut self, _packet: Packet) -> Result<(), Infallible> {
        future::pending::<()>().await;
        unreachable!();
    }

    /// Starts closing the sink, never completing.
    ///
    /// # Errors
    ///
    /// This call never fails (because it never completes).
    #[cfg_attr(test, mutants::skip)] // This does nothing, pointless to mutate.
    #[expect(clippy::needless_pass_by_ref_mut, reason = "API compatibility between trait and inherent fn")]
    pub async fn close(&mut self) -> Result<(), Infallible> {
        future::pending::<()>().await;
        unreachable!();
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // Trivial forwarder.
impl Sink for PendingSink {
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
