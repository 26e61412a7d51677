// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Buffered asynchronous byte output streams with zero-copy buffer hand-off.
//!
//! An [`OutputStream`] sits between code that produces bytes and a [`Sink`] that accepts
//! discrete [`Packet`]s of bytes (a socket, a pipe or anything similar). The stream absorbs
//! writes of arbitrary size and turns them into a smaller number of sink operations:
//!
//! * Small writes are copied into an internal buffer of a fixed capacity. The buffer is handed
//!   to the sink as soon as it fills up, or when the stream is flushed or closed.
//! * Writes that are at least as large as the capacity bypass the buffer. Depending on
//!   [`OutputStreamOptions::trim_to_size()`], they are either forwarded as-is or split into
//!   pieces of exactly the capacity.
//! * Callers that already own a self-contained chunk of bytes may hand it over via
//!   [`OutputStream::write_owned()`] without any copying. Such chunks accumulate until the
//!   next flush, at which point they reach the sink as a single multi-fragment packet.
//!
//! All bytes reach the sink in the order they were written.
//!
//! # Example
//!
//! ```
//! # testing_aids::execute_or_terminate_process(|| futures::executor::block_on(async {
//! use std::convert::Infallible;
//! use std::num::NonZero;
//!
//! use outflow::{OutputStream, OutputStreamOptions, Packet, Sink};
//!
//! #[derive(Debug, Default)]
//! struct Collect(Vec<Packet>);
//!
//! impl Sink for Collect {
//!     type Error = Infallible;
//!
//!     async fn put(&mut self, packet: Packet) -> Result<(), Infallible> {
//!         self.0.push(packet);
//!         Ok(())
//!     }
//!
//!     async fn close(&mut self) -> Result<(), Infallible> {
//!         Ok(())
//!     }
//! }
//!
//! let options = OutputStreamOptions::new(NonZero::new(4).unwrap());
//! let mut stream = OutputStream::new(Collect::default(), options);
//!
//! stream.write(b"12").await.unwrap();
//! stream.write(b"345").await.unwrap();
//! stream.close().await.unwrap();
//!
//! let packets = &stream.sink().0;
//! assert_eq!(packets.len(), 2);
//! assert_eq!(packets[0].to_vec(), b"1234");
//! assert_eq!(packets[1].to_vec(), b"5");
//! # }));
//! ```
//!
//! The `serde` feature enables serialization of [`OutputStreamOptions`].
//!
//! The `test-util` feature enables fake sinks and a diagnostic view of the stream's internal
//! buffering mode. These are in the `testing` module.

mod error;
mod options;
mod packet;
mod sink;
mod stream;

pub use error::{Error, ErrorKind, Result};
pub use options::{DEFAULT_CAPACITY, OutputStreamOptions};
pub use packet::{Fragments, Packet};
pub use sink::Sink;
#[cfg(any(test, feature = "test-util"))]
pub use stream::Mode;
pub use stream::OutputStream;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

/// Number of fragments a [`Packet`] stores without a separate heap allocation.
const MAX_INLINE_FRAGMENTS: usize = 4;
