// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::num::NonZero;
use std::{fmt, mem};

use bytes::{Bytes, BytesMut};
use tracing::{Level, event};

use crate::{Error, ErrorKind, OutputStreamOptions, Packet, Result, Sink};

/// Buffers bytes written by the caller and hands them to a [`Sink`] in [`Packet`]s.
///
/// Two ways of writing are supported and may be freely interleaved:
///
/// * [`write()`][Self::write] copies the bytes into an internal buffer of
///   [`capacity()`][Self::capacity] bytes. A full buffer is sent to the sink right away, a
///   partially filled one is held until a later write fills it or until the stream is flushed.
///   Writes that do not fit into a partially filled buffer and span at least a whole capacity
///   bypass the buffer, as described in [`OutputStreamOptions::trim_to_size()`].
/// * [`write_owned()`][Self::write_owned] and [`write_packet()`][Self::write_packet] take
///   ownership of caller-provided buffers without copying them. These buffers are held as
///   fragments until the next flush, which sends all of them as one packet. There is no
///   size-based automatic flush for such fragments.
///
/// The stream holds either a partially filled buffer or a list of fragments, never both. A
/// zero-copy write moves the bytes of a partially filled buffer into the first fragment; a copying
/// write first sends any held fragments to the sink.
///
/// Bytes reach the sink in exactly the order in which they were written. The stream must be
/// [closed][Self::close] to send the final packet and to close the sink.
///
/// # Failures
///
/// If the sink fails, the error is returned from whichever call was sending data at the time
/// and the stream becomes unusable: all later writes and flushes fail with
/// [`ErrorKind::Broken`]. The packet the sink failed to accept is dropped. Closing a broken stream
/// still closes the sink.
///
/// # Concurrency
///
/// All operations take `&mut self`, so there is at most one operation in flight at any time.
/// Operations only suspend while the sink is accepting a packet or being closed.
///
/// # Cancellation
///
/// Dropping the future of [`write()`][Self::write], [`flush()`][Self::flush] or
/// [`close()`][Self::close] while the sink is accepting a packet discards that packet and any
/// bytes of the write not yet processed. The stream is broken afterwards, so the gap never goes
/// unnoticed: all later writes and flushes fail with [`ErrorKind::Broken`].
#[derive(Debug)]
pub struct OutputStream<S> {
    sink: S,
    options: OutputStreamOptions,
    held: Held,
    status: Status,
}

impl<S: Sink> OutputStream<S> {
    /// Creates a stream that writes to `sink`, buffering according to `options`.
    #[must_use]
    pub fn new(sink: S, options: OutputStreamOptions) -> Self {
        Self {
            sink,
            options,
            held: Held::Nothing,
            status: Status::Open,
        }
    }

    /// Creates a stream that writes to `sink` in packets of `capacity` bytes, forwarding
    /// oversized writes unsplit.
    #[must_use]
    pub fn with_capacity(sink: S, capacity: NonZero<usize>) -> Self {
        Self::new(sink, OutputStreamOptions::new(capacity))
    }

    /// Copies `data` into the stream.
    ///
    /// Completes once the bytes are either held by the stream or accepted by the sink. This
    /// suspends only if a packet has to be sent, which is the case when:
    ///
    /// * the stream holds zero-copy fragments, which are sent before copying starts,
    /// * `data` fills up the partially filled buffer,
    /// * `data` spans at least a whole capacity after filling the partially filled buffer.
    ///
    /// Writing an empty slice does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed or broken, or if the sink fails to accept a
    /// packet. In the latter case, the stream is broken afterwards.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_open()?;

        if data.is_empty() {
            return Ok(());
        }

        let capacity = self.capacity().get();
        let mut data = data;

        match mem::take(&mut self.held) {
            Held::Nothing => {}
            // Copying always starts from a clean state, so held fragments go out first,
            // no matter how small they are.
            Held::Fragments(fragments) => self.put(fragments).await?,
            Held::Buffer(mut buffer) => {
                let room = capacity - buffer.len();
                let (head, tail) = data.split_at(room.min(data.len()));
                buffer.extend_from_slice(head);

                if buffer.len() < capacity {
                    debug_assert!(tail.is_empty());
                    self.held = Held::Buffer(buffer);
                    return Ok(());
                }

                self.put(Packet::from(buffer)).await?;
                data = tail;
            }
        }

        if data.len() < capacity {
            if !data.is_empty() {
                self.held = Held::Buffer(self.new_buffer(data));
            }

            return Ok(());
        }

        if !self.trims_to_size() {
            return self.put(Packet::from(Bytes::copy_from_slice(data))).await;
        }

        let mut chunks = data.chunks_exact(capacity);

        for chunk in &mut chunks {
            self.put(Packet::from(Bytes::copy_from_slice(chunk))).await?;
        }

        // A short remainder waits for more data instead of going out as an undersized packet.
        let remainder = chunks.remainder();
        if !remainder.is_empty() {
            self.held = Held::Buffer(self.new_buffer(remainder));
        }

        Ok(())
    }

    /// Takes ownership of `buffer` and holds it until the next flush, without copying it.
    ///
    /// If the stream holds a partially filled buffer, its bytes become the first fragment,
    /// followed by `buffer`. This never suspends and never sends anything to the sink; the
    /// fragments are sent as one packet by the next [`flush()`][Self::flush],
    /// [`close()`][Self::close] or copying [`write()`][Self::write].
    ///
    /// Writing an empty buffer does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed or broken.
    pub fn write_owned(&mut self, buffer: impl Into<Bytes>) -> Result<()> {
        self.write_packet(Packet::from(buffer.into()))
    }

    /// Takes ownership of all fragments of `packet`, as if each was passed to
    /// [`write_owned()`][Self::write_owned] in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed or broken.
    pub fn write_packet(&mut self, packet: Packet) -> Result<()> {
        self.ensure_open()?;

        if packet.is_empty() {
            return Ok(());
        }

        let mut fragments = match mem::take(&mut self.held) {
            Held::Nothing => {
                event!(Level::TRACE, message = "entering zero-copy mode", buffered = 0);

                Packet::new()
            }
            Held::Buffer(buffer) => {
                event!(Level::TRACE, message = "entering zero-copy mode", buffered = buffer.len());

                Packet::from(buffer)
            }
            Held::Fragments(fragments) => fragments,
        };

        fragments.append(packet);
        self.held = Held::Fragments(fragments);

        Ok(())
    }

    /// Sends everything held by the stream to the sink as one packet.
    ///
    /// Completes once the sink has accepted the packet. If the stream holds nothing, the sink
    /// is not called at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed or broken, or if the sink fails to accept the
    /// packet. In the latter case, the stream is broken afterwards.
    pub async fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.flush_held().await
    }

    /// Flushes the stream and closes the sink.
    ///
    /// The sink is closed even if the final flush fails, in which case the flush error is
    /// returned. A broken stream skips the flush and only closes the sink. Either way, the stream
    /// is closed once this returns and no data is ever sent twice.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already closed, or if the sink fails to accept the
    /// final packet or fails to close.
    pub async fn close(&mut self) -> Result<()> {
        let flushed = match self.status {
            Status::Open => self.flush_held().await,
            // Nothing is held after a failure; the data that was in flight is gone.
            Status::Broken => Ok(()),
            Status::Closed => return Err(Error::new(ErrorKind::Closed)),
        };

        event!(Level::DEBUG, message = "closing sink", flushed = flushed.is_ok());

        // Stays broken if the close is abandoned halfway.
        self.status = Status::Broken;

        let closed = match self.sink.close().await {
            Ok(()) => Ok(()),
            Err(error) => Err(self.sink_failed(error)),
        };

        self.status = Status::Closed;

        flushed.and(closed)
    }

    /// The target size of buffered packets.
    #[must_use]
    pub fn capacity(&self) -> NonZero<usize> {
        self.options.capacity()
    }

    /// Whether oversized writes are split into capacity-sized packets.
    #[must_use]
    pub fn trims_to_size(&self) -> bool {
        self.options.trims_to_size()
    }

    /// The number of bytes accepted by the stream but not yet sent to the sink.
    #[must_use]
    pub fn held_len(&self) -> usize {
        match &self.held {
            Held::Nothing => 0,
            Held::Buffer(buffer) => buffer.len(),
            Held::Fragments(fragments) => fragments.len(),
        }
    }

    /// Whether [`close()`][Self::close] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == Status::Closed
    }

    /// References the sink the stream writes to.
    ///
    /// The sink may only be inspected; all operations on it are performed by the stream.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Dismantles the stream into its sink and the data it holds, without sending anything.
    ///
    /// The returned packet is empty if the stream holds no data. The sink is not closed.
    #[must_use]
    pub fn into_parts(self) -> (S, Packet) {
        (self.sink, self.held.into_packet().unwrap_or_default())
    }

    /// The kind of data the stream currently holds.
    ///
    /// This is a diagnostic view of the internal buffering state, meant for tests.
    #[cfg(any(test, feature = "test-util"))]
    #[must_use]
    pub fn mode(&self) -> Mode {
        match self.held {
            Held::Nothing => Mode::Idle,
            Held::Buffer(_) => Mode::Buffered,
            Held::Fragments(_) => Mode::ZeroCopy,
        }
    }

    async fn flush_held(&mut self) -> Result<()> {
        match mem::take(&mut self.held).into_packet() {
            Some(packet) => self.put(packet).await,
            None => Ok(()),
        }
    }

    async fn put(&mut self, packet: Packet) -> Result<()> {
        debug_assert!(!packet.is_empty());

        event!(
            Level::TRACE,
            message = "put",
            len = packet.len(),
            fragments = packet.fragment_count()
        );

        // A dropped future leaves the stream broken, the packet being gone with it.
        self.status = Status::Broken;

        match self.sink.put(packet).await {
            Ok(()) => {
                self.status = Status::Open;
                Ok(())
            }
            Err(error) => Err(self.sink_failed(error)),
        }
    }

    fn sink_failed(&mut self, error: S::Error) -> Error {
        event!(Level::WARN, message = "sink failed, output stream is no longer usable", error = %error);

        self.status = Status::Broken;
        Error::caused_by(ErrorKind::Sink, error)
    }

    fn new_buffer(&self, data: &[u8]) -> BytesMut {
        debug_assert!(data.len() < self.capacity().get());

        let mut buffer = BytesMut::with_capacity(self.capacity().get());
        buffer.extend_from_slice(data);
        buffer
    }

    fn ensure_open(&self) -> Result<()> {
        match self.status {
            Status::Open => Ok(()),
            Status::Broken => Err(Error::new(ErrorKind::Broken)),
            Status::Closed => Err(Error::new(ErrorKind::Closed)),
        }
    }
}

/// The data held by a stream between operations.
#[derive(Default)]
enum Held {
    #[default]
    Nothing,

    /// Copied bytes in a buffer with room for exactly `capacity` bytes.
    /// Never empty and never full between operations.
    Buffer(BytesMut),

    /// Caller-owned fragments waiting for the next flush. Never empty.
    Fragments(Packet),
}

impl fmt::Debug for Held {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nothing => f.write_str("Nothing"),
            Self::Buffer(buffer) => f.debug_struct("Buffer").field("len", &buffer.len()).finish(),
            Self::Fragments(fragments) => fmt::Debug::fmt(fragments, f),
        }
    }
}

impl Held {
    fn into_packet(self) -> Option<Packet> {
        match self {
            Self::Nothing => None,
            // Only the valid bytes are sent; the unused room of the buffer is not.
            Self::Buffer(buffer) => Some(Packet::from(buffer)),
            Self::Fragments(fragments) => Some(fragments),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Status {
    Open,
    Broken,
    Closed,
}

/// The kind of data an [`OutputStream`] holds, as reported by [`OutputStream::mode()`].
#[cfg(any(test, feature = "test-util"))]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Mode {
    /// The stream holds no data.
    Idle,

    /// The stream holds copied bytes in a partially filled buffer.
    Buffered,

    /// The stream holds caller-owned fragments.
    ZeroCopy,
}
