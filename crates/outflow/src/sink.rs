// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;

use crate::Packet;

/// A destination for [`Packet`]s, such as a socket or a pipe.
///
/// An [`OutputStream`][crate::OutputStream] takes exclusive ownership of its sink and is the
/// only party that calls into it from then on.
///
/// # Ownership
///
/// The methods on this trait accept `&mut self` and take an exclusive reference to the object for
/// the duration of the operation. This implies that only one operation can be concurrently
/// executed on the object. Packets are passed by value, so the sink owns every fragment it
/// receives and decides when the memory is released.
///
/// # Failures
///
/// The output stream never retries a failed operation. A sink that wants retries must
/// implement them itself.
///
/// # Thread safety
///
/// This trait requires `Send` from any returned futures.
#[trait_variant::make(Send)]
pub trait Sink: Debug {
    /// Type used to signal errors by the implementation of this trait.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Accepts one packet.
    ///
    /// The method completes when the sink has taken responsibility for all bytes in the packet.
    /// It may suspend the caller for as long as the sink needs to make room for the packet.
    ///
    /// An output stream never passes an empty packet to this method.
    async fn put(&mut self, packet: Packet) -> Result<(), Self::Error>;

    /// Closes the sink.
    ///
    /// An output stream calls this exactly once, when the stream itself is closed and after its
    /// final packet (if any) was offered to the sink.
    async fn close(&mut self) -> Result<(), Self::Error>;
}
