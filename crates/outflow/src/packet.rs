// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{fmt, iter, slice};

use bytes::{Bytes, BytesMut};
use smallvec::SmallVec;

use crate::MAX_INLINE_FRAGMENTS;

/// An ordered sequence of byte fragments that forms one unit of output for a [`Sink`][crate::Sink].
///
/// Each fragment is an exclusively owned [`Bytes`] that was moved into the packet, so building a
/// packet out of existing buffers never copies their contents. Appending packets to each other
/// concatenates their fragment lists, preserving order.
///
/// Zero-sized fragments are never stored. Two packets compare equal if they contain the same
/// bytes, regardless of how those bytes are split into fragments.
#[derive(Clone, Default)]
pub struct Packet {
    fragments: SmallVec<[Bytes; MAX_INLINE_FRAGMENTS]>,

    /// Cached sum of the fragment lengths.
    len: usize,
}

impl Packet {
    /// Creates a packet with no fragments.
    #[cfg_attr(test, mutants::skip)] // Generates no-op mutations, not useful.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fragments: SmallVec::new_const(),
            len: 0,
        }
    }

    /// Appends a fragment to the end of the packet.
    ///
    /// The fragment is moved into the packet without copying. Zero-sized fragments are ignored.
    pub fn push(&mut self, fragment: Bytes) {
        if fragment.is_empty() {
            return;
        }

        self.len = self.len.checked_add(fragment.len()).expect("packet length overflows usize");
        self.fragments.push(fragment);
    }

    /// Moves all fragments of `other` to the end of this packet, preserving their order.
    pub fn append(&mut self, other: Self) {
        self.len = self.len.checked_add(other.len).expect("packet length overflows usize");
        self.fragments.extend(other.fragments);
    }

    /// The total number of bytes in all fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        // Sanity check.
        debug_assert_eq!(self.len, self.fragments.iter().map(Bytes::len).sum::<usize>());

        self.len
    }

    /// Whether the packet contains no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of fragments in the packet.
    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Iterates over the fragments of the packet, in order.
    #[must_use]
    pub fn fragments(&self) -> Fragments<'_> {
        Fragments {
            inner: self.fragments.iter(),
        }
    }

    /// Dismantles the packet into its fragments, in order.
    pub fn into_fragments(self) -> impl ExactSizeIterator<Item = Bytes> {
        self.fragments.into_iter()
    }

    /// Copies the contents of all fragments into one contiguous vector.
    ///
    /// This is meant for inspection in tests and diagnostics; sinks should consume the
    /// fragments directly to avoid the copy.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.len());

        for fragment in &self.fragments {
            result.extend_from_slice(fragment);
        }

        result
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("len", &self.len)
            .field("fragments", &self.fragments.len())
            .finish()
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.fragments().flatten().eq(other.fragments().flatten())
    }
}

impl Eq for Packet {}

impl From<Bytes> for Packet {
    fn from(fragment: Bytes) -> Self {
        let mut packet = Self::new();
        packet.push(fragment);
        packet
    }
}

impl From<BytesMut> for Packet {
    fn from(fragment: BytesMut) -> Self {
        Self::from(fragment.freeze())
    }
}

impl From<Vec<u8>> for Packet {
    fn from(fragment: Vec<u8>) -> Self {
        Self::from(Bytes::from(fragment))
    }
}

impl From<&'static [u8]> for Packet {
    fn from(fragment: &'static [u8]) -> Self {
        Self::from(Bytes::from_static(fragment))
    }
}

impl FromIterator<Bytes> for Packet {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        let mut packet = Self::new();

        for fragment in iter {
            packet.push(fragment);
        }

        packet
    }
}

impl Extend<Bytes> for Packet {
    fn extend<I: IntoIterator<Item = Bytes>>(&mut self, iter: I) {
        for fragment in iter {
            self.push(fragment);
        }
    }
}

/// Iterator over the fragments of a [`Packet`], returned by [`Packet::fragments()`].
#[derive(Clone, Debug)]
pub struct Fragments<'a> {
    inner: slice::Iter<'a, Bytes>,
}

impl<'a> Iterator for Fragments<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Bytes::as_ref)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Fragments<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(Bytes::as_ref)
    }
}

impl ExactSizeIterator for Fragments<'_> {}

impl iter::FusedIterator for Fragments<'_> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    #[test]
    fn new_is_empty() {
        let packet = Packet::new();

        assert!(packet.is_empty());
        assert_eq!(packet.len(), 0);
        assert_eq!(packet.fragment_count(), 0);
        assert_eq!(packet.fragments().count(), 0);
    }

    #[test]
    fn push_keeps_order_and_length() {
        let mut packet = Packet::new();
        packet.push(Bytes::from_static(b"te"));
        packet.push(Bytes::from_static(b"st"));

        assert_eq!(packet.len(), 4);
        assert_eq!(packet.fragment_count(), 2);
        assert_eq!(packet.fragments().collect::<Vec<_>>(), [b"te".as_slice(), b"st".as_slice()]);
        assert_eq!(packet.to_vec(), b"test");
    }

    #[test]
    fn push_ignores_empty_fragments() {
        let mut packet = Packet::from(Bytes::new());
        packet.push(Bytes::new());

        assert!(packet.is_empty());
        assert_eq!(packet.fragment_count(), 0);
    }

    #[test]
    fn append_concatenates_in_order() {
        let mut first: Packet = [Bytes::from_static(b"ab"), Bytes::from_static(b"cd")].into_iter().collect();
        let second = Packet::from(b"ef".as_slice());

        first.append(second);

        assert_eq!(first.len(), 6);
        assert_eq!(first.fragment_count(), 3);
        assert_eq!(first.to_vec(), b"abcdef");
    }

    #[test]
    fn append_empty_is_noop() {
        let mut packet = Packet::from(vec![1, 2, 3]);

        packet.append(Packet::new());

        assert_eq!(packet.len(), 3);
        assert_eq!(packet.fragment_count(), 1);
    }

    #[test]
    fn fragments_are_moved_not_copied() {
        let fragment = Bytes::from(vec![7; 100]);
        let address = fragment.as_ptr();

        let packet = Packet::from(fragment);
        let fragment = packet.into_fragments().next().unwrap();

        assert_eq!(fragment.as_ptr(), address);
    }

    #[test]
    fn equality_ignores_fragmentation() {
        let whole = Packet::from(b"hello".as_slice());
        let split: Packet = [Bytes::from_static(b"he"), Bytes::from_static(b"llo")].into_iter().collect();
        let different = Packet::from(b"help!".as_slice());

        assert_eq!(whole, split);
        assert_ne!(whole, different);
        assert_ne!(whole, Packet::from(b"hell".as_slice()));
    }

    #[test]
    fn from_bytes_mut_freezes() {
        let mut buffer = BytesMut::with_capacity(16);
        buffer.extend_from_slice(b"xyz");

        let packet = Packet::from(buffer);

        assert_eq!(packet.len(), 3);
        assert_eq!(packet.to_vec(), b"xyz");
    }

    #[test]
    fn extend_appends_fragments() {
        let mut packet = Packet::from(b"a".as_slice());
        packet.extend([Bytes::from_static(b"b"), Bytes::new(), Bytes::from_static(b"c")]);

        assert_eq!(packet.fragment_count(), 3);
        assert_eq!(packet.to_vec(), b"abc");
    }

    #[test]
    fn fragments_iterator_runs_backwards() {
        let packet: Packet = [Bytes::from_static(b"1"), Bytes::from_static(b"2")].into_iter().collect();

        let reversed: Vec<_> = packet.fragments().rev().collect();

        assert_eq!(reversed, [b"2".as_slice(), b"1".as_slice()]);
        assert_eq!(packet.fragments().len(), 2);
    }

    #[test]
    fn debug_reports_shape_not_contents() {
        let packet = Packet::from(b"secret".as_slice());

        let debug = format!("{packet:?}");

        assert!(debug.contains("len: 6"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn thread_safe_type() {
        assert_impl_all!(Packet: Send, Sync);
    }
}
