// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::num::NonZero;

/// The buffer capacity used when no explicit capacity is configured.
#[expect(clippy::unwrap_used, reason = "the literal is not zero")]
pub const DEFAULT_CAPACITY: NonZero<usize> = NonZero::new(8192).unwrap();

/// Configures the buffering behavior of an [`OutputStream`][crate::OutputStream].
///
/// The options are fixed when the stream is created.
///
/// # Example
///
/// ```
/// use std::num::NonZero;
///
/// use outflow::OutputStreamOptions;
///
/// let options = OutputStreamOptions::new(NonZero::new(4096).unwrap()).trim_to_size(true);
///
/// assert_eq!(options.capacity().get(), 4096);
/// assert!(options.trims_to_size());
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OutputStreamOptions {
    capacity: NonZero<usize>,
    trim_to_size: bool,
}

impl OutputStreamOptions {
    /// Creates options for a stream that buffers up to `capacity` bytes per packet.
    ///
    /// Oversized writes are forwarded unsplit unless [`trim_to_size()`][Self::trim_to_size]
    /// is enabled.
    #[must_use]
    pub const fn new(capacity: NonZero<usize>) -> Self {
        Self {
            capacity,
            trim_to_size: false,
        }
    }

    /// Sets the policy for writes of at least `capacity` bytes that do not fit into a
    /// partially filled buffer.
    ///
    /// * `false` (the default): such a write is sent to the sink as one packet, no matter how
    ///   many multiples of the capacity it spans.
    /// * `true`: such a write is split into packets of exactly `capacity` bytes. A shorter
    ///   remainder is not sent right away but kept in the buffer, where later writes may
    ///   complete it.
    #[must_use]
    pub const fn trim_to_size(mut self, trim_to_size: bool) -> Self {
        self.trim_to_size = trim_to_size;
        self
    }

    /// The target size of buffered packets.
    #[must_use]
    pub const fn capacity(&self) -> NonZero<usize> {
        self.capacity
    }

    /// Whether oversized writes are split into capacity-sized packets.
    #[must_use]
    pub const fn trims_to_size(&self) -> bool {
        self.trim_to_size
    }
}

impl Default for OutputStreamOptions {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use new_zealand::nz;

    use super::*;

    #[test]
    fn defaults() {
        let options = OutputStreamOptions::default();

        assert_eq!(options.capacity(), DEFAULT_CAPACITY);
        assert!(!options.trims_to_size());
    }

    #[test]
    fn builder_methods_apply() {
        let options = OutputStreamOptions::new(nz!(4)).trim_to_size(true);

        assert_eq!(options.capacity().get(), 4);
        assert!(options.trims_to_size());

        let options = options.trim_to_size(false);
        assert!(!options.trims_to_size());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_fills_missing_fields_with_defaults() {
        let options: OutputStreamOptions = serde_json::from_str(r#"{ "trim_to_size": true }"#).unwrap();

        assert_eq!(options.capacity(), DEFAULT_CAPACITY);
        assert!(options.trims_to_size());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_rejects_zero_capacity() {
        let result = serde_json::from_str::<OutputStreamOptions>(r#"{ "capacity": 0 }"#);

        result.unwrap_err();
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serialize_round_trip() {
        let options = OutputStreamOptions::new(nz!(1500)).trim_to_size(true);

        let json = serde_json::to_string(&options).unwrap();
        let restored: OutputStreamOptions = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, options);
    }
}
