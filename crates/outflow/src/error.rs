// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

/// An error signaled by an [`OutputStream`][crate::OutputStream].
///
/// Use [`kind()`][Self::kind] to tell misuse of the stream apart from failures of the
/// underlying [`Sink`][crate::Sink]. In the latter case, the error returned by the sink is
/// available as the source of this error.
#[ohno::error]
#[display("output stream operation failed: {kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// The category of the failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Categorizes an [`Error`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The stream has already been closed.
    ///
    /// Writing to, flushing or closing a closed stream is a programming error.
    Closed,

    /// An earlier sink failure left the stream unusable.
    ///
    /// Data held by the stream at the time of the failure may have been lost.
    Broken,

    /// The sink failed to accept a packet or failed to close.
    ///
    /// The stream is unusable after this error. Any data that was not yet accepted by the
    /// sink may have been lost.
    Sink,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Closed => "the stream is closed",
            Self::Broken => "the stream is broken by an earlier sink failure",
            Self::Sink => "the sink failed",
        };

        f.write_str(text)
    }
}

/// A `Result` that may contain an [`Error`] from this crate.
pub type Result<T> = std::result::Result<T, Error>;
