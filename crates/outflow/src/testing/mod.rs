// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Utilities for testing code that uses `outflow` abstractions.

mod null;
mod pending;
mod recording;

pub use null::*;
pub use pending::*;
pub use recording::*;
