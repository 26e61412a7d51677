// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! An unpublished crate containing testing utilities for use within this repo.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;
use std::time::Duration;
use std::{env, process, thread};

mod log;

pub use log::*;

/// Upper bound on how long a single test may run before the process is terminated.
///
/// Only meant to break out of hangs (e.g. a future that is never woken up), so it is generous.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether the tests are executed by `cargo-mutants`, in which case hangs must surface as
/// mutation test timeouts instead of being cut short by our watchdog.
#[must_use]
pub fn is_mutation_testing() -> bool {
    env::var("MUTATION_TESTING").as_deref() == Ok("1")
}

/// Runs `f` on the current thread while a watchdog thread terminates the process if `f` takes
/// longer than [`TEST_TIMEOUT`].
///
/// # Panics
///
/// Re-raises any panic from `f`.
#[cfg_attr(test, mutants::skip)] // This is test logic - pointless to mutate.
pub fn execute_or_terminate_process<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    if is_mutation_testing() {
        return f();
    }

    let (done_tx, done_rx) = mpsc::channel::<()>();

    let watchdog = thread::Builder::new()
        .name("test watchdog".to_string())
        .spawn(move || {
            // A disconnect means the test finished (possibly by panicking), which is fine.
            if let Err(mpsc::RecvTimeoutError::Timeout) = done_rx.recv_timeout(TEST_TIMEOUT) {
                eprintln!("Test timed out, terminating process.");
                #[expect(
                    clippy::exit,
                    reason = "test harness is intentionally terminating test process that cannot continue execution"
                )]
                process::exit(112);
            }
        })
        .unwrap();

    let result = catch_unwind(AssertUnwindSafe(f));

    drop(done_tx);
    watchdog.join().unwrap();

    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Drives an async test body to completion on the current thread with the `futures` executor,
/// enforcing [`TEST_TIMEOUT`].
#[cfg_attr(test, mutants::skip)] // This is test logic - pointless to mutate.
pub fn async_test<F, FF>(f: F)
where
    F: FnOnce() -> FF + 'static,
    FF: Future<Output = ()>,
{
    execute_or_terminate_process(|| {
        ::futures::executor::block_on(f());
    });
}
