// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for how `OutputStream` turns sequences of writes into packets.

use std::num::NonZero;

use bytes::Bytes;
use new_zealand::nz;
use outflow::testing::{NullSink, RecordingSink};
use outflow::{Mode, OutputStream, OutputStreamOptions};
use testing_aids::async_test;

/// Performs `writes` on a fresh stream, closes it and checks the packets that reached the sink.
fn assert_split(capacity: NonZero<usize>, trim_to_size: bool, writes: &[&str], expected: &[&str]) {
    let writes: Vec<String> = writes.iter().map(ToString::to_string).collect();
    let expected: Vec<String> = expected.iter().map(ToString::to_string).collect();

    async_test(async move || {
        let options = OutputStreamOptions::new(capacity).trim_to_size(trim_to_size);
        let mut stream = OutputStream::new(RecordingSink::new(), options);

        for write in &writes {
            stream.write(write.as_bytes()).await.unwrap();
        }

        stream.close().await.unwrap();

        let actual: Vec<String> = stream
            .sink()
            .packets()
            .iter()
            .map(|packet| String::from_utf8(packet.to_vec()).unwrap())
            .collect();

        assert_eq!(actual, expected, "writes {writes:?} with capacity {capacity}, trim_to_size={trim_to_size}");
    });
}

#[test]
fn splitting_without_trimming() {
    testing_aids::log_to_stdout();

    assert_split(nz!(4), false, &["1"], &["1"]);
    assert_split(nz!(4), false, &["12", "3"], &["123"]);
    assert_split(nz!(4), false, &["12", "34"], &["1234"]);
    assert_split(nz!(4), false, &["12", "345"], &["1234", "5"]);
    assert_split(nz!(4), false, &["1234"], &["1234"]);
    assert_split(nz!(4), false, &["12345"], &["12345"]);
    assert_split(nz!(4), false, &["1234567890"], &["1234567890"]);
    assert_split(nz!(4), false, &["1", "23456"], &["1234", "56"]);
    assert_split(nz!(4), false, &["123", "4567"], &["1234", "567"]);
    assert_split(nz!(4), false, &["123", "45678"], &["1234", "5678"]);
    assert_split(nz!(4), false, &["123", "4567890"], &["1234", "567890"]);
    assert_split(nz!(4), false, &["1234", "567"], &["1234", "567"]);

    assert_split(nz!(3), false, &["1", "234567", "89"], &["123", "4567", "89"]);
    assert_split(nz!(3), false, &["1", "2345", "67"], &["123", "456", "7"]);
}

#[test]
fn splitting_with_trimming() {
    testing_aids::log_to_stdout();

    assert_split(nz!(4), true, &["1"], &["1"]);
    assert_split(nz!(4), true, &["12", "3"], &["123"]);
    assert_split(nz!(4), true, &["12", "3456789"], &["1234", "5678", "9"]);
    assert_split(nz!(4), true, &["12", "3456789", "12"], &["1234", "5678", "912"]);
    assert_split(nz!(4), true, &["123456789"], &["1234", "5678", "9"]);
    assert_split(nz!(4), true, &["12345678"], &["1234", "5678"]);
    assert_split(nz!(4), true, &["12345678", "9"], &["1234", "5678", "9"]);
    assert_split(nz!(4), true, &["1234", "567890"], &["1234", "5678", "90"]);
}

#[test]
fn flush_on_empty_stream_sends_nothing() {
    async_test(async || {
        let mut stream = OutputStream::with_capacity(RecordingSink::new(), nz!(8));

        stream.flush().await.unwrap();
        assert!(stream.sink().packets().is_empty());

        stream.close().await.unwrap();
        assert!(stream.sink().packets().is_empty());
    });
}

#[test]
fn simple_write() {
    async_test(async || {
        let mut stream = OutputStream::with_capacity(RecordingSink::new(), nz!(8));

        stream.write(b"te").await.unwrap();
        stream.write(b"st").await.unwrap();
        stream.write(b"abcdefgh1234").await.unwrap();
        stream.close().await.unwrap();

        assert_eq!(stream.sink().contents(), b"testabcdefgh1234");
    });
}

#[test]
fn mixed_mode_write() {
    async_test(async || {
        let mut stream = OutputStream::with_capacity(RecordingSink::new(), nz!(8));

        // Copied bytes live in a buffer.
        stream.write(b"te").await.unwrap();
        assert_eq!(stream.mode(), Mode::Buffered);

        // A zero-copy write takes over the buffered bytes as a fragment.
        stream.write_owned(Bytes::from_static(b"st")).unwrap();
        assert_eq!(stream.mode(), Mode::ZeroCopy);

        // Nothing is held after a flush.
        stream.flush().await.unwrap();
        assert_eq!(stream.mode(), Mode::Idle);

        stream.close().await.unwrap();

        let packets = stream.sink().packets();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].to_vec(), b"test");
    });
}

#[test]
fn large_writes_to_null_sink() {
    async_test(async || {
        let options = OutputStreamOptions::new(nz!(64)).trim_to_size(true);
        let mut stream = OutputStream::new(NullSink::new(), options);

        for len in [1_usize, 63, 64, 65, 1000, 4096] {
            stream.write(&vec![0xAB; len]).await.unwrap();
            assert!(stream.held_len() < 64);
        }

        stream.close().await.unwrap();
        assert!(stream.is_closed());
    });
}
