// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shows how an `OutputStream` coalesces many small writes into few packets, and how
//! zero-copy writes are handed to the sink without copying.

use bytes::Bytes;
use new_zealand::nz;
use outflow::testing::RecordingSink;
use outflow::{OutputStream, OutputStreamOptions};

fn main() {
    futures::executor::block_on(async {
        let options = OutputStreamOptions::new(nz!(16)).trim_to_size(true);
        let mut stream = OutputStream::new(RecordingSink::new(), options);

        // Many small writes end up in a handful of 16-byte packets.
        for line in 0..10 {
            let text = format!("line {line}\n");
            stream.write(text.as_bytes()).await.unwrap();
        }

        // A large payload that we already own is handed over as-is.
        let payload = Bytes::from(vec![b'x'; 1024]);
        stream.write_owned(payload).unwrap();

        stream.close().await.unwrap();

        for (index, packet) in stream.sink().packets().iter().enumerate() {
            println!(
                "packet {index}: {} bytes in {} fragment(s)",
                packet.len(),
                packet.fragment_count()
            );
        }
    });
}
