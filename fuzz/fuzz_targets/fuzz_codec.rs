// Copyright 2026 BadCompany
// Licensed under the Apache License, Version 2.0

#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use mist::transport::codec::EnvelopeCodec;
use mist::transport::ResponseSelector;
use mist::mist_core::constants::limits;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    // Any byte sequence must frame without panicking, and every yielded
    // line must be newline-free.
    let mut codec = EnvelopeCodec::with_max_length(limits::MAX_LINE_BYTES);
    let mut buffer = BytesMut::from(data);
    let mut selector = ResponseSelector::new();

    loop {
        match codec.decode_eof(&mut buffer) {
            Ok(Some(line)) => {
                assert!(!line.contains(&b'\n'));
                selector.feed(line);
            }
            Ok(None) | Err(_) => break,
        }
    }

    let _ = selector.finish().into_message();
});
