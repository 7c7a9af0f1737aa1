// Copyright 2026 BadCompany
// Licensed under the Apache License, Version 2.0

#![no_main]

use libfuzzer_sys::fuzz_target;
use mist::Message;

fuzz_target!(|data: &[u8]| {
    // Decoding must never panic; whatever decodes must survive a re-encode.
    if let Ok(msg) = Message::decode(data) {
        let encoded = msg.encode().expect("decoded message re-encodes");
        let again = Message::decode(&encoded).expect("re-encoded message decodes");
        assert_eq!(again.id, msg.id);
        assert_eq!(again.message_type, msg.message_type);
        let _ = msg.validate();
    }
});
