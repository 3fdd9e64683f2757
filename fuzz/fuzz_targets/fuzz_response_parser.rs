#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 32768 { return; }
    let text = String::from_utf8_lossy(data);
    if let Ok(parsed) = sleeqc::protocol::parse_response(&text) {
        // Whatever parses must re-encode to a frame that parses to the same bytes.
        let frame = sleeqc::protocol::SignedResponse {
            algorithm: parsed.algorithm,
            latency_ms: parsed.latency_ms.unwrap_or(0.0),
            signature: &parsed.signature,
            public_key: &parsed.public_key,
        }
        .encode();
        let again = sleeqc::protocol::parse_response(&frame).expect("re-encoded frame parses");
        assert_eq!(again.signature, parsed.signature);
        assert_eq!(again.public_key, parsed.public_key);
    }
});
