#![no_main]

use esgate_core::{Feature, FeatureSet, ParseOptions, parse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The first three bytes pick the features; the rest is the source.
    if data.len() < 3 {
        return;
    }
    let bits = u32::from_le_bytes([data[0], data[1], data[2], 0]);
    let Ok(source) = std::str::from_utf8(&data[3..]) else {
        return;
    };

    let features: FeatureSet = Feature::ALL
        .iter()
        .enumerate()
        .map(|(i, &f)| (f, bits & (1 << i) != 0))
        .collect();
    let opts = ParseOptions {
        range: true,
        loc: true,
        tokens: true,
        attach_comment: bits & (1 << 23) != 0,
        ecma_features: features,
        ..ParseOptions::default()
    };

    if let Ok(program) = parse(source, &opts) {
        let range = program.root.range.expect("range was requested");
        assert!(range[1] <= source.len(), "program end past input");
        if let Some(tokens) = &program.tokens {
            for pair in tokens.windows(2) {
                let (a, b) = (pair[0].range.unwrap(), pair[1].range.unwrap());
                assert!(a[1] <= b[0], "tokens out of order");
            }
        }
        let _ = serde_json::to_string(&program);
    }
});
