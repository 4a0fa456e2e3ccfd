#![no_main]

use esgate_core::{ParseOptions, tokenize};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // Tolerant runs never fail; strict runs fail exactly when tolerant ones
    // report an error.
    let jsx = ParseOptions::from_json(r#"{"tolerant": true, "comment": true, "range": true, "ecmaFeatures": {"jsx": true}}"#)
        .expect("static options");
    let tolerant = tokenize(source, &jsx).expect("tolerant tokenize never fails");
    let strict = ParseOptions {
        tolerant: false,
        ..jsx
    };
    let has_errors = tolerant.errors.as_ref().is_some_and(|e| !e.is_empty());
    assert_eq!(tokenize(source, &strict).is_err(), has_errors);
});
