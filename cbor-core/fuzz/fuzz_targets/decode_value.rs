//! Fuzz the top-level decode entry point: must never panic or loop,
//! whatever the input.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = cbor_core::decode(data);
});
