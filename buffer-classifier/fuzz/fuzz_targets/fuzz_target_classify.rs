#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    buffer_classifier::fuzz_entry(data);
});
