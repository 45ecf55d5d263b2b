// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! C ABI for harnesses written in C, C++, or Go.
//!
//! ```c
//! int process_buffer(const uint8_t* data, size_t size);
//! ```

use libc::{c_int, size_t};

/// Classify `size` bytes at `data`. A null `data` is treated as empty.
///
/// # Safety
///
/// When `data` is non-null it must be valid for reads of `size` bytes for the
/// duration of the call.
#[no_mangle]
pub unsafe extern "C" fn process_buffer(data: *const u8, size: size_t) -> c_int {
    if data.is_null() || size == 0 {
        return crate::NO_MATCH as c_int;
    }

    let data = std::slice::from_raw_parts(data, size);
    crate::classify(data) as c_int
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MATCH, NO_MATCH};

    #[test]
    fn test_null_is_empty() {
        let result = unsafe { process_buffer(std::ptr::null(), 16) };
        assert_eq!(result, NO_MATCH);
    }

    #[test]
    fn test_size_bounds_the_read() {
        let data = b"FUZZX";

        // The trigger byte is present in memory but outside `size`.
        let result = unsafe { process_buffer(data.as_ptr(), 4) };
        assert_eq!(result, MATCH);

        let result = unsafe { process_buffer(data.as_ptr(), 3) };
        assert_eq!(result, NO_MATCH);
    }

    #[test]
    fn test_non_trigger() {
        let data = b"FUZZY";
        let result = unsafe { process_buffer(data.as_ptr(), data.len()) };
        assert_eq!(result, MATCH);
    }
}
