// SPDX-License-Identifier: MIT

//! Various type conversion routines.

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

/// Convert the OS string into a null-terminated wide (16-bit) C string.
pub fn as_c_str_w(s: &OsStr) -> Vec<u16> {
    s.encode_wide().chain(std::iter::once(0)).collect()
}

/// Borrow a double-NUL terminated wide block, terminators included.
///
/// # Safety
/// `block` must point to a readable block that ends in two consecutive NULs,
/// and must stay valid for the returned lifetime.
pub unsafe fn wide_block<'a>(block: *const u16) -> &'a [u16] {
    let mut len = 0;
    unsafe {
        while !(*block.add(len) == 0 && *block.add(len + 1) == 0) {
            len += 1;
        }
        std::slice::from_raw_parts(block, len + 2)
    }
}
