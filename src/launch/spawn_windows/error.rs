// SPDX-License-Identifier: MIT

//! Windows based errors.

use std::io;

use windows_result::{Error, HRESULT};

const FACILITY_WIN32_MASK: u32 = 0xFFFF_0000;
const FACILITY_WIN32_PREFIX: u32 = 0x8007_0000;

/// Turn a windows error into an I/O error that keeps the Win32 error code.
pub fn os_error(e: Error) -> io::Error {
    io::Error::from_raw_os_error(win32_code(e.code()))
}

/// Unwrap an `HRESULT_FROM_WIN32` value back into the Win32 code.
fn win32_code(hr: HRESULT) -> i32 {
    let v = hr.0 as u32;
    if v & FACILITY_WIN32_MASK == FACILITY_WIN32_PREFIX {
        (v & 0xFFFF) as i32
    } else {
        hr.0
    }
}
