// SPDX-License-Identifier: MIT

//! Windows session queries.

use std::{ffi::OsStr, ptr};

use windows::Win32::{
    Foundation::{CloseHandle, ERROR_ALREADY_EXISTS, GetLastError, HANDLE},
    System::{RemoteDesktop::WTSGetActiveConsoleSessionId, Threading::CreateMutexW},
};
use windows::core::PCWSTR;

use super::{SessionError, is_principal_kind};
use crate::launch::spawn_windows::{conv::as_c_str_w, error::os_error};

/// The id of the session attached to the physical console.
/// `0xFFFFFFFF` while a session switch is in progress.
pub fn active_console_session_id() -> u32 {
    unsafe { WTSGetActiveConsoleSessionId() }
}

/// A named mutex, used to keep a single instance of an application running.
/// The handle closes when dropped.
pub struct AppMutex {
    handle: Option<HANDLE>,
}

impl AppMutex {
    /// Create the named mutex.  Fails with `AlreadyExists` when another
    /// holder created it first.
    pub fn create(name: &str) -> Result<Self, SessionError> {
        let wide = as_c_str_w(OsStr::new(name));
        let handle = unsafe { CreateMutexW(None, false, PCWSTR(wide.as_ptr())) }
            .map_err(|e| SessionError::Os(os_error(e)))?;
        // CreateMutexW hands back the existing mutex rather than failing.
        if unsafe { GetLastError() } == ERROR_ALREADY_EXISTS {
            let _ = unsafe { CloseHandle(handle) };
            return Err(SessionError::AlreadyExists {
                name: name.to_string(),
            });
        }
        Ok(Self {
            handle: Some(handle),
        })
    }

    pub fn handle(&self) -> Option<HANDLE> {
        self.handle
    }
}

impl Drop for AppMutex {
    fn drop(&mut self) {
        if let Some(h) = self.handle.take() {
            let _ = unsafe { CloseHandle(h) };
        }
    }
}

/// Whether the string SID resolves to an account that can hold access rights.
pub fn is_sid_valid_principal(sid: &str) -> bool {
    use winapi::shared::sddl::ConvertStringSidToSidW;
    use winapi::um::{winbase::LocalFree, winnt::PSID};

    let wide = as_c_str_w(OsStr::new(sid));
    let mut psid: PSID = ptr::null_mut();
    if unsafe { ConvertStringSidToSidW(wide.as_ptr(), &mut psid) } == 0 {
        return false;
    }
    let kind = lookup_account_kind(psid);
    // The SID buffer came from LocalAlloc.
    unsafe { LocalFree(psid as _) };
    kind.is_some_and(is_principal_kind)
}

fn lookup_account_kind(psid: winapi::um::winnt::PSID) -> Option<u32> {
    use winapi::um::{winbase::LookupAccountSidW, winnt::SID_NAME_USE};

    let mut name_len: u32 = 0;
    let mut domain_len: u32 = 0;
    let mut kind: SID_NAME_USE = 0;
    // First call only reports the buffer sizes.
    unsafe {
        LookupAccountSidW(
            ptr::null(),
            psid,
            ptr::null_mut(),
            &mut name_len,
            ptr::null_mut(),
            &mut domain_len,
            &mut kind,
        )
    };
    if name_len == 0 {
        return None;
    }

    let mut name = vec![0u16; name_len as usize];
    let mut domain = vec![0u16; domain_len.max(1) as usize];
    let ok = unsafe {
        LookupAccountSidW(
            ptr::null(),
            psid,
            name.as_mut_ptr(),
            &mut name_len,
            domain.as_mut_ptr(),
            &mut domain_len,
            &mut kind,
        )
    };
    if ok == 0 { None } else { Some(kind as u32) }
}
