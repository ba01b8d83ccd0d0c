// SPDX-License-Identifier: MIT

//! Registry backed lookups.

use std::ffi::OsStr;

use windows::Win32::{
    Foundation::{ERROR_FILE_NOT_FOUND, ERROR_MORE_DATA, ERROR_SUCCESS, WIN32_ERROR},
    System::Registry::{
        HKEY, HKEY_LOCAL_MACHINE, REG_VALUE_TYPE, RRF_RT_REG_DWORD, RRF_RT_REG_QWORD,
        RRF_RT_REG_SZ, RegGetValueW,
    },
};
use windows::core::PCWSTR;

use super::LookupStrategy;
use crate::launch::spawn_windows::conv::as_c_str_w;

/// Values stored under one registry key.
pub struct RegistryKey {
    root: HKEY,
    subkey: String,
}

impl RegistryKey {
    pub fn local_machine(subkey: &str) -> Self {
        Self {
            root: HKEY_LOCAL_MACHINE,
            subkey: subkey.to_string(),
        }
    }

    fn read_string(&self, name: &str) -> Result<String, WIN32_ERROR> {
        let subkey = as_c_str_w(OsStr::new(&self.subkey));
        let value = as_c_str_w(OsStr::new(name));
        let mut buf: Vec<u16> = vec![0; 64];
        loop {
            let mut size = (buf.len() * 2) as u32;
            let err = unsafe {
                RegGetValueW(
                    self.root,
                    PCWSTR(subkey.as_ptr()),
                    PCWSTR(value.as_ptr()),
                    RRF_RT_REG_SZ,
                    None,
                    Some(buf.as_mut_ptr().cast()),
                    Some(&mut size as *mut u32),
                )
            };
            if err == ERROR_MORE_DATA {
                // size now holds the needed byte count.
                buf.resize((size as usize).div_ceil(2), 0);
                continue;
            }
            if err != ERROR_SUCCESS {
                return Err(err);
            }
            let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
            return Ok(String::from_utf16_lossy(&buf[..len]));
        }
    }

    fn read_integer(&self, name: &str) -> Result<u64, WIN32_ERROR> {
        let subkey = as_c_str_w(OsStr::new(&self.subkey));
        let value = as_c_str_w(OsStr::new(name));
        // A DWORD fills the low half; the high half stays zero.
        let mut data: u64 = 0;
        let mut size = std::mem::size_of::<u64>() as u32;
        let mut kind = REG_VALUE_TYPE::default();
        let err = unsafe {
            RegGetValueW(
                self.root,
                PCWSTR(subkey.as_ptr()),
                PCWSTR(value.as_ptr()),
                RRF_RT_REG_DWORD | RRF_RT_REG_QWORD,
                Some(&mut kind as *mut REG_VALUE_TYPE),
                Some((&mut data as *mut u64).cast()),
                Some(&mut size as *mut u32),
            )
        };
        if err != ERROR_SUCCESS {
            return Err(err);
        }
        Ok(data)
    }

    fn tolerate<T>(&self, name: &str, ret: Result<T, WIN32_ERROR>) -> Option<T> {
        match ret {
            Ok(v) => Some(v),
            // Missing key or value.
            Err(ERROR_FILE_NOT_FOUND) => None,
            Err(e) => {
                tracing::debug!(key = self.subkey.as_str(), name, code = e.0, "registry read failed");
                None
            }
        }
    }
}

impl LookupStrategy for RegistryKey {
    fn string(&self, name: &str) -> Option<String> {
        self.tolerate(name, self.read_string(name))
    }

    fn integer(&self, name: &str) -> Option<u64> {
        self.tolerate(name, self.read_integer(name))
    }
}
