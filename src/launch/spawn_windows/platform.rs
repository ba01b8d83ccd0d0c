// SPDX-License-Identifier: MIT

use std::{ffi::OsStr, io, mem, ptr};

use windows::{
    Win32::{
        Foundation::{CloseHandle, ERROR_NOT_ALL_ASSIGNED, GetLastError, HANDLE, HWND, LUID},
        Security::{
            AdjustTokenPrivileges, ImpersonateSelf, LUID_AND_ATTRIBUTES, LookupPrivilegeValueW,
            RevertToSelf, SE_PRIVILEGE_ENABLED, SecurityImpersonation, TOKEN_ADJUST_PRIVILEGES,
            TOKEN_PRIVILEGES, TOKEN_QUERY,
        },
        System::{
            Environment::{CreateEnvironmentBlock, DestroyEnvironmentBlock},
            Threading::{
                CREATE_UNICODE_ENVIRONMENT, CreateProcessW, EXTENDED_STARTUPINFO_PRESENT,
                GetCurrentThread, OpenProcess, OpenProcessToken, OpenThreadToken,
                PROCESS_ACCESS_RIGHTS, PROCESS_INFORMATION, STARTUPINFOEXW,
            },
        },
        UI::WindowsAndMessaging::{GetShellWindow, GetWindowThreadProcessId},
    },
    core::{PCWSTR, PWSTR},
};

use super::{
    attribute_list::{ParentProcess, ThreadAttributeList},
    conv::{as_c_str_w, wide_block},
    error::os_error,
};
use crate::launch::{
    environ::{EnvironmentBlock, quote_command_line},
    platform::{CreateRequest, Platform, PrivilegeName, ProcessAccess, ProcessId},
};

/// The live Win32 system.  Stateless; the API bindings are linked in.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsPlatform;

impl Platform for WindowsPlatform {
    type Window = HWND;
    type Token = HANDLE;
    type Process = HANDLE;
    type Privilege = LUID;

    fn shell_window(&self) -> Option<HWND> {
        let hwnd = unsafe { GetShellWindow() };
        if hwnd.is_invalid() { None } else { Some(hwnd) }
    }

    fn window_process_id(&self, window: HWND) -> ProcessId {
        let mut pid = 0u32;
        unsafe { GetWindowThreadProcessId(window, Some(&mut pid as *mut u32)) };
        ProcessId(pid)
    }

    fn impersonate_self(&self) -> io::Result<()> {
        unsafe { ImpersonateSelf(SecurityImpersonation) }.map_err(os_error)
    }

    fn revert_to_self(&self) {
        let _ = unsafe { RevertToSelf() };
    }

    fn open_thread_token(&self) -> io::Result<HANDLE> {
        let mut token = HANDLE::default();
        unsafe {
            OpenThreadToken(
                GetCurrentThread(),
                TOKEN_QUERY | TOKEN_ADJUST_PRIVILEGES,
                false, // check access against the impersonation context
                &mut token,
            )
        }
        .map_err(os_error)?;
        Ok(token)
    }

    fn lookup_privilege(&self, name: &PrivilegeName) -> io::Result<LUID> {
        let wide = as_c_str_w(OsStr::new(name.as_str()));
        let mut luid = LUID::default();
        unsafe { LookupPrivilegeValueW(PCWSTR::null(), PCWSTR(wide.as_ptr()), &mut luid) }
            .map_err(os_error)?;
        Ok(luid)
    }

    fn enable_privilege(&self, token: &HANDLE, privilege: LUID) -> io::Result<()> {
        let state = TOKEN_PRIVILEGES {
            PrivilegeCount: 1,
            Privileges: [LUID_AND_ATTRIBUTES {
                Luid: privilege,
                Attributes: SE_PRIVILEGE_ENABLED,
            }],
        };
        unsafe {
            AdjustTokenPrivileges(
                *token,
                false,
                Some(&state as *const TOKEN_PRIVILEGES),
                0,
                None, // previous state not needed
                None,
            )
        }
        .map_err(os_error)?;
        // Reports success even when the token does not hold the privilege.
        if unsafe { GetLastError() } == ERROR_NOT_ALL_ASSIGNED {
            return Err(io::Error::from_raw_os_error(ERROR_NOT_ALL_ASSIGNED.0 as i32));
        }
        Ok(())
    }

    fn open_process(&self, pid: ProcessId, access: ProcessAccess) -> io::Result<HANDLE> {
        unsafe { OpenProcess(PROCESS_ACCESS_RIGHTS(access.bits()), false, pid.0) }.map_err(os_error)
    }

    fn open_process_token(&self, process: &HANDLE) -> io::Result<HANDLE> {
        let mut token = HANDLE::default();
        unsafe { OpenProcessToken(*process, TOKEN_QUERY, &mut token) }.map_err(os_error)?;
        Ok(token)
    }

    fn token_environment(&self, token: &HANDLE) -> io::Result<EnvironmentBlock> {
        let mut block: *mut core::ffi::c_void = ptr::null_mut();
        unsafe {
            CreateEnvironmentBlock(
                &mut block,
                Some(*token),
                false, // only the token's user environment, not this service's
            )
        }
        .map_err(os_error)?;
        let ret = EnvironmentBlock::decode_wide(unsafe { wide_block(block as *const u16) });
        let _ = unsafe { DestroyEnvironmentBlock(block) };
        Ok(ret)
    }

    fn create_process(&self, request: &CreateRequest, parent: &HANDLE) -> io::Result<()> {
        let exe = request.exe.to_str().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "executable path is not unicode")
        })?;
        let app = as_c_str_w(request.exe.as_os_str());
        let mut cmdline = quote_command_line(exe)?;
        let env = request.env.encode_wide()?;

        let attributes = ThreadAttributeList::new(vec![Box::new(ParentProcess(*parent))])
            .map_err(os_error)?;
        let attr_list = attributes
            .list()
            .ok_or_else(|| io::Error::other("empty process attribute list"))?;

        let mut si_ex: STARTUPINFOEXW = unsafe { mem::zeroed() };
        si_ex.StartupInfo.cb = mem::size_of::<STARTUPINFOEXW>() as u32;
        si_ex.lpAttributeList = attr_list;

        let mut pi: PROCESS_INFORMATION = unsafe { mem::zeroed() };
        unsafe {
            CreateProcessW(
                PCWSTR(app.as_ptr()),             // application name
                Some(PWSTR(cmdline.as_mut_ptr())), // command line, argv[0] only
                None,                             // process attributes
                None,                             // thread attributes
                false,                            // inherit no handles from the service
                EXTENDED_STARTUPINFO_PRESENT | CREATE_UNICODE_ENVIRONMENT,
                Some(env.as_ptr() as *const core::ffi::c_void),
                PCWSTR::null(), // current directory of the service
                &si_ex.StartupInfo,
                &mut pi,
            )
        }
        .map_err(os_error)?;

        // Nothing tracks the new process.
        unsafe {
            let _ = CloseHandle(pi.hThread);
            let _ = CloseHandle(pi.hProcess);
        }
        Ok(())
    }

    fn close_token(&self, token: HANDLE) {
        let _ = unsafe { CloseHandle(token) };
    }

    fn close_process(&self, process: HANDLE) {
        let _ = unsafe { CloseHandle(process) };
    }
}
