// SPDX-License-Identifier: MIT

//! Win32 implementation of the launch primitives.
//!
//! Parent process spoofing through `PROC_THREAD_ATTRIBUTE_PARENT_PROCESS`:
//!   https://learn.microsoft.com/en-us/windows/win32/api/processthreadsapi/nf-processthreadsapi-updateprocthreadattribute
//! Opening the parent needs only `PROCESS_CREATE_PROCESS`, but the shell runs
//! as another user, so SeDebugPrivilege is still needed to get that right:
//!   https://devblogs.microsoft.com/oldnewthing/20080314-00/?p=23113

mod attribute_list;
pub(crate) mod conv;
pub(crate) mod error;
mod platform;

pub use platform::WindowsPlatform;
