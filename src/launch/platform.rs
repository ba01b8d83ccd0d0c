// SPDX-License-Identifier: MIT

//! General model of the operating system primitives used to hop a new process
//! into another session.
//!
//! The launch sequence is written once against the [`Platform`] trait.  The
//! Windows implementation lives in `spawn_windows`; tests supply their own.

use std::{fmt, io, path::PathBuf};

use super::environ::EnvironmentBlock;

/// Numeric id of a live process.  The process may exit at any moment, so the
/// value is only a reference, never an ownership claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Name of a grantable token privilege, such as `SeDebugPrivilege`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeName(String);

impl PrivilegeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrivilegeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Privilege that allows opening processes owned by other users.
pub const SE_DEBUG_PRIVILEGE: &str = "SeDebugPrivilege";

/// Access rights requested when opening a process.
///
/// The bit values match the Win32 `PROCESS_*` access rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessAccess(u32);

impl ProcessAccess {
    pub const DUP_HANDLE: ProcessAccess = ProcessAccess(0x0040);
    pub const CREATE_PROCESS: ProcessAccess = ProcessAccess(0x0080);
    pub const QUERY_INFORMATION: ProcessAccess = ProcessAccess(0x0400);

    /// The rights needed to use a process as the parent of a new process and
    /// to read its token.
    pub const PARENT: ProcessAccess = ProcessAccess(
        Self::CREATE_PROCESS.0 | Self::QUERY_INFORMATION.0 | Self::DUP_HANDLE.0,
    );

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: ProcessAccess) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ProcessAccess {
    type Output = ProcessAccess;

    fn bitor(self, rhs: Self) -> Self::Output {
        ProcessAccess(self.0 | rhs.0)
    }
}

/// Everything process creation needs besides the parent.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub exe: PathBuf,
    pub env: EnvironmentBlock,
}

/// Operating system primitives for locating the desktop and creating a
/// process on behalf of another process.
///
/// Every `Token` and `Process` value handed out must be given back exactly
/// once through `close_token` or `close_process`.  The launch code does this
/// with drop guards, so an implementation never sees a double release.
///
/// Thread token operations act on the calling OS thread.  Callers must keep
/// `impersonate_self`, `open_thread_token`, `enable_privilege` and
/// `revert_to_self` on one thread, with the process operations between
/// them; `ImpersonationScope` enforces that.
pub trait Platform {
    /// Window handle type, kept only for diagnostics.
    type Window: Copy + fmt::Debug;
    type Token;
    type Process;
    /// The platform-local identifier for a privilege name.
    type Privilege: Copy;

    /// The window that owns the active interactive desktop, if any.
    fn shell_window(&self) -> Option<Self::Window>;

    /// The id of the process that created the window.  Zero when unknown.
    fn window_process_id(&self, window: Self::Window) -> ProcessId;

    /// Make the calling thread impersonate the process's own identity.
    fn impersonate_self(&self) -> io::Result<()>;

    /// Stop impersonating on the calling thread.  Best effort.
    fn revert_to_self(&self);

    /// Open the calling thread's impersonation token for query and
    /// privilege adjustment.
    fn open_thread_token(&self) -> io::Result<Self::Token>;

    fn lookup_privilege(&self, name: &PrivilegeName) -> io::Result<Self::Privilege>;

    /// Set exactly one privilege entry on the token to enabled, and apply it.
    ///
    /// A call that leaves the privilege unassigned must fail.  On Windows,
    /// `AdjustTokenPrivileges` succeeds with `ERROR_NOT_ALL_ASSIGNED` when the
    /// token does not hold the privilege; that is an error here.
    fn enable_privilege(&self, token: &Self::Token, privilege: Self::Privilege) -> io::Result<()>;

    fn open_process(&self, pid: ProcessId, access: ProcessAccess) -> io::Result<Self::Process>;

    /// Open the primary token of the process, read-only.
    fn open_process_token(&self, process: &Self::Process) -> io::Result<Self::Token>;

    /// The environment a process started with under this token.
    fn token_environment(&self, token: &Self::Token) -> io::Result<EnvironmentBlock>;

    /// Create a new process whose parent is `parent`.  Nothing about the new
    /// process is retained.
    fn create_process(&self, request: &CreateRequest, parent: &Self::Process) -> io::Result<()>;

    fn close_token(&self, token: Self::Token);

    fn close_process(&self, process: Self::Process);
}
