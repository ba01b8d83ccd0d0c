// SPDX-License-Identifier: MIT

//! Start a process as the child of another, already running, process.
//!
//! The new process is created with the other process set as its parent, so
//! it lands in that process's session and desktop, and it starts with the
//! environment that process was started with plus any extra entries.

use std::{
    io,
    path::{Path, PathBuf},
};

use super::{
    error::SpawnError,
    impersonate::ImpersonationScope,
    platform::{CreateRequest, Platform, PrivilegeName, ProcessAccess, ProcessId, SE_DEBUG_PRIVILEGE},
};

/// Run `exe` as a child of `parent`.
///
/// The first failing step aborts the launch.  Every handle and token opened
/// along the way is closed, and impersonation ends, before this returns.
pub fn spawn_as_child<P: Platform, S: AsRef<str>>(
    platform: &P,
    parent: ProcessId,
    exe: &str,
    extra_env: &[S],
) -> Result<(), SpawnError> {
    let scope = ImpersonationScope::begin(platform)?;

    // Opening another user's process for PROCESS_CREATE_PROCESS needs
    // SeDebugPrivilege.  It is enabled on the thread token only.
    scope.enable_privilege(&PrivilegeName::new(SE_DEBUG_PRIVILEGE))?;

    tracing::debug!(pid = parent.0, "opening parent process");
    let process = scope
        .open_process(parent, ProcessAccess::PARENT)
        .map_err(|source| SpawnError::ProcessOpenFailed { pid: parent, source })?;

    let token = scope
        .open_process_token(&process)
        .map_err(|source| SpawnError::TokenOpenFailed { pid: parent, source })?;

    let env = scope
        .token_environment(&token)
        .map_err(|source| SpawnError::EnvironmentExtractionFailed { pid: parent, source })?
        .merged(extra_env);
    tracing::debug!(pid = parent.0, entries = env.len(), "read parent environment");

    let creation_failed = |source: io::Error| SpawnError::ProcessCreationFailed {
        exe: exe.to_string(),
        source,
    };
    let request = CreateRequest {
        exe: resolve_executable(exe).map_err(creation_failed)?,
        env,
    };
    scope
        .create_process(&request, &process)
        .map_err(creation_failed)?;
    tracing::info!(pid = parent.0, exe = %request.exe.display(), "started process in parent's session");

    drop(token);
    drop(process);
    scope.end();
    Ok(())
}

/// Look up a bare program name on `PATH`.  Anything with a directory part is
/// used as given.
pub fn resolve_executable(exe: &str) -> io::Result<PathBuf> {
    let path = Path::new(exe);
    let bare = path.parent().is_none_or(|p| p.as_os_str().is_empty());
    if !bare {
        return Ok(path.to_path_buf());
    }
    which::which(exe).map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))
}
