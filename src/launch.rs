// SPDX-License-Identifier: MIT

//! Launches a program in the interactive user's desktop session.
//!
//! A service runs in session 0, isolated from the logged-in user's desktop.
//! Rather than building a token for the user, the launcher finds the process
//! that owns the desktop shell window and creates the new process with that
//! shell process as its parent.  The child then inherits the shell's session,
//! desktop and environment.
//!
//! [`Launcher`] runs the sequence against any [`Platform`]; on Windows,
//! [`launch_as_current_interactive_user`] runs it against the real system.

mod environ;
mod error;
mod guard;
mod impersonate;
mod locate;
mod platform;
mod privilege;
mod spawn;

pub use environ::{EnvironmentBlock, quote_command_line};
pub use error::{LaunchError, PrivilegeError, SpawnError};
pub use guard::Held;
pub use impersonate::ImpersonationScope;
pub use platform::{CreateRequest, Platform, PrivilegeName, ProcessAccess, ProcessId, SE_DEBUG_PRIVILEGE};
pub use spawn::resolve_executable;

use crate::session::SessionError;

#[cfg(target_os = "windows")]
pub(crate) mod spawn_windows;

#[cfg(target_os = "windows")]
pub use spawn_windows::WindowsPlatform;

/// Runs launches against one platform.
pub struct Launcher<P: Platform> {
    platform: P,
}

impl<P: Platform> Launcher<P> {
    pub fn new(platform: P) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The process owning the active desktop, normally explorer.exe.
    pub fn desktop_process(&self) -> Result<ProcessId, SessionError> {
        locate::desktop_process(&self.platform)
    }

    /// Start `exe` as a child of `parent`, with `parent`'s environment
    /// followed by `extra_env`.
    pub fn spawn_as_child<S: AsRef<str>>(
        &self,
        parent: ProcessId,
        exe: &str,
        extra_env: &[S],
    ) -> Result<(), SpawnError> {
        spawn::spawn_as_child(&self.platform, parent, exe, extra_env)
    }

    /// Find the current desktop process and start `exe` as its child.
    pub fn launch_as_current_interactive_user<S: AsRef<str>>(
        &self,
        exe: &str,
        extra_env: &[S],
    ) -> Result<(), LaunchError> {
        let launch = || -> Result<(), LaunchError> {
            let pid = self.desktop_process()?;
            self.spawn_as_child(pid, exe, extra_env)?;
            Ok(())
        };
        let ret = launch();
        if let Err(e) = &ret {
            tracing::warn!(exe, "launch failed: {}", e);
        }
        ret
    }
}

/// Start `exe` in the desktop session of the logged-in user.
///
/// The new process is not tracked after creation.  The calling process needs
/// SeDebugPrivilege, which services running as LocalSystem hold.
#[cfg(target_os = "windows")]
pub fn launch_as_current_interactive_user<S: AsRef<str>>(
    exe: &str,
    extra_env: &[S],
) -> Result<(), LaunchError> {
    Launcher::new(WindowsPlatform).launch_as_current_interactive_user(exe, extra_env)
}
