//! # sessionhop
//!
//! Lets a privileged background service start a program inside the desktop
//! session of the currently logged-in interactive user.

pub mod config;
pub mod launch;
pub mod session;


pub use launch::{
    EnvironmentBlock, LaunchError, Launcher, Platform, PrivilegeError, PrivilegeName,
    ProcessAccess, ProcessId, SpawnError,
};
pub use session::SessionError;

#[cfg(target_os = "windows")]
pub use launch::{WindowsPlatform, launch_as_current_interactive_user};
