// SPDX-License-Identifier: MIT

//! Find the process that runs the active interactive desktop.
//!
//! Usually the shell window belongs to explorer.exe, see
//!   https://devblogs.microsoft.com/oldnewthing/20190425-00/?p=102443

use super::platform::{Platform, ProcessId};
use crate::session::SessionError;

/// The id of the process owning the shell window of the active desktop.
pub fn desktop_process<P: Platform>(platform: &P) -> Result<ProcessId, SessionError> {
    let window = platform
        .shell_window()
        .ok_or(SessionError::NoActiveSession)?;
    let pid = platform.window_process_id(window);
    if pid.0 == 0 {
        return Err(SessionError::InvalidSessionProcess {
            window: format!("{:?}", window),
        });
    }
    tracing::debug!(pid = pid.0, "found desktop process");
    Ok(pid)
}
