// SPDX-License-Identifier: MIT

//! Interactive session helpers.
//!
//! The desktop lookup used by the launcher reports its failures through
//! [`SessionError`].  The remaining helpers are small Windows queries a
//! service typically needs next to the launcher: the console session id,
//! a single-instance mutex, and a check that a SID names a real principal.

use std::io;

use thiserror::Error;

#[cfg(target_os = "windows")]
mod win;

#[cfg(target_os = "windows")]
pub use win::{AppMutex, active_console_session_id, is_sid_valid_principal};

#[derive(Debug, Error)]
pub enum SessionError {
    /// No user is logged in, or the desktop shell is not running yet.
    #[error("no shell process is present")]
    NoActiveSession,
    /// The desktop window exists, but no owning process could be found.
    #[error("invalid PID for HWND {window}")]
    InvalidSessionProcess { window: String },
    #[error("mutex {name} already exists")]
    AlreadyExists { name: String },
    #[error(transparent)]
    Os(#[from] io::Error),
}

// SID_NAME_USE values.
const SID_TYPE_USER: u32 = 1;
const SID_TYPE_GROUP: u32 = 2;
const SID_TYPE_DOMAIN: u32 = 3;
const SID_TYPE_ALIAS: u32 = 4;
const SID_TYPE_WELL_KNOWN_GROUP: u32 = 5;
const SID_TYPE_COMPUTER: u32 = 9;

/// Whether an account kind (a `SID_NAME_USE` value) names a principal that
/// can be granted access.
///
/// Deleted accounts, invalid and unknown SIDs, and mandatory labels are rejected.
pub fn is_principal_kind(kind: u32) -> bool {
    matches!(
        kind,
        SID_TYPE_USER
            | SID_TYPE_GROUP
            | SID_TYPE_DOMAIN
            | SID_TYPE_ALIAS
            | SID_TYPE_WELL_KNOWN_GROUP
            | SID_TYPE_COMPUTER
    )
}
