// SPDX-License-Identifier: MIT

//! Launch error types.
//!

use std::io;

use thiserror::Error;

use super::platform::{PrivilegeName, ProcessId};
use crate::session::SessionError;

/// Failure to enable a privilege on a token.
#[derive(Debug, Error)]
pub enum PrivilegeError {
    #[error("could not look up privilege {name}: {source}")]
    LookupFailed {
        name: PrivilegeName,
        #[source]
        source: io::Error,
    },
    #[error("could not enable privilege {name}: {source}")]
    AdjustFailed {
        name: PrivilegeName,
        #[source]
        source: io::Error,
    },
}

/// Failure at one step of starting a process as a child of another process.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("could not impersonate self: {0}")]
    ImpersonationFailed(#[source] io::Error),
    #[error(transparent)]
    Privilege(#[from] PrivilegeError),
    #[error("could not open process {pid}: {source}")]
    ProcessOpenFailed {
        pid: ProcessId,
        #[source]
        source: io::Error,
    },
    #[error("could not open token of process {pid}: {source}")]
    TokenOpenFailed {
        pid: ProcessId,
        #[source]
        source: io::Error,
    },
    #[error("could not read environment of process {pid}: {source}")]
    EnvironmentExtractionFailed {
        pid: ProcessId,
        #[source]
        source: io::Error,
    },
    #[error("could not create process {exe}: {source}")]
    ProcessCreationFailed {
        exe: String,
        #[source]
        source: io::Error,
    },
}

impl SpawnError {
    /// Short name of the step that failed.
    pub fn step(&self) -> &'static str {
        match self {
            Self::ImpersonationFailed(_) => "impersonate",
            Self::Privilege(PrivilegeError::LookupFailed { .. }) => "privilege lookup",
            Self::Privilege(PrivilegeError::AdjustFailed { .. }) => "privilege adjust",
            Self::ProcessOpenFailed { .. } => "open process",
            Self::TokenOpenFailed { .. } => "open token",
            Self::EnvironmentExtractionFailed { .. } => "read environment",
            Self::ProcessCreationFailed { .. } => "create process",
        }
    }

    /// The platform error underneath this failure.
    pub fn os_error(&self) -> &io::Error {
        match self {
            Self::ImpersonationFailed(e) => e,
            Self::Privilege(PrivilegeError::LookupFailed { source, .. })
            | Self::Privilege(PrivilegeError::AdjustFailed { source, .. })
            | Self::ProcessOpenFailed { source, .. }
            | Self::TokenOpenFailed { source, .. }
            | Self::EnvironmentExtractionFailed { source, .. }
            | Self::ProcessCreationFailed { source, .. } => source,
        }
    }
}

/// Error returned by the public launch operation.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to find desktop: {0}")]
    Desktop(#[from] SessionError),
    #[error("failed to start executable: {0}")]
    Start(#[from] SpawnError),
}

impl From<SpawnError> for io::Error {
    fn from(e: SpawnError) -> Self {
        let kind = e.os_error().kind();
        io::Error::new(kind, e)
    }
}

impl From<LaunchError> for io::Error {
    fn from(e: LaunchError) -> Self {
        let kind = match &e {
            LaunchError::Desktop(SessionError::Os(source)) => source.kind(),
            LaunchError::Desktop(_) => io::ErrorKind::NotFound,
            LaunchError::Start(s) => s.os_error().kind(),
        };
        io::Error::new(kind, e)
    }
}
