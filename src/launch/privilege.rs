// SPDX-License-Identifier: MIT

//! Enable a named privilege on a token.

use super::error::PrivilegeError;
use super::platform::{Platform, PrivilegeName};

pub fn enable<P: Platform>(
    platform: &P,
    token: &P::Token,
    name: &PrivilegeName,
) -> Result<(), PrivilegeError> {
    let privilege = platform
        .lookup_privilege(name)
        .map_err(|source| PrivilegeError::LookupFailed {
            name: name.clone(),
            source,
        })?;
    platform
        .enable_privilege(token, privilege)
        .map_err(|source| PrivilegeError::AdjustFailed {
            name: name.clone(),
            source,
        })?;
    tracing::debug!(privilege = name.as_str(), "enabled privilege");
    Ok(())
}
