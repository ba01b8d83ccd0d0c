// SPDX-License-Identifier: MIT

//! Self-impersonation on the calling thread.
//!
//! While the scope is open the thread carries its own impersonation token, so
//! privilege changes land on that token instead of the process token.  The
//! token belongs to the OS thread, which is why the scope is neither `Send`
//! nor `Sync`: it cannot leave the thread that began it.
//!
//! Work that depends on the thread token goes through the scope, so it can
//! only run on that thread and only while the scope is open.  Resources
//! opened through the scope borrow it and are released before it ends.

use std::{io, marker::PhantomData};

use super::environ::EnvironmentBlock;
use super::error::SpawnError;
use super::guard::Held;
use super::platform::{CreateRequest, Platform, PrivilegeName, ProcessAccess, ProcessId};
use super::privilege;

pub struct ImpersonationScope<'p, P: Platform> {
    platform: &'p P,
    active: bool,
    // Keeps the scope on the thread that created it.
    _thread: PhantomData<*const ()>,
}

impl<'p, P: Platform> ImpersonationScope<'p, P> {
    /// Start impersonating the process's own security context on this thread.
    pub fn begin(platform: &'p P) -> Result<Self, SpawnError> {
        platform
            .impersonate_self()
            .map_err(SpawnError::ImpersonationFailed)?;
        tracing::debug!("impersonating self");
        Ok(Self {
            platform,
            active: true,
            _thread: PhantomData,
        })
    }

    /// Open the impersonation token of this thread.
    pub fn thread_token(&self) -> Result<Held<'p, P, P::Token>, SpawnError> {
        let token = self
            .platform
            .open_thread_token()
            .map_err(SpawnError::ImpersonationFailed)?;
        Ok(Held::token(self.platform, token))
    }

    /// Enable `name` on the thread token.  The privilege goes away with the
    /// token when the scope ends.
    pub fn enable_privilege(&self, name: &PrivilegeName) -> Result<(), SpawnError> {
        let token = self.thread_token()?;
        privilege::enable(self.platform, &token, name)?;
        Ok(())
    }

    pub fn open_process(
        &self,
        pid: ProcessId,
        access: ProcessAccess,
    ) -> io::Result<Held<'_, P, P::Process>> {
        let process = self.platform.open_process(pid, access)?;
        Ok(Held::process(self.platform, process))
    }

    pub fn open_process_token(&self, process: &P::Process) -> io::Result<Held<'_, P, P::Token>> {
        let token = self.platform.open_process_token(process)?;
        Ok(Held::token(self.platform, token))
    }

    pub fn token_environment(&self, token: &P::Token) -> io::Result<EnvironmentBlock> {
        self.platform.token_environment(token)
    }

    pub fn create_process(&self, request: &CreateRequest, parent: &P::Process) -> io::Result<()> {
        self.platform.create_process(request, parent)
    }

    /// Stop impersonating.  Dropping the scope does the same.
    pub fn end(mut self) {
        self.revert();
    }

    fn revert(&mut self) {
        if self.active {
            self.active = false;
            self.platform.revert_to_self();
            tracing::debug!("reverted to self");
        }
    }
}

impl<P: Platform> Drop for ImpersonationScope<'_, P> {
    fn drop(&mut self) {
        self.revert();
    }
}
