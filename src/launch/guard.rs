// SPDX-License-Identifier: MIT

//! Scoped ownership of platform resources.
//! Because much of windows requires explicit open/close actions,
//! wrapping each one in a single struct that implements Drop will make code maintenance easier.

use std::ops::Deref;

use super::platform::Platform;

/// A token or process handle that is released through the platform when
/// dropped, on every exit path.
pub struct Held<'p, P: Platform, T> {
    platform: &'p P,
    value: Option<T>,
    release: fn(&P, T),
}

impl<'p, P: Platform> Held<'p, P, P::Token> {
    pub fn token(platform: &'p P, token: P::Token) -> Self {
        Self {
            platform,
            value: Some(token),
            release: P::close_token,
        }
    }
}

impl<'p, P: Platform> Held<'p, P, P::Process> {
    pub fn process(platform: &'p P, process: P::Process) -> Self {
        Self {
            platform,
            value: Some(process),
            release: P::close_process,
        }
    }
}

impl<P: Platform, T> Deref for Held<'_, P, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.value {
            Some(v) => v,
            // Only Drop takes the value.
            None => unreachable!("resource used after release"),
        }
    }
}

impl<P: Platform, T> Drop for Held<'_, P, T> {
    fn drop(&mut self) {
        if let Some(v) = self.value.take() {
            (self.release)(self.platform, v);
        }
    }
}
