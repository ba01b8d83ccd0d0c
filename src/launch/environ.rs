// SPDX-License-Identifier: MIT

//! Environment blocks and command lines in the form Windows process creation
//! expects.
//!
//! Windows takes the environment as one buffer of NUL-terminated `KEY=VALUE`
//! wide strings ending in an extra NUL, and the command line as a single
//! string that the child splits back into arguments.  See "Everyone quotes
//! command line arguments the wrong way":
//!   https://learn.microsoft.com/en-us/archive/blogs/twistylittlepassagesallalike/everyone-quotes-command-line-arguments-the-wrong-way

use std::io;

/// Ordered `KEY=VALUE` entries.
///
/// Entries are kept as raw UTF-16 units, so values that are not valid
/// Unicode pass from the parent's token to the new process untouched.
/// Order is kept exactly as given.  Duplicate keys are not removed here;
/// which one wins is up to the process loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentBlock {
    entries: Vec<Vec<u16>>,
}

impl EnvironmentBlock {
    /// Entries as raw wide units, without terminators.
    pub fn from_wide(entries: Vec<Vec<u16>>) -> Self {
        Self { entries }
    }

    pub fn wide_entries(&self) -> &[Vec<u16>] {
        &self.entries
    }

    /// The entries as text.  Invalid UTF-16 shows up as U+FFFD.
    pub fn to_strings_lossy(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| String::from_utf16_lossy(e))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append the extra entries after the existing ones, verbatim.
    pub fn merged<S: AsRef<str>>(mut self, extra: &[S]) -> Self {
        self.entries
            .extend(extra.iter().map(|e| e.as_ref().encode_utf16().collect()));
        self
    }

    /// Split a double-NUL terminated wide environment block into entries.
    /// Parsing stops at the first empty entry, so trailing data after the
    /// terminator is ignored.
    pub fn decode_wide(block: &[u16]) -> Self {
        let entries = block
            .split(|&c| c == 0)
            .take_while(|entry| !entry.is_empty())
            .map(<[u16]>::to_vec)
            .collect();
        Self { entries }
    }

    /// Encode into the double-NUL terminated wide form, in order.
    pub fn encode_wide(&self) -> io::Result<Vec<u16>> {
        if self.entries.is_empty() {
            // An empty environment block should produce just two NULs (double-NUL termination).
            // Otherwise, the logic will not add the double terminating NUL.
            return Ok(vec![0, 0]);
        }
        let mut block: Vec<u16> = Vec::new();
        for entry in &self.entries {
            if entry.contains(&0) {
                return Err(nul_error());
            }
            block.extend_from_slice(entry);
            block.push(0); // NUL terminator for this entry
        }
        block.push(0); // extra NUL terminator ends the block
        Ok(block)
    }
}

impl<'a> FromIterator<&'a str> for EnvironmentBlock {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|e| e.encode_utf16().collect()).collect(),
        }
    }
}

impl FromIterator<String> for EnvironmentBlock {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|e| e.encode_utf16().collect()).collect(),
        }
    }
}

/// Quote the executable path as `argv[0]` of a NUL-terminated command line.
pub fn quote_command_line(exe: &str) -> io::Result<Vec<u16>> {
    let mut ret = vec![];
    append_arg(&mut ret, exe)?;
    ret.push(0); // NUL terminator
    Ok(ret)
}

fn append_arg(cmd: &mut Vec<u16>, arg: &str) -> io::Result<()> {
    let arg = enforce_no_zero(arg)?;
    if !requires_quoting(arg) {
        cmd.extend(arg.encode_utf16());
        return Ok(());
    }

    cmd.push('"' as u16);
    let mut backslash_count = 0;
    for c in arg.encode_utf16() {
        if c == '\\' as u16 {
            backslash_count += 1;
            continue;
        }
        if c == '"' as u16 {
            // Escape all the backslashes, and add one for the escaped '"'.
            for _ in 0..(backslash_count * 2 + 1) {
                cmd.push('\\' as u16);
            }
        } else {
            for _ in 0..backslash_count {
                cmd.push('\\' as u16);
            }
        }
        cmd.push(c);
        backslash_count = 0;
    }

    // Escape all the trailing backslashes.
    // Let the final '"' be still considered a meta-character.
    for _ in 0..(backslash_count * 2) {
        cmd.push('\\' as u16);
    }

    cmd.push('"' as u16);
    Ok(())
}

fn enforce_no_zero(val: &str) -> io::Result<&str> {
    if val.contains('\0') { Err(nul_error()) } else { Ok(val) }
}

fn nul_error() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "nul byte found in value")
}

fn requires_quoting(val: &str) -> bool {
    val.is_empty() || val.chars().any(|c| matches!(c, ' ' | '\t' | '\n' | '\x0b' | '"'))
}
