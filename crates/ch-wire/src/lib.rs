// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binary-safe, length-prefixed framing for a list of command words.
//!
//! Frame layout: a 4-byte big-endian word count, followed by each word as
//! a 4-byte big-endian length prefix and its raw bytes.

use std::io::{self, Read, Write};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Encodes a list of command words into the length-prefixed wire format.
pub fn encode(words: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(words.len() as u32).to_be_bytes());
    for word in words {
        out.extend_from_slice(&(word.len() as u32).to_be_bytes());
        out.extend_from_slice(word);
    }
    out
}

/// Writes one message (a list of command words) to `writer`.
pub fn write_message(writer: &mut impl Write, words: &[Vec<u8>]) -> Result<(), WireError> {
    writer.write_all(&encode(words))?;
    Ok(())
}

/// Reads one message (a list of command words) from `reader`.
pub fn read_message(reader: &mut impl Read) -> Result<Vec<Vec<u8>>, WireError> {
    let count = read_u32(reader)?;
    let mut words = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let len = read_u32(reader)?;
        let mut buf = vec![0u8; len as usize];
        reader.read_exact(&mut buf)?;
        words.push(buf);
    }
    Ok(words)
}

fn read_u32(reader: &mut impl Read) -> Result<u32, WireError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
