//! Reading programs from disk.
//!
//! Programs come either as raw bytes or as hex text, one 16-bit word per
//! line:
//!
//! ```text
//! ; draw a 0 in the corner
//! 0x6000   <- qualifies, but must be the only token on the line
//! 0xF029
//! 0xD005
//! spin:
//! 0x1206
//! ```
//!
//! Only lines whose first token starts with `0x` count; everything else is
//! commentary and skipped. A counting line that isn't exactly one word of
//! 1-4 hex digits fails the whole load.

use crate::error::LoadError;
use log::{debug, info};
use std::fs;
use std::path::Path;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ProgramFormat {
    /// hex text if it looks like it, otherwise binary
    #[default]
    Auto,
    /// one `0x` word per line
    Hex,
    /// raw bytes
    Binary,
}

/// read and parse the program at `path`
pub fn read_program(path: &Path, format: ProgramFormat) -> Result<Vec<u8>, LoadError> {
    let raw = fs::read(path)?;
    let program = parse_program(&raw, format)?;
    info!(
        "read {} byte program from {}",
        program.len(),
        path.display()
    );
    Ok(program)
}

/// turn file contents into program bytes
pub fn parse_program(raw: &[u8], format: ProgramFormat) -> Result<Vec<u8>, LoadError> {
    let format = match format {
        ProgramFormat::Auto => guess_format(raw),
        f => f,
    };
    debug!("program format {:?}", format);
    match format {
        ProgramFormat::Hex => parse_hex_text(&String::from_utf8_lossy(raw)),
        _ => Ok(raw.to_vec()),
    }
}

/// hex text is anything with at least one line whose first token starts
/// with `0x`. comments can be in any encoding, so this goes by that rule
/// alone
fn guess_format(raw: &[u8]) -> ProgramFormat {
    let text = String::from_utf8_lossy(raw);
    let has_words = strip_bom(&text)
        .lines()
        .any(|line| line.trim_start().starts_with("0x"));
    if has_words {
        ProgramFormat::Hex
    } else {
        ProgramFormat::Binary
    }
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// parse hex text into big-endian bytes
pub fn parse_hex_text(text: &str) -> Result<Vec<u8>, LoadError> {
    let mut program = Vec::new();
    for (n, line) in strip_bom(text).split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let mut tokens = line.split_whitespace();
        let first = match tokens.next() {
            Some(token) if token.starts_with("0x") => token,
            _ => continue,
        };
        let malformed = || LoadError::MalformedLine {
            line: n + 1,
            text: line.to_string(),
        };
        if tokens.next().is_some() {
            return Err(malformed());
        }
        let word = parse_word(&first[2..]).ok_or_else(malformed)?;
        program.extend_from_slice(&word.to_be_bytes());
    }
    Ok(program)
}

/// 1-4 hex digits, nothing else
fn parse_word(digits: &str) -> Option<u16> {
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}
