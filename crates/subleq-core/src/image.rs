//! Program image loading.
//!
//! An image is a text file whose first line is a free-form header. Every
//! whitespace-separated token after it is a hexadecimal cell value, placed
//! sequentially from address 0.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{Memory, MEMORY_CELLS};

/// Errors raised while reading or parsing an image.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to open {}: {source}", path.display())]
    Io {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is empty, so there is no header line to skip.
    #[error("failed to read the header line")]
    MissingHeader,
    /// A token is not a hexadecimal number that fits in 32 bits.
    #[error("invalid hex token {token:?} at cell {index}")]
    InvalidToken {
        /// Cell index the token would have been loaded into.
        index: usize,
        /// Offending token text.
        token: String,
    },
}

/// A parsed image ready to be placed in memory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramImage {
    cells: Vec<i32>,
    truncated: bool,
}

impl ProgramImage {
    /// Builds an image directly from cell values.
    #[must_use]
    pub fn from_cells(mut cells: Vec<i32>) -> Self {
        let truncated = cells.len() > MEMORY_CELLS;
        cells.truncate(MEMORY_CELLS);
        Self { cells, truncated }
    }

    /// Parses image text.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingHeader`] for empty input and
    /// [`LoadError::InvalidToken`] for a malformed value.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        if text.is_empty() {
            return Err(LoadError::MissingHeader);
        }
        let body = text.split_once('\n').map_or("", |(_, rest)| rest);

        let mut cells = Vec::new();
        let mut truncated = false;
        for token in body.split_ascii_whitespace() {
            if cells.len() == MEMORY_CELLS {
                truncated = true;
                break;
            }
            let value = parse_hex_token(token).ok_or_else(|| LoadError::InvalidToken {
                index: cells.len(),
                token: token.to_string(),
            })?;
            cells.push(value);
        }

        Ok(Self { cells, truncated })
    }

    /// Reads and parses the image at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] when the file cannot be read, otherwise the
    /// errors of [`ProgramImage::parse`].
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let image = Self::parse(&String::from_utf8_lossy(&bytes))?;
        log::info!("loaded {} cells from {}", image.len(), path.display());
        if image.truncated {
            log::warn!("image exceeds {MEMORY_CELLS} cells; remaining values ignored");
        }
        Ok(image)
    }

    /// Loaded cell values in address order.
    #[must_use]
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    /// Number of loaded cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when no cells were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when values beyond the address space were dropped.
    #[must_use]
    pub const fn truncated(&self) -> bool {
        self.truncated
    }

    /// Places the image at address 0 and installs the identity table.
    #[must_use]
    pub fn to_memory(&self) -> Memory {
        Memory::from_image(&self.cells)
    }
}

/// Parses one hex token: optional sign, optional `0x` prefix, at most 32
/// bits. Values are stored with 32-bit wrapping, so `FFFFFFFF` becomes `-1`
/// while `FFFFFF` stays positive.
#[allow(clippy::cast_possible_wrap)]
fn parse_hex_token(token: &str) -> Option<i32> {
    let (negative, unsigned) = match token.as_bytes().first()? {
        b'-' => (true, &token[1..]),
        b'+' => (false, &token[1..]),
        _ => (false, token),
    };
    let digits = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
        .unwrap_or(unsigned);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()? as i32;
    Some(if negative { value.wrapping_neg() } else { value })
}

#[cfg(test)]
mod tests {
    use super::{parse_hex_token, LoadError, ProgramImage};

    #[test]
    fn header_line_is_skipped() {
        let image = ProgramImage::parse("ABCDEF not hex at all\n1 2 3\n").unwrap();
        assert_eq!(image.cells(), &[1, 2, 3]);
        assert!(!image.truncated());
    }

    #[test]
    fn tokens_may_span_lines_and_mixed_whitespace() {
        let image = ProgramImage::parse("hdr\r\n0 0\tFFFFFF\n\n  a\r\n").unwrap();
        assert_eq!(image.cells(), &[0, 0, 0xFF_FFFF, 10]);
    }

    #[test]
    fn header_only_file_loads_nothing() {
        let image = ProgramImage::parse("just a header").unwrap();
        assert!(image.is_empty());
    }

    #[test]
    fn empty_file_has_no_header() {
        assert!(matches!(
            ProgramImage::parse(""),
            Err(LoadError::MissingHeader)
        ));
    }

    #[test]
    fn malformed_token_reports_its_cell_index() {
        let err = ProgramImage::parse("hdr\n1 2 zz 4\n").unwrap_err();
        match err {
            LoadError::InvalidToken { index, token } => {
                assert_eq!(index, 2);
                assert_eq!(token, "zz");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn hex_tokens_follow_scanf_conventions() {
        assert_eq!(parse_hex_token("ff"), Some(255));
        assert_eq!(parse_hex_token("0x10"), Some(16));
        assert_eq!(parse_hex_token("-1"), Some(-1));
        assert_eq!(parse_hex_token("+A"), Some(10));
        assert_eq!(parse_hex_token("FFFFFFFF"), Some(-1));
        assert_eq!(parse_hex_token("100000000"), None);
        assert_eq!(parse_hex_token("0x"), None);
        assert_eq!(parse_hex_token("--1"), None);
    }

    #[test]
    fn image_becomes_memory_with_identity_table() {
        let image = ProgramImage::from_cells(vec![5, 6]);
        let memory = image.to_memory();
        assert_eq!(memory.read(1), Ok(6));
        assert_eq!(memory.read(crate::DEVICE_BASE + 7), Ok(7));
    }
}
