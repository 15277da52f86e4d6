//! Hex-and-ASCII memory dump used by the keyboard dump request.

use std::io::{self, Write};

use crate::{DumpWindow, Memory, WORD_MASK};

/// Cells printed per dump row.
pub const DUMP_ROW_CELLS: usize = 16;

const ROW_STRIDE: i64 = 16;

/// Writes `window` as rows of `AAAAAA: VVVVVV ... ` followed by an ASCII
/// column. Cells outside the address space print as zero. Lines end in
/// `\r\n` so the dump renders correctly with the terminal in raw mode.
///
/// # Errors
///
/// Propagates write failures from `out`.
pub fn write_dump(memory: &Memory, window: DumpWindow, out: &mut dyn Write) -> io::Result<()> {
    let start = i64::from(window.start);
    let end = start + i64::try_from(window.len).unwrap_or(i64::MAX);
    let cells = memory.cells();
    let cell_at = |addr: i64| {
        usize::try_from(addr)
            .ok()
            .and_then(|slot| cells.get(slot))
            .copied()
            .unwrap_or(0)
    };

    out.write_all(b"\r\n")?;
    let mut row = start;
    while row < end {
        let mut line = format!("{:06X}: ", row & i64::from(WORD_MASK));
        let mut ascii = String::with_capacity(DUMP_ROW_CELLS);
        for addr in (row..).take(DUMP_ROW_CELLS) {
            let value = cell_at(addr);
            line.push_str(&format!("{:06X} ", value & WORD_MASK));
            let low = value.to_le_bytes()[0];
            ascii.push(if (32..127).contains(&low) {
                char::from(low)
            } else {
                '.'
            });
        }
        line.push(' ');
        line.push_str(&ascii);
        line.push_str("\r\n");
        out.write_all(line.as_bytes())?;
        out.flush()?;
        row += ROW_STRIDE;
    }
    out.flush()
}
