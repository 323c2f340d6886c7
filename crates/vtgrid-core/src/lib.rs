//! Deterministic VT100/ANSI byte-stream interpreter.
//!
//! The crate renders a stream of octets onto a virtual character grid and
//! exposes two consumers of the result: [`display_width`] reports the
//! minimum bounding rectangle needed to show the stream, and [`trim`]
//! returns the visible rows with trailing blanks removed. [`parse_hex_dump`]
//! converts `hexdump -C` text into the raw bytes the emulator consumes.

pub mod ansi;
pub mod hexdump;
pub mod terminal;

use vtgrid_common::error::Result;
use vtgrid_common::traits::TerminalParser;
use vtgrid_parser::Vt100Parser;

pub use ansi::AnsiProcessor;
pub use hexdump::parse_hex_dump;
pub use terminal::TerminalState;
pub use vtgrid_common::error::VtGridError;
pub use vtgrid_common::types::{Cell, CellAttributes, Color, Position, Size, TerminalSnapshot};

/// Default fixed display dimensions (80 columns by 24 rows)
pub const DEFAULT_SIZE: Size = Size { rows: 24, cols: 80 };

/// Streaming emulator: a parser feeding a terminal state.
///
/// Use this directly to feed input incrementally; the one-shot entry points
/// below cover the common cases.
pub struct Emulator {
    parser: Vt100Parser,
    state: TerminalState,
}

impl Emulator {
    /// Create an emulator with a fixed-size grid
    pub fn new(size: Size) -> Self {
        Self {
            parser: Vt100Parser::new(),
            state: TerminalState::new(size),
        }
    }

    /// Create an emulator whose grid grows to fit whatever is addressed
    pub fn auto_grow() -> Self {
        Self {
            parser: Vt100Parser::new(),
            state: TerminalState::auto_grow(),
        }
    }

    /// Feed a chunk of input. Incomplete escape sequences are carried over
    /// to the next call.
    pub fn process(&mut self, data: &[u8]) -> Result<()> {
        let events = self.parser.parse(data);
        for event in events {
            AnsiProcessor::process_event(&mut self.state, event)?;
        }
        Ok(())
    }

    /// Get the current terminal state
    pub fn state(&self) -> &TerminalState {
        &self.state
    }

    /// Get a serializable summary of the current state
    pub fn snapshot(&self) -> TerminalSnapshot {
        self.state.snapshot()
    }
}

/// Compute the minimum bounding rectangle, in character cells, needed to
/// render the stream
pub fn display_width(input: &[u8]) -> Result<Size> {
    let mut emulator = Emulator::auto_grow();
    emulator.process(input)?;
    Ok(emulator.state().size())
}

/// Render the stream on the default 80x24 display and return the visible
/// rows, trailing blanks removed
pub fn trim(input: &[u8]) -> Result<Vec<String>> {
    trim_with_size(input, DEFAULT_SIZE)
}

/// Render the stream on a fixed display of the given size and return the
/// visible rows, trailing blanks removed
pub fn trim_with_size(input: &[u8], size: Size) -> Result<Vec<String>> {
    let mut emulator = Emulator::new(size);
    emulator.process(input)?;
    Ok(emulator.state().trimmed_lines())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(display_width(b"Hello, world!").unwrap(), Size::new(13, 1));
        assert_eq!(trim(b"Hello, world!").unwrap(), vec!["Hello, world!"]);
    }

    #[test]
    fn test_sgr_does_not_change_geometry() {
        let input = b"\x1b[30;41mHello, world!\x1b[0m";
        assert_eq!(display_width(input).unwrap(), Size::new(13, 1));
        assert_eq!(trim(input).unwrap(), vec!["Hello, world!"]);
    }

    #[test]
    fn test_column_mode_reset_and_alignment_fill() {
        let input = b"\x1b[?3l\x1b#8";
        assert_eq!(display_width(input).unwrap(), Size::new(80, 24));

        let lines = trim(input).unwrap();
        assert_eq!(lines.len(), 24);
        for line in lines {
            assert_eq!(line, "E".repeat(80));
        }
    }

    #[test]
    fn test_absolute_positioning() {
        let lines = trim(b"A\x1b[5;10HB").unwrap();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "A");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "         B");

        assert_eq!(display_width(b"A\x1b[5;10HB").unwrap(), Size::new(10, 5));
    }

    #[test]
    fn test_cursor_back_overwrite() {
        assert_eq!(trim(b"ABC\x1b[2DX").unwrap(), vec!["AXC"]);
    }

    #[test]
    fn test_multi_line() {
        assert_eq!(trim(b"one\r\ntwo\r\n").unwrap(), vec!["one", "two"]);
        assert_eq!(display_width(b"one\r\ntwo\r\n").unwrap(), Size::new(3, 3));
    }

    #[test]
    fn test_leading_blank_rows_retained() {
        assert_eq!(trim(b"\n\nx").unwrap(), vec!["", "", "x"]);
    }

    #[test]
    fn test_display_width_overflow() {
        let err = display_width(b"\x1b[65000;65000H").unwrap_err();
        assert!(matches!(err, VtGridError::GridOverflow { .. }));
    }

    #[test]
    fn test_streaming_emulator() {
        let mut emulator = Emulator::new(DEFAULT_SIZE);
        emulator.process(b"ab\x1b[").unwrap();
        emulator.process(b"1;1Hc").unwrap();
        assert_eq!(emulator.state().trimmed_lines(), vec!["cb"]);
    }

    #[test]
    fn test_snapshot() {
        let mut emulator = Emulator::new(DEFAULT_SIZE);
        emulator.process(b"\x1b[3;4H").unwrap();
        let snapshot = emulator.snapshot();
        assert_eq!(snapshot.size, DEFAULT_SIZE);
        assert_eq!(snapshot.cursor, Position::new(2, 3));
    }
}
