use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Grid dimensions in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub rows: u16,
    pub cols: u16,
}

impl Size {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { rows, cols }
    }

    /// Total number of cells covered by these dimensions
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

/// Cursor position (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub row: u16,
    pub col: u16,
}

impl Position {
    pub fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

/// A cell color: one of the eight base colors, or the terminal default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Color {
    #[default]
    Default,
    Indexed(u8),
}

bitflags! {
    /// Boolean character attributes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct AttributeFlags: u8 {
        const BOLD      = 1 << 0;
        const UNDERLINE = 1 << 1;
        const BLINK     = 1 << 2;
        const REVERSE   = 1 << 3;
    }
}

bitflags! {
    /// Terminal mode flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TerminalMode: u8 {
        const AUTO_WRAP      = 1 << 0;
        const ORIGIN_MODE    = 1 << 1;
        const CURSOR_VISIBLE = 1 << 2;
        const COLUMN_132     = 1 << 3;
    }
}

impl Default for TerminalMode {
    fn default() -> Self {
        TerminalMode::AUTO_WRAP | TerminalMode::CURSOR_VISIBLE
    }
}

/// Attribute set applied to newly written cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellAttributes {
    pub fg: Color,
    pub bg: Color,
    pub flags: AttributeFlags,
}

/// A single grid position: a character plus its attributes.
///
/// The canonical blank is `(' ', CellAttributes::default())`, which is also
/// the `Default` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub attrs: CellAttributes,
}

impl Cell {
    pub fn new(ch: char) -> Self {
        Self {
            ch,
            attrs: CellAttributes::default(),
        }
    }

    pub fn with_attrs(ch: char, attrs: CellAttributes) -> Self {
        Self { ch, attrs }
    }

    pub fn blank() -> Self {
        Self::new(' ')
    }

    /// Blank cell carrying the given attributes (used by erase operations)
    pub fn blank_with(attrs: CellAttributes) -> Self {
        Self::with_attrs(' ', attrs)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank()
    }
}

/// Serializable summary of the emulator state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalSnapshot {
    pub size: Size,
    pub cursor: Position,
    pub mode: TerminalMode,
    pub attributes: CellAttributes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cell_is_default() {
        assert_eq!(Cell::default(), Cell::blank());
        assert_eq!(Cell::default().ch, ' ');
        assert_eq!(Cell::default().attrs, CellAttributes::default());
    }

    #[test]
    fn default_mode_flags() {
        let mode = TerminalMode::default();
        assert!(mode.contains(TerminalMode::AUTO_WRAP));
        assert!(mode.contains(TerminalMode::CURSOR_VISIBLE));
        assert!(!mode.contains(TerminalMode::ORIGIN_MODE));
        assert!(!mode.contains(TerminalMode::COLUMN_132));
    }

    #[test]
    fn cell_count() {
        assert_eq!(Size::new(80, 24).cell_count(), 1920);
        assert_eq!(Size::new(1, 1).cell_count(), 1);
    }
}
