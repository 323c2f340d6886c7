use tracing::debug;
use vtgrid_common::error::{Result, VtGridError};
use vtgrid_common::traits::EraseMode;
use vtgrid_common::types::{
    AttributeFlags, Cell, CellAttributes, Color, Position, Size, TerminalMode, TerminalSnapshot,
};

use super::buffer::ScreenBuffer;
use super::cursor::Cursor;

/// Ceiling on the number of cells an auto-growing grid may allocate
const MAX_GRID_CELLS: usize = 10_000_000;

/// Row count a column-mode switch restores on a physical display
const DECCOLM_ROWS: u16 = 24;

/// Display state: the cell matrix, cursor, scrolling region, tab stops and
/// mode flags, with the motion and erase primitives that operate on them.
///
/// A state is either fixed-size or auto-growing. In the fixed flavor every
/// operation is total: out-of-range targets clamp. In the auto-growing
/// flavor, operations that address a new row or column enlarge the grid and
/// can fail with `GridOverflow` once the cell limit is reached; scrolling
/// never happens there.
pub struct TerminalState {
    size: Size,
    cursor: Cursor,
    saved_cursor: Option<SavedCursor>,
    buffer: ScreenBuffer,
    mode: TerminalMode,
    attrs: CellAttributes,
    tab_stops: Vec<u16>,
    tabs_customized: bool,
    scroll_top: u16,
    scroll_bottom: u16,
    auto_grow: bool,
}

/// Snapshot taken by DECSC and restored by DECRC
#[derive(Debug, Clone, Copy)]
struct SavedCursor {
    position: Position,
    attrs: CellAttributes,
    origin_mode: bool,
}

impl TerminalState {
    /// Create a fixed-size state with the given dimensions
    pub fn new(size: Size) -> Self {
        let size = Size::new(size.cols.max(1), size.rows.max(1));
        Self {
            size,
            cursor: Cursor::new(),
            saved_cursor: None,
            buffer: ScreenBuffer::new(size),
            mode: TerminalMode::default(),
            attrs: CellAttributes::default(),
            tab_stops: Self::default_tab_stops(size.cols),
            tabs_customized: false,
            scroll_top: 0,
            scroll_bottom: size.rows - 1,
            auto_grow: false,
        }
    }

    /// Create an auto-growing state starting from a 1x1 grid
    pub fn auto_grow() -> Self {
        let mut state = Self::new(Size::new(1, 1));
        state.auto_grow = true;
        state
    }

    /// Create default tab stops (every 8 columns)
    fn default_tab_stops(cols: u16) -> Vec<u16> {
        (0..cols).step_by(8).collect()
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn cursor_position(&self) -> Position {
        self.cursor.position()
    }

    pub fn attributes(&self) -> &CellAttributes {
        &self.attrs
    }

    pub fn mode(&self) -> TerminalMode {
        self.mode
    }

    pub fn buffer(&self) -> &ScreenBuffer {
        &self.buffer
    }

    pub fn scroll_region(&self) -> (u16, u16) {
        (self.scroll_top, self.scroll_bottom)
    }

    /// Enlarge the grid so that it holds at least the given dimensions.
    /// Only meaningful in auto-grow mode; a fixed grid is never resized.
    fn grow_to(&mut self, min_rows: usize, min_cols: usize) -> Result<()> {
        let rows = (self.size.rows as usize).max(min_rows);
        let cols = (self.size.cols as usize).max(min_cols);
        if rows == self.size.rows as usize && cols == self.size.cols as usize {
            return Ok(());
        }
        if rows > u16::MAX as usize || cols > u16::MAX as usize || rows * cols > MAX_GRID_CELLS {
            return Err(VtGridError::GridOverflow { rows, cols });
        }

        let old_cols = self.size.cols;
        self.size = Size::new(cols as u16, rows as u16);
        self.buffer.grow(self.size.rows, self.size.cols);
        // The region tracks the full grid while it grows
        self.scroll_bottom = self.size.rows - 1;
        if !self.tabs_customized && self.size.cols > old_cols {
            self.tab_stops = Self::default_tab_stops(self.size.cols);
        }
        Ok(())
    }

    /// Write a character at the cursor and advance it.
    ///
    /// In fixed mode a cursor already past the right edge first wraps
    /// (autowrap on) or is pulled back onto the last column (autowrap off);
    /// the wrap is deferred until this write, so motion commands arriving
    /// in between cancel it.
    pub fn put_char(&mut self, ch: char) -> Result<()> {
        if self.auto_grow {
            let row = self.cursor.row();
            let col = self.cursor.col();
            self.grow_to(row as usize + 1, col as usize + 1)?;
            self.buffer
                .set_cell(Position::new(row, col), Cell::with_attrs(ch, self.attrs));
            self.cursor.set_col(col + 1);
            return Ok(());
        }

        if self.cursor.col() == self.size.cols {
            if self.mode.contains(TerminalMode::AUTO_WRAP) {
                self.cursor.set_col(0);
                self.line_feed()?;
            } else {
                self.cursor.set_col(self.size.cols - 1);
            }
        }

        let pos = self.cursor.position();
        self.buffer.set_cell(pos, Cell::with_attrs(ch, self.attrs));
        self.cursor.set_col(pos.col + 1);
        Ok(())
    }

    /// Move the cursor to column 0
    pub fn carriage_return(&mut self) {
        self.cursor.set_col(0);
    }

    /// Move the cursor down one row, scrolling at the bottom of the region.
    /// Below the region the cursor clamps at the last row without scrolling.
    pub fn line_feed(&mut self) -> Result<()> {
        if self.auto_grow {
            let target = self.cursor.row() as usize + 1;
            self.grow_to(target + 1, 0)?;
            self.cursor.set_row(target as u16);
            return Ok(());
        }

        let row = self.cursor.row();
        if row == self.scroll_bottom {
            self.scroll_up(1);
        } else if row + 1 < self.size.rows {
            self.cursor.set_row(row + 1);
        }
        Ok(())
    }

    /// CR followed by Index
    pub fn next_line(&mut self) -> Result<()> {
        self.carriage_return();
        self.line_feed()
    }

    /// Move the cursor up one row, scrolling at the top of the region
    pub fn reverse_index(&mut self) {
        let row = self.cursor.row();
        if !self.auto_grow && row == self.scroll_top {
            self.scroll_down(1);
        } else {
            self.cursor.set_row(row.saturating_sub(1));
        }
    }

    /// Move the cursor one column left, stopping at column 0
    pub fn backspace(&mut self) {
        self.cursor.set_col(self.cursor.col().saturating_sub(1));
    }

    /// Advance the cursor to the next tab stop
    pub fn tab(&mut self) -> Result<()> {
        let col = self.cursor.col();
        if let Some(&stop) = self.tab_stops.iter().find(|&&stop| stop > col) {
            self.cursor.set_col(stop);
        } else if self.auto_grow && !self.tabs_customized {
            // Continue the 8-column pattern past the current edge
            let stop = (col as u32 / 8 + 1) * 8;
            self.grow_to(self.cursor.row() as usize + 1, stop as usize + 1)?;
            self.cursor.set_col(stop as u16);
        } else {
            self.cursor.set_col(self.size.cols - 1);
        }
        Ok(())
    }

    /// Set a tab stop at the cursor column
    pub fn set_tab_stop(&mut self) {
        let col = self.cursor.col().min(self.size.cols - 1);
        if !self.tab_stops.contains(&col) {
            self.tab_stops.push(col);
            self.tab_stops.sort_unstable();
        }
        self.tabs_customized = true;
    }

    /// Clear the tab stop at the cursor column
    pub fn clear_tab_stop(&mut self) {
        let col = self.cursor.col().min(self.size.cols - 1);
        self.tab_stops.retain(|&stop| stop != col);
        self.tabs_customized = true;
    }

    /// Clear all tab stops
    pub fn clear_all_tab_stops(&mut self) {
        self.tab_stops.clear();
        self.tabs_customized = true;
    }

    /// Move the cursor up, clamping at the region top
    pub fn move_up(&mut self, n: u16) {
        let row = self.cursor.row();
        let top = if row >= self.scroll_top { self.scroll_top } else { 0 };
        self.cursor.set_row(row.saturating_sub(n).max(top));
    }

    /// Move the cursor down, clamping at the region bottom
    pub fn move_down(&mut self, n: u16) -> Result<()> {
        if self.auto_grow {
            let target = self.cursor.row() as usize + n as usize;
            self.grow_to(target + 1, 0)?;
            self.cursor.set_row(target as u16);
            return Ok(());
        }

        let row = self.cursor.row();
        let bottom = if row <= self.scroll_bottom {
            self.scroll_bottom
        } else {
            self.size.rows - 1
        };
        self.cursor.set_row(row.saturating_add(n).min(bottom));
        Ok(())
    }

    /// Move the cursor right, clamping at the last column
    pub fn move_forward(&mut self, n: u16) -> Result<()> {
        if self.auto_grow {
            let target = self.cursor.col() as usize + n as usize;
            self.grow_to(self.cursor.row() as usize + 1, target + 1)?;
            self.cursor.set_col(target as u16);
            return Ok(());
        }

        let col = self.cursor.col().min(self.size.cols - 1);
        self.cursor.set_col(col.saturating_add(n).min(self.size.cols - 1));
        Ok(())
    }

    /// Move the cursor left, clamping at column 0
    pub fn move_back(&mut self, n: u16) {
        let col = self.cursor.col().min(self.size.cols.saturating_sub(1));
        self.cursor.set_col(col.saturating_sub(n));
    }

    /// Place the cursor at the given 0-based coordinates. In origin mode
    /// the row is relative to the region top and confined to the region.
    pub fn move_to(&mut self, row: u16, col: u16) -> Result<()> {
        if self.auto_grow {
            self.grow_to(row as usize + 1, col as usize + 1)?;
            self.cursor.set_position(Position::new(row, col));
            return Ok(());
        }

        let row = if self.mode.contains(TerminalMode::ORIGIN_MODE) {
            ((self.scroll_top as u32 + row as u32).min(self.scroll_bottom as u32)) as u16
        } else {
            row.min(self.size.rows - 1)
        };
        let col = col.min(self.size.cols - 1);
        self.cursor.set_position(Position::new(row, col));
        Ok(())
    }

    /// Erase part of the display, blanking with the current attributes
    pub fn erase_display(&mut self, mode: EraseMode) {
        let rows = self.size.rows;
        let cols = self.size.cols;
        let row = self.cursor.row().min(rows - 1);
        let col = self.cursor.col().min(cols - 1);
        match mode {
            EraseMode::Below => {
                self.buffer.clear_region(row, col, row, cols - 1, self.attrs);
                if row + 1 < rows {
                    self.buffer.clear_region(row + 1, 0, rows - 1, cols - 1, self.attrs);
                }
            }
            EraseMode::Above => {
                if row > 0 {
                    self.buffer.clear_region(0, 0, row - 1, cols - 1, self.attrs);
                }
                self.buffer.clear_region(row, 0, row, col, self.attrs);
            }
            EraseMode::All => {
                self.buffer.clear_region(0, 0, rows - 1, cols - 1, self.attrs);
            }
        }
    }

    /// Erase part of the cursor line, blanking with the current attributes
    pub fn erase_line(&mut self, mode: EraseMode) {
        let cols = self.size.cols;
        let row = self.cursor.row().min(self.size.rows - 1);
        let col = self.cursor.col().min(cols - 1);
        match mode {
            EraseMode::Below => self.buffer.clear_region(row, col, row, cols - 1, self.attrs),
            EraseMode::Above => self.buffer.clear_region(row, 0, row, col, self.attrs),
            EraseMode::All => self.buffer.clear_region(row, 0, row, cols - 1, self.attrs),
        }
    }

    /// Scroll the region contents up by `n` rows
    pub fn scroll_up(&mut self, n: u16) {
        self.buffer.scroll_up(self.scroll_top, self.scroll_bottom, n);
    }

    /// Scroll the region contents down by `n` rows
    pub fn scroll_down(&mut self, n: u16) {
        self.buffer.scroll_down(self.scroll_top, self.scroll_bottom, n);
    }

    /// Set the scrolling region from 1-based margins; the bottom defaults
    /// to the last row. Invalid margins are ignored. The cursor moves home.
    pub fn set_scrolling_region(&mut self, top: u16, bottom: Option<u16>) {
        if self.auto_grow {
            // Scrolling never executes on a growing grid; only the cursor
            // move takes effect
            self.cursor.home();
            return;
        }

        let rows = self.size.rows;
        let top = top.max(1);
        let bottom = bottom.unwrap_or(rows).min(rows);
        if top >= bottom {
            debug!("ignoring scrolling region {};{}", top, bottom);
            return;
        }
        self.scroll_top = top - 1;
        self.scroll_bottom = bottom - 1;

        let home_row = if self.mode.contains(TerminalMode::ORIGIN_MODE) {
            self.scroll_top
        } else {
            0
        };
        self.cursor.set_position(Position::new(home_row, 0));
    }

    /// Set or clear a single attribute flag
    pub fn set_attribute_flag(&mut self, flag: AttributeFlags, enabled: bool) {
        self.attrs.flags.set(flag, enabled);
    }

    pub fn set_foreground(&mut self, color: Color) {
        self.attrs.fg = color;
    }

    pub fn set_background(&mut self, color: Color) {
        self.attrs.bg = color;
    }

    /// Reset all attributes to default
    pub fn reset_attributes(&mut self) {
        self.attrs = CellAttributes::default();
    }

    /// Set or clear autowrap
    pub fn set_auto_wrap(&mut self, enabled: bool) {
        self.mode.set(TerminalMode::AUTO_WRAP, enabled);
    }

    /// Set or clear origin mode; the cursor moves home either way
    pub fn set_origin_mode(&mut self, enabled: bool) -> Result<()> {
        self.mode.set(TerminalMode::ORIGIN_MODE, enabled);
        self.move_to(0, 0)
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.mode.set(TerminalMode::CURSOR_VISIBLE, visible);
    }

    /// Switch between 80 and 132 columns (DECCOLM). The screen clears, the
    /// cursor moves home, and the region and tab stops reset.
    pub fn set_column_mode(&mut self, enabled: bool) {
        self.mode.set(TerminalMode::COLUMN_132, enabled);
        let cols = if enabled { 132 } else { 80 };
        let rows = if self.auto_grow {
            // Restores the physical display, which is at least 24 rows tall
            self.size.rows.max(DECCOLM_ROWS)
        } else {
            self.size.rows
        };

        self.size = Size::new(cols, rows);
        self.buffer.reset(self.size);
        self.scroll_top = 0;
        self.scroll_bottom = rows - 1;
        self.tab_stops = Self::default_tab_stops(cols);
        self.tabs_customized = false;
        self.cursor.home();
    }

    /// Fill the whole grid with `E` (DECALN) and move the cursor home
    pub fn screen_alignment_fill(&mut self) {
        self.buffer.fill('E', self.attrs);
        self.cursor.home();
    }

    /// Snapshot the cursor position, attributes and origin mode (DECSC)
    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some(SavedCursor {
            position: self.cursor.position(),
            attrs: self.attrs,
            origin_mode: self.mode.contains(TerminalMode::ORIGIN_MODE),
        });
    }

    /// Restore the last saved cursor snapshot (DECRC); without one this is
    /// a no-op
    pub fn restore_cursor(&mut self) -> Result<()> {
        let Some(saved) = self.saved_cursor else {
            return Ok(());
        };
        self.attrs = saved.attrs;
        self.mode.set(TerminalMode::ORIGIN_MODE, saved.origin_mode);
        if self.auto_grow {
            self.grow_to(saved.position.row as usize + 1, saved.position.col as usize + 1)?;
            self.cursor.set_position(saved.position);
        } else {
            self.cursor.set_position(Position::new(
                saved.position.row.min(self.size.rows - 1),
                saved.position.col.min(self.size.cols),
            ));
        }
        Ok(())
    }

    /// Reset to the initial state (RIS). A fixed grid keeps its dimensions;
    /// an auto-growing grid restarts at 1x1.
    pub fn reset(&mut self) {
        *self = if self.auto_grow {
            Self::auto_grow()
        } else {
            Self::new(self.size)
        };
    }

    /// Get a serializable summary of the state
    pub fn snapshot(&self) -> TerminalSnapshot {
        TerminalSnapshot {
            size: self.size,
            cursor: self.cursor.position(),
            mode: self.mode,
            attributes: self.attrs,
        }
    }

    /// Render the grid as text rows with trailing blanks removed per row
    /// and trailing blank rows removed from the bottom
    pub fn trimmed_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .buffer
            .lines()
            .iter()
            .map(|row| {
                let text: String = row.iter().map(|cell| cell.ch).collect();
                text.trim_end_matches(' ').to_string()
            })
            .collect();
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
        lines
    }
}
