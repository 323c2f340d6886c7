use tracing::trace;
use vtgrid_common::error::Result;
use vtgrid_common::traits::{
    ControlEvent, CsiSequence, EscSequence, Mode, ParsedEvent, SgrParameter, TabClear,
};
use vtgrid_common::types::{AttributeFlags, Color};

use crate::terminal::TerminalState;

/// Applies parsed events to the terminal state
pub struct AnsiProcessor;

impl AnsiProcessor {
    /// Process a parsed event and apply it to the terminal state.
    ///
    /// The only possible error is `GridOverflow` from an auto-growing
    /// state; fixed-size states never fail.
    pub fn process_event(state: &mut TerminalState, event: ParsedEvent) -> Result<()> {
        match event {
            ParsedEvent::Text(text) => {
                trace!("printing {} characters", text.len());
                for ch in text.chars() {
                    state.put_char(ch)?;
                }
                Ok(())
            }
            ParsedEvent::Control(control) => Self::process_control(state, control),
            ParsedEvent::Csi(csi) => Self::process_csi(state, csi),
            ParsedEvent::Esc(esc) => Self::process_esc(state, esc),
        }
    }

    fn process_control(state: &mut TerminalState, control: ControlEvent) -> Result<()> {
        trace!("processing control: {:?}", control);
        match control {
            ControlEvent::Bell => {}
            ControlEvent::Backspace => state.backspace(),
            ControlEvent::Tab => state.tab()?,
            ControlEvent::LineFeed => state.line_feed()?,
            ControlEvent::CarriageReturn => state.carriage_return(),
        }
        Ok(())
    }

    fn process_csi(state: &mut TerminalState, csi: CsiSequence) -> Result<()> {
        trace!("processing CSI: {:?}", csi);
        match csi {
            CsiSequence::CursorUp(n) => state.move_up(n),
            CsiSequence::CursorDown(n) => state.move_down(n)?,
            CsiSequence::CursorForward(n) => state.move_forward(n)?,
            CsiSequence::CursorBack(n) => state.move_back(n),
            CsiSequence::CursorPosition { row, col } => {
                // 1-based on the wire
                state.move_to(row.saturating_sub(1), col.saturating_sub(1))?;
            }
            CsiSequence::EraseDisplay(mode) => state.erase_display(mode),
            CsiSequence::EraseLine(mode) => state.erase_line(mode),
            CsiSequence::SetGraphicsRendition(params) => {
                for param in params {
                    Self::apply_sgr(state, param);
                }
            }
            CsiSequence::SetMode(modes) => {
                for mode in modes {
                    Self::set_mode(state, mode, true)?;
                }
            }
            CsiSequence::ResetMode(modes) => {
                for mode in modes {
                    Self::set_mode(state, mode, false)?;
                }
            }
            CsiSequence::SetScrollingRegion { top, bottom } => {
                state.set_scrolling_region(top, bottom);
            }
            CsiSequence::ClearTabStops(TabClear::Current) => state.clear_tab_stop(),
            CsiSequence::ClearTabStops(TabClear::All) => state.clear_all_tab_stops(),
        }
        Ok(())
    }

    fn process_esc(state: &mut TerminalState, esc: EscSequence) -> Result<()> {
        trace!("processing ESC: {:?}", esc);
        match esc {
            EscSequence::SaveCursor => state.save_cursor(),
            EscSequence::RestoreCursor => state.restore_cursor()?,
            EscSequence::Index => state.line_feed()?,
            EscSequence::NextLine => state.next_line()?,
            EscSequence::ReverseIndex => state.reverse_index(),
            EscSequence::TabSet => state.set_tab_stop(),
            EscSequence::Reset => state.reset(),
            EscSequence::ScreenAlignment => state.screen_alignment_fill(),
        }
        Ok(())
    }

    fn set_mode(state: &mut TerminalState, mode: Mode, enabled: bool) -> Result<()> {
        match mode {
            Mode::Column132 => state.set_column_mode(enabled),
            Mode::Origin => state.set_origin_mode(enabled)?,
            Mode::AutoWrap => state.set_auto_wrap(enabled),
            Mode::CursorVisible => state.set_cursor_visible(enabled),
        }
        Ok(())
    }

    fn apply_sgr(state: &mut TerminalState, param: SgrParameter) {
        match param {
            SgrParameter::Reset => state.reset_attributes(),

            SgrParameter::Bold => state.set_attribute_flag(AttributeFlags::BOLD, true),
            SgrParameter::Underline => state.set_attribute_flag(AttributeFlags::UNDERLINE, true),
            SgrParameter::Blink => state.set_attribute_flag(AttributeFlags::BLINK, true),
            SgrParameter::Reverse => state.set_attribute_flag(AttributeFlags::REVERSE, true),

            SgrParameter::NoBold => state.set_attribute_flag(AttributeFlags::BOLD, false),
            SgrParameter::NoUnderline => state.set_attribute_flag(AttributeFlags::UNDERLINE, false),
            SgrParameter::NoBlink => state.set_attribute_flag(AttributeFlags::BLINK, false),
            SgrParameter::NoReverse => state.set_attribute_flag(AttributeFlags::REVERSE, false),

            SgrParameter::Foreground(color) => state.set_foreground(color),
            SgrParameter::Background(color) => state.set_background(color),

            SgrParameter::DefaultForeground => state.set_foreground(Color::Default),
            SgrParameter::DefaultBackground => state.set_background(Color::Default),
        }
    }
}
