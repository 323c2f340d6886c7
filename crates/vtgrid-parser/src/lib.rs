use tracing::{debug, trace};
use vtgrid_common::traits::{
    ControlEvent, CsiSequence, EraseMode, EscSequence, Mode, ParsedEvent, SgrParameter, TabClear,
    TerminalParser,
};
use vtgrid_common::types::Color;

/// Maximum number of CSI parameters retained; further parameters are dropped
const MAX_PARAMS: usize = 16;

/// VT100/ANSI byte-stream parser for terminal escape sequences
pub struct Vt100Parser {
    state: State,
    params: ParamBuffer,
    events: Vec<ParsedEvent>,
    current_text: String,
}

/// Parser states, one variant per phase of an escape sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    Hash,
    CharSet,
}

/// Fixed-capacity CSI parameter accumulator.
///
/// A missing parameter (`None`) is distinct from an explicit zero; each
/// command applies its own default. `ignore` marks a sequence that must be
/// consumed up to its final byte and then discarded.
#[derive(Debug, Clone, Copy)]
struct ParamBuffer {
    slots: [Option<u16>; MAX_PARAMS],
    count: usize,
    private: bool,
    ignore: bool,
}

impl ParamBuffer {
    fn new() -> Self {
        Self {
            slots: [None; MAX_PARAMS],
            count: 0,
            private: false,
            ignore: false,
        }
    }

    fn clear(&mut self) {
        *self = Self::new();
    }

    fn push_digit(&mut self, digit: u8) {
        if self.count == 0 {
            self.count = 1;
        }
        let index = self.count - 1;
        if index < MAX_PARAMS {
            let value = self.slots[index].unwrap_or(0);
            self.slots[index] = Some(value.saturating_mul(10).saturating_add(digit as u16));
        }
    }

    fn next_param(&mut self) {
        if self.count == 0 {
            self.count = 1;
        }
        if self.count <= MAX_PARAMS {
            self.count += 1;
        }
    }

    /// Raw parameter value; missing means `default`
    fn raw(&self, index: usize, default: u16) -> u16 {
        self.slots.get(index).copied().flatten().unwrap_or(default)
    }

    /// Parameter value where both missing and zero mean `default` (motion
    /// and position commands)
    fn nonzero(&self, index: usize, default: u16) -> u16 {
        self.slots
            .get(index)
            .copied()
            .flatten()
            .filter(|&v| v > 0)
            .unwrap_or(default)
    }
}

impl Vt100Parser {
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            params: ParamBuffer::new(),
            events: Vec::new(),
            current_text: String::new(),
        }
    }

    /// Flush any accumulated text as a Text event
    fn flush_text(&mut self) {
        if !self.current_text.is_empty() {
            let text = std::mem::take(&mut self.current_text);
            self.events.push(ParsedEvent::Text(text));
        }
    }

    fn emit_control(&mut self, event: ControlEvent) {
        self.flush_text();
        self.events.push(ParsedEvent::Control(event));
    }

    fn emit_csi(&mut self, seq: CsiSequence) {
        self.flush_text();
        self.events.push(ParsedEvent::Csi(seq));
    }

    fn emit_esc(&mut self, seq: EscSequence) {
        self.flush_text();
        self.events.push(ParsedEvent::Esc(seq));
    }

    fn advance(&mut self, byte: u8) {
        match self.state {
            State::Ground => self.ground(byte),
            State::Escape => self.escape(byte),
            State::CsiEntry => self.csi_entry(byte),
            State::CsiParam => self.csi_param(byte),
            State::CsiIntermediate => self.csi_intermediate(byte),
            State::Hash => self.hash(byte),
            State::CharSet => self.charset(byte),
        }
    }

    /// Dispatch a C0 control byte. Shared between Ground and the escape
    /// states: controls embedded in a sequence execute without aborting it.
    fn execute(&mut self, byte: u8) {
        match byte {
            0x07 => self.emit_control(ControlEvent::Bell),
            0x08 => self.emit_control(ControlEvent::Backspace),
            0x09 => self.emit_control(ControlEvent::Tab),
            0x0a | 0x0b | 0x0c => self.emit_control(ControlEvent::LineFeed),
            0x0d => self.emit_control(ControlEvent::CarriageReturn),
            0x0e | 0x0f => trace!("charset shift consumed: 0x{:02x}", byte),
            _ => trace!("ignored control byte: 0x{:02x}", byte),
        }
    }

    fn ground(&mut self, byte: u8) {
        match byte {
            0x1b => {
                self.flush_text();
                self.state = State::Escape;
            }
            0x00..=0x1f => self.execute(byte),
            0x7f => {}
            _ => self.current_text.push(byte as char),
        }
    }

    fn escape(&mut self, byte: u8) {
        match byte {
            b'[' => {
                self.params.clear();
                self.state = State::CsiEntry;
            }
            b'#' => self.state = State::Hash,
            b'(' | b')' => self.state = State::CharSet,
            b'7' => {
                self.emit_esc(EscSequence::SaveCursor);
                self.state = State::Ground;
            }
            b'8' => {
                self.emit_esc(EscSequence::RestoreCursor);
                self.state = State::Ground;
            }
            b'D' => {
                self.emit_esc(EscSequence::Index);
                self.state = State::Ground;
            }
            b'E' => {
                self.emit_esc(EscSequence::NextLine);
                self.state = State::Ground;
            }
            b'M' => {
                self.emit_esc(EscSequence::ReverseIndex);
                self.state = State::Ground;
            }
            b'H' => {
                self.emit_esc(EscSequence::TabSet);
                self.state = State::Ground;
            }
            b'c' => {
                self.emit_esc(EscSequence::Reset);
                self.state = State::Ground;
            }
            0x1b => {} // restart the escape
            0x18 | 0x1a => self.state = State::Ground,
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.execute(byte),
            0x7f => {}
            _ => {
                debug!("unhandled escape byte: 0x{:02x}", byte);
                self.state = State::Ground;
            }
        }
    }

    fn csi_entry(&mut self, byte: u8) {
        match byte {
            b'?' => {
                self.params.private = true;
                self.state = State::CsiParam;
            }
            b'<' | b'=' | b'>' | b':' => {
                self.params.ignore = true;
                self.state = State::CsiParam;
            }
            b'0'..=b'9' => {
                self.params.push_digit(byte - b'0');
                self.state = State::CsiParam;
            }
            b';' => {
                self.params.next_param();
                self.state = State::CsiParam;
            }
            0x20..=0x2f => self.state = State::CsiIntermediate,
            0x40..=0x7e => self.csi_dispatch(byte),
            0x1b => self.state = State::Escape,
            0x18 | 0x1a => self.state = State::Ground,
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.execute(byte),
            0x7f => {}
            _ => self.params.ignore = true,
        }
    }

    fn csi_param(&mut self, byte: u8) {
        match byte {
            b'0'..=b'9' => self.params.push_digit(byte - b'0'),
            b';' => self.params.next_param(),
            // Only valid immediately after CSI
            b'?' | b'<' | b'=' | b'>' | b':' => self.params.ignore = true,
            0x20..=0x2f => self.state = State::CsiIntermediate,
            0x40..=0x7e => self.csi_dispatch(byte),
            0x1b => self.state = State::Escape,
            0x18 | 0x1a => self.state = State::Ground,
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.execute(byte),
            0x7f => {}
            _ => self.params.ignore = true,
        }
    }

    fn csi_intermediate(&mut self, byte: u8) {
        match byte {
            0x20..=0x2f => {}
            // No sequence with intermediates is recognized
            0x40..=0x7e => {
                debug!("discarding CSI with intermediates, final: {:?}", byte as char);
                self.state = State::Ground;
            }
            0x1b => self.state = State::Escape,
            0x18 | 0x1a => self.state = State::Ground,
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.execute(byte),
            0x7f => {}
            _ => self.params.ignore = true,
        }
    }

    fn hash(&mut self, byte: u8) {
        match byte {
            b'8' => self.emit_esc(EscSequence::ScreenAlignment),
            // Double-size line modifiers: consumed, no layout effect
            b'3'..=b'6' => trace!("line size modifier consumed: {:?}", byte as char),
            _ => debug!("unhandled hash byte: 0x{:02x}", byte),
        }
        self.state = State::Ground;
    }

    fn charset(&mut self, byte: u8) {
        trace!("charset designation consumed: 0x{:02x}", byte);
        self.state = State::Ground;
    }

    fn csi_dispatch(&mut self, action: u8) {
        if self.params.ignore {
            self.state = State::Ground;
            return;
        }
        match action {
            b'A' => {
                let n = self.params.nonzero(0, 1);
                self.emit_csi(CsiSequence::CursorUp(n));
            }
            b'B' => {
                let n = self.params.nonzero(0, 1);
                self.emit_csi(CsiSequence::CursorDown(n));
            }
            b'C' => {
                let n = self.params.nonzero(0, 1);
                self.emit_csi(CsiSequence::CursorForward(n));
            }
            b'D' => {
                let n = self.params.nonzero(0, 1);
                self.emit_csi(CsiSequence::CursorBack(n));
            }
            b'H' | b'f' => {
                let row = self.params.nonzero(0, 1);
                let col = self.params.nonzero(1, 1);
                self.emit_csi(CsiSequence::CursorPosition { row, col });
            }
            b'J' => match self.params.raw(0, 0) {
                0 => self.emit_csi(CsiSequence::EraseDisplay(EraseMode::Below)),
                1 => self.emit_csi(CsiSequence::EraseDisplay(EraseMode::Above)),
                2 => self.emit_csi(CsiSequence::EraseDisplay(EraseMode::All)),
                n => debug!("unhandled erase display mode: {}", n),
            },
            b'K' => match self.params.raw(0, 0) {
                0 => self.emit_csi(CsiSequence::EraseLine(EraseMode::Below)),
                1 => self.emit_csi(CsiSequence::EraseLine(EraseMode::Above)),
                2 => self.emit_csi(CsiSequence::EraseLine(EraseMode::All)),
                n => debug!("unhandled erase line mode: {}", n),
            },
            b'm' => {
                let params = self.parse_sgr();
                self.emit_csi(CsiSequence::SetGraphicsRendition(params));
            }
            b'h' => {
                if let Some(modes) = self.mode_params() {
                    self.emit_csi(CsiSequence::SetMode(modes));
                }
            }
            b'l' => {
                if let Some(modes) = self.mode_params() {
                    self.emit_csi(CsiSequence::ResetMode(modes));
                }
            }
            b'r' => {
                let top = self.params.nonzero(0, 1);
                let bottom = self.params.slots.get(1).copied().flatten().filter(|&v| v > 0);
                self.emit_csi(CsiSequence::SetScrollingRegion { top, bottom });
            }
            b'g' => match self.params.raw(0, 0) {
                0 => self.emit_csi(CsiSequence::ClearTabStops(TabClear::Current)),
                3 => self.emit_csi(CsiSequence::ClearTabStops(TabClear::All)),
                n => debug!("unhandled tab clear mode: {}", n),
            },
            _ => debug!("unhandled CSI final byte: {:?}", action as char),
        }
        self.state = State::Ground;
    }

    /// Resolve `h`/`l` parameters to known modes; `None` means the sequence
    /// is consumed with no event
    fn mode_params(&self) -> Option<Vec<Mode>> {
        if !self.params.private {
            debug!("ANSI set/reset mode consumed");
            return None;
        }
        let mut modes = Vec::new();
        for index in 0..self.params.count.min(MAX_PARAMS) {
            let num = self.params.raw(index, 0);
            match Mode::from_private(num) {
                Some(mode) => modes.push(mode),
                None => debug!("unhandled private mode: {}", num),
            }
        }
        if modes.is_empty() {
            None
        } else {
            Some(modes)
        }
    }

    /// Parse SGR (Select Graphic Rendition) parameters
    fn parse_sgr(&self) -> Vec<SgrParameter> {
        let count = self.params.count.clamp(1, MAX_PARAMS);
        let mut out = Vec::with_capacity(count);
        for index in 0..count {
            let param = self.params.raw(index, 0);
            match param {
                0 => out.push(SgrParameter::Reset),
                1 => out.push(SgrParameter::Bold),
                4 => out.push(SgrParameter::Underline),
                5 => out.push(SgrParameter::Blink),
                7 => out.push(SgrParameter::Reverse),

                22 => out.push(SgrParameter::NoBold),
                24 => out.push(SgrParameter::NoUnderline),
                25 => out.push(SgrParameter::NoBlink),
                27 => out.push(SgrParameter::NoReverse),

                30..=37 => out.push(SgrParameter::Foreground(Color::Indexed((param - 30) as u8))),
                39 => out.push(SgrParameter::DefaultForeground),

                40..=47 => out.push(SgrParameter::Background(Color::Indexed((param - 40) as u8))),
                49 => out.push(SgrParameter::DefaultBackground),

                _ => debug!("unhandled SGR parameter: {}", param),
            }
        }
        out
    }
}

impl TerminalParser for Vt100Parser {
    fn parse(&mut self, data: &[u8]) -> Vec<ParsedEvent> {
        self.events.clear();

        for &byte in data {
            self.advance(byte);
        }

        // Flush any pending text
        self.flush_text();

        std::mem::take(&mut self.events)
    }
}

impl Default for Vt100Parser {
    fn default() -> Self {
        Self::new()
    }
}
