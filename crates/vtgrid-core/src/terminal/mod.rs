mod buffer;
mod cursor;
mod state;

pub use buffer::ScreenBuffer;
pub use cursor::Cursor;
pub use state::TerminalState;
