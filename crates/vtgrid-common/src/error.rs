use thiserror::Error;

#[derive(Error, Debug)]
pub enum VtGridError {
    #[error("malformed hex dump: {0}")]
    MalformedHexDump(String),

    #[error("grid overflow: {rows}x{cols} exceeds the cell limit")]
    GridOverflow { rows: usize, cols: usize },
}

pub type Result<T> = std::result::Result<T, VtGridError>;
