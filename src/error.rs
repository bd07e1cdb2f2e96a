use thiserror::Error;

/// Error types shared by the EFT container parser and the WSQ decoder.
///
/// The three failure families from the record/decode pipeline are variants
/// of one enum so callers can catch broadly; `kind()` exposes a stable name
/// tag for diagnostics.
#[derive(Error, Debug)]
pub enum EftError {
    #[error("Parse error{}: {message}", context(.offset, .record_type))]
    Parse {
        message: String,
        offset: Option<usize>,
        record_type: Option<u32>,
    },

    #[error("Decode error{}: {message}", context(.offset, &None))]
    Decode {
        message: String,
        offset: Option<usize>,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EftResult<T> = Result<T, EftError>;

fn context(offset: &Option<usize>, record_type: &Option<u32>) -> String {
    match (offset, record_type) {
        (Some(off), Some(rt)) => format!(" at offset {} (record type {})", off, rt),
        (Some(off), None) => format!(" at offset {}", off),
        (None, Some(rt)) => format!(" (record type {})", rt),
        (None, None) => String::new(),
    }
}

impl EftError {
    pub fn parse(message: impl Into<String>) -> Self {
        EftError::Parse {
            message: message.into(),
            offset: None,
            record_type: None,
        }
    }

    pub fn parse_at(message: impl Into<String>, offset: usize) -> Self {
        EftError::Parse {
            message: message.into(),
            offset: Some(offset),
            record_type: None,
        }
    }

    pub fn parse_record(message: impl Into<String>, offset: usize, record_type: u32) -> Self {
        EftError::Parse {
            message: message.into(),
            offset: Some(offset),
            record_type: Some(record_type),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        EftError::Decode {
            message: message.into(),
            offset: None,
        }
    }

    pub fn decode_at(message: impl Into<String>, offset: usize) -> Self {
        EftError::Decode {
            message: message.into(),
            offset: Some(offset),
        }
    }

    /// Stable name tag, independent of the display text.
    pub fn kind(&self) -> &'static str {
        match self {
            EftError::Parse { .. } => "ParseError",
            EftError::Decode { .. } => "DecodeError",
            EftError::Validation(_) => "ValidationError",
            EftError::Io(_) => "IoError",
        }
    }
}
