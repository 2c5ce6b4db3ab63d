use std::fmt;

/// The parser rejected the token list (unknown flag, missing argument, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentParserError {
    message: String,
}

impl ArgumentParserError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ArgumentParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ArgumentParserError {}

/// The parser wants to stop without running the command, e.g. after help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentParserExit {
    /// Exit status, 0 for a help request.
    pub status: i32,
    /// Text the parser would have printed (rendered help), if any.
    pub message: Option<String>,
}

impl ArgumentParserExit {
    #[must_use]
    pub const fn new(status: i32) -> Self {
        Self {
            status,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(status: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }
}

impl fmt::Display for ArgumentParserExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parser exited with status {}", self.status)
    }
}

impl std::error::Error for ArgumentParserExit {}

/// Result of a failed [`super::ArgumentParser::parse_args`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Ordinary parse failure.
    Error(ArgumentParserError),
    /// Control-flow exit (help); not a failure from the user's point of view.
    Exit(ArgumentParserExit),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(e) => e.fmt(f),
            Self::Exit(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Error(e) => Some(e),
            Self::Exit(e) => Some(e),
        }
    }
}

impl From<ArgumentParserError> for ParseError {
    fn from(e: ArgumentParserError) -> Self {
        Self::Error(e)
    }
}

impl From<ArgumentParserExit> for ParseError {
    fn from(e: ArgumentParserExit) -> Self {
        Self::Exit(e)
    }
}

/// A token could not be converted to the parameter's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentTypeError {
    message: String,
}

impl ArgumentTypeError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ArgumentTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ArgumentTypeError {}

/// Errors raised while converting a token to a typed [`super::Value`].
///
/// Only [`ConversionError::InvalidValue`] and [`ConversionError::MissingValue`]
/// are caused by user input. The other variants mean the command itself was
/// declared with a type the converter cannot handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The token is not a valid value for the type.
    InvalidValue(ArgumentTypeError),

    /// No converter exists for the declared type.
    UnknownType {
        /// Parameter name.
        param: String,
        /// Name of the unsupported type.
        type_name: String,
    },

    /// A bare string was declared where a type belongs.
    LegacyStringType {
        /// Parameter name.
        param: String,
    },

    /// No token was given and the parameter has no default.
    MissingValue {
        /// Parameter name.
        param: String,
    },
}

impl ConversionError {
    /// Whether the error was caused by the user's input rather than by the
    /// command definition.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidValue(_) | Self::MissingValue { .. })
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue(e) => e.fmt(f),
            Self::UnknownType { param, type_name } => {
                write!(f, "{param}: Unknown type {type_name}!")
            }
            Self::LegacyStringType { param } => write!(f, "{param}: Legacy string type!"),
            Self::MissingValue { param } => write!(f, "{param}: Missing value!"),
        }
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidValue(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArgumentTypeError> for ConversionError {
    fn from(e: ArgumentTypeError) -> Self {
        Self::InvalidValue(e)
    }
}
