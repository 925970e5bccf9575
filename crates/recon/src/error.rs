use std::fmt;

#[derive(Debug)]
pub enum CatalogError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (duplicate source, bad priority table, etc.).
    ConfigValidation(String),
    /// A rule-table pattern failed to compile.
    InvalidPattern { table: String, pattern: String, message: String },
    /// The same label appears twice in the category priority table.
    DuplicatePriority(String),
    /// A source referenced by name is not configured.
    UnknownSource(String),
    /// Missing required column in input data.
    MissingColumn { source: String, column: String },
    /// CSV decoding error.
    Csv { source: String, message: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InvalidPattern { table, pattern, message } => {
                write!(f, "{table} table: invalid pattern '{pattern}': {message}")
            }
            Self::DuplicatePriority(label) => {
                write!(f, "category priority table lists '{label}' more than once")
            }
            Self::UnknownSource(name) => write!(f, "unknown source: {name}"),
            Self::MissingColumn { source, column } => {
                write!(f, "source '{source}': missing column '{column}'")
            }
            Self::Csv { source, message } => write!(f, "source '{source}': CSV error: {message}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}
