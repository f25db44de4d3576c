use super::config::Breadcrumb;
use super::registry::ObjectKind;

/// Represents all user errors that are generated from within the Compiler
/// module and its submodules.
///
/// This type captures the metadata which is present for every error caused
/// by the input document: the breadcrumb of the node or field at which the
/// violation was detected. It also handles formatting the error message with
/// that location in front of the inner message.
///
/// The inner error carries the data which is specific to the kind of
/// violation.
#[derive(Clone, Debug, PartialEq)]
pub struct CompilerError<IE: std::fmt::Display> {
    path: Breadcrumb,
    inner: IE,
}

impl<IE> CompilerError<IE>
where
    IE: std::fmt::Display,
{
    pub fn new(path: Breadcrumb, inner: IE) -> Self {
        CompilerError { path, inner }
    }

    pub fn inner(&self) -> &IE {
        &self.inner
    }

    pub fn path(&self) -> &Breadcrumb {
        &self.path
    }
}

impl<IE> std::fmt::Display for CompilerError<IE>
where
    IE: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.inner)
    }
}

impl<IE> std::error::Error for CompilerError<IE> where IE: std::fmt::Display + std::fmt::Debug {}

/// The kinds of JSON values a field can be expected to hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Integer,
    Number,
    Bool,
    List,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValueKind::String => "a string",
            ValueKind::Integer => "an integer",
            ValueKind::Number => "a number",
            ValueKind::Bool => "a boolean",
            ValueKind::List => "a list",
        };
        f.write_str(s)
    }
}

/// Violations of the implicit schema of the input document.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    MissingField,
    WrongType(ValueKind),
    MissingOrNotAnObject,
    CountOutOfRange { count: i64, min: usize, max: usize },
    NotFound { field: String, value: String },
    FormatError(String),
    DuplicateName(String),
    UnknownReference(ObjectKind, String),
    UnknownChoice(String),
    InvalidIntegerType(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ConfigError::*;
        match self {
            MissingField => f.write_str("Missing required field"),
            WrongType(kind) => write!(f, "Expected {}", kind),
            MissingOrNotAnObject => f.write_str("Missing or not an object"),
            CountOutOfRange { count, min, max } => write!(
                f,
                "Expected between {} and {} elements but found {}",
                min, max, count
            ),
            NotFound { field, value } => {
                write!(f, "No element with {} equal to '{}'", field, value)
            }
            FormatError(msg) => write!(f, "Incorrect format: {}", msg),
            DuplicateName(what) => write!(f, "Duplicate {} name", what),
            UnknownReference(kind, name) => write!(f, "Nonexistent {} '{}' specified", kind, name),
            UnknownChoice(tag) => write!(f, "Unknown choice '{}'", tag),
            InvalidIntegerType(ty) => write!(f, "Invalid integer type '{}'", ty),
            Invalid(msg) => f.write_str(msg),
        }
    }
}

/// Captures the failure state of any operation which reads the input
/// document.
pub type ConfigResult<T> = Result<T, CompilerError<ConfigError>>;
