//! Error taxonomy. `ProtocolError` is fatal to a connection; `CommandError`
//! is caught by the dispatcher and turned into an Error reply.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Protocol error: invalid multibulk length")]
    InvalidMultibulkLength,

    #[error("Protocol error: expected '$', got something else")]
    ExpectedBulkLength,

    #[error("Protocol error: invalid bulk length")]
    InvalidBulkLength,

    #[error("Protocol error: unbalanced input")]
    Malformed,
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR wrong number of arguments for '{0}' command")]
    Arity(String),

    #[error("ERR not implemented")]
    NotImplemented,

    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    #[error("ERR value is not a valid float")]
    NotAFloat,

    #[error("ERR {0}")]
    Generic(String),
}

impl CommandError {
    pub fn generic(msg: impl Into<String>) -> Self {
        CommandError::Generic(msg.into())
    }

    /// Renders the error text as it appears on the wire, after the leading `-`.
    pub fn wire_text(&self) -> String {
        self.to_string()
    }
}
