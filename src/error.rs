//! Unified error types for the Modbus RTU core.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! dispatcher's error handling uniform. All variants are `Copy` so they can
//! be passed through the event path without allocation.

use core::fmt;

/// Every fallible operation in the core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A protocol-level fault observed on the wire (bad CRC, malformed frame).
    Protocol(ProtocolError),
    /// A server-side semantic error while handling a request.
    Server(ServerError),
    /// A client transaction failed.
    Client(ClientError),
    /// A programmer error: invalid argument, use-after-free, exhausted arena.
    Programmer(ProgrammerError),
    /// Configuration is invalid or internally inconsistent.
    Config(&'static str),
    /// A subsystem failed to initialize.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Server(e) => write!(f, "server: {e}"),
            Self::Client(e) => write!(f, "client: {e}"),
            Self::Programmer(e) => write!(f, "programmer error: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Protocol errors (§7: absorbed by the transport, never surface to the app)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// CRC-16 check failed.
    CrcMismatch,
    /// Frame shorter than the minimum addr+code+crc length, or longer than 256.
    MalformedFrame,
    /// Address did not match the server's node address or the client's pending target.
    AddressMismatch,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::MalformedFrame => write!(f, "malformed frame"),
            Self::AddressMismatch => write!(f, "address mismatch"),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Server errors (§7: surface only as exception responses)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerError {
    IllegalFunction,
    IllegalDataAddress,
    IllegalDataValue,
    ServerDeviceFailure,
}

impl ServerError {
    /// The 1-byte exception code placed after the function code on the wire.
    pub const fn exception_code(self) -> u8 {
        match self {
            Self::IllegalFunction => crate::common::EXC_ILLEGAL_FUNCTION,
            Self::IllegalDataAddress => crate::common::EXC_ILLEGAL_DATA_ADDRESS,
            Self::IllegalDataValue => crate::common::EXC_ILLEGAL_DATA_VALUE,
            Self::ServerDeviceFailure => crate::common::EXC_SERVER_DEVICE_FAILURE,
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalFunction => write!(f, "illegal function"),
            Self::IllegalDataAddress => write!(f, "illegal data address"),
            Self::IllegalDataValue => write!(f, "illegal data value"),
            Self::ServerDeviceFailure => write!(f, "server device failure"),
        }
    }
}

impl From<ServerError> for Error {
    fn from(e: ServerError) -> Self {
        Self::Server(e)
    }
}

// ---------------------------------------------------------------------------
// Client errors (§7: surface to the client's caller)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientError {
    /// No response arrived within `response_timeout_ms`.
    Timeout,
    /// A transaction is already in flight on this channel.
    TransactionInProgress,
    /// The response did not match the outstanding request (addr/code/length).
    UnexpectedResponse,
    /// The server returned an exception response; carries the exception code.
    Exception(u8),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "response timeout"),
            Self::TransactionInProgress => write!(f, "transaction already in progress"),
            Self::UnexpectedResponse => write!(f, "unexpected response"),
            Self::Exception(code) => write!(f, "exception response: 0x{code:02X}"),
        }
    }
}

impl From<ClientError> for Error {
    fn from(e: ClientError) -> Self {
        Self::Client(e)
    }
}

// ---------------------------------------------------------------------------
// Programmer errors (§7: fatal to the operation, not to the system)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgrammerError {
    /// Every slot in the relevant arena is in use.
    ArenaExhausted,
    /// A handle referred to a slot that has since been freed or never existed.
    UseAfterFree,
    /// A transport already has a channel linked to it.
    AlreadyLinked,
    /// A handle was passed to an operation that expects a different context kind.
    WrongContextKind,
    /// An argument was outside its documented range.
    InvalidArgument(&'static str),
}

impl fmt::Display for ProgrammerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArenaExhausted => write!(f, "arena exhausted"),
            Self::UseAfterFree => write!(f, "use after free"),
            Self::AlreadyLinked => write!(f, "transport already linked to a channel"),
            Self::WrongContextKind => write!(f, "wrong context kind"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
        }
    }
}

impl From<ProgrammerError> for Error {
    fn from(e: ProgrammerError) -> Self {
        Self::Programmer(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
