//! Command definitions
//!
//! Represents the commands a client can send and the request header.

use crate::error::{ReelError, Result};

/// Request header size: 2 bytes command + 2 bytes body length
pub const REQUEST_HEADER_SIZE: usize = 4;

/// Command types, numbered in their stable wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Command {
    CreateFilm = 0,
    RemoveFilm = 1,
    AddGenre = 2,
    ListTitles = 3,
    ListFilms = 4,
    GetFilm = 5,
    ListByGenre = 6,
}

impl Command {
    /// Every command, in wire order
    pub const ALL: [Command; 7] = [
        Command::CreateFilm,
        Command::RemoveFilm,
        Command::AddGenre,
        Command::ListTitles,
        Command::ListFilms,
        Command::GetFilm,
        Command::ListByGenre,
    ];

    /// Protocol name, as used in logs
    pub fn name(self) -> &'static str {
        match self {
            Command::CreateFilm => "CREATE_FILM",
            Command::RemoveFilm => "REMOVE_FILM",
            Command::AddGenre => "ADD_GENRE",
            Command::ListTitles => "LIST_TITLES",
            Command::ListFilms => "LIST_FILMS",
            Command::GetFilm => "GET_FILM",
            Command::ListByGenre => "LIST_BY_GENRE",
        }
    }
}

impl TryFrom<u16> for Command {
    type Error = ReelError;

    fn try_from(value: u16) -> Result<Self> {
        Command::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| ReelError::Protocol(format!("Unknown command: {}", value)))
    }
}

/// Fixed-size header preceding every request
///
/// `command` is kept as the raw wire value so that a server can still
/// consume the body of a request whose command it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub command: u16,
    pub body_size: u16,
}

impl RequestHeader {
    pub fn new(command: Command, body_size: u16) -> Self {
        Self {
            command: command as u16,
            body_size,
        }
    }

    /// Decode the command field
    pub fn command(&self) -> Result<Command> {
        Command::try_from(self.command)
    }

    pub fn to_bytes(&self) -> [u8; REQUEST_HEADER_SIZE] {
        let mut bytes = [0u8; REQUEST_HEADER_SIZE];
        bytes[0..2].copy_from_slice(&self.command.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.body_size.to_be_bytes());
        bytes
    }

    pub fn from_bytes(bytes: [u8; REQUEST_HEADER_SIZE]) -> Self {
        Self {
            command: u16::from_be_bytes([bytes[0], bytes[1]]),
            body_size: u16::from_be_bytes([bytes[2], bytes[3]]),
        }
    }
}
