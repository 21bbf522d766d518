//! Console input handling.

use chatrelay_shared::framing::Framing;

/// One line typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientInput<'a> {
    /// `/exit`: disconnect
    Exit,
    /// Empty line, nothing is sent
    Skip,
    /// Anything else is sent verbatim
    Send(&'a str),
}

impl<'a> ClientInput<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            ClientInput::Skip
        } else if line.trim() == "/exit" {
            ClientInput::Exit
        } else {
            ClientInput::Send(line)
        }
    }
}

/// Build the bytes sent for one line: `"<name>: <line>"`, plus the
/// delimiter in line framing.
pub fn encode_outgoing(name: &str, line: &str, framing: Framing) -> Vec<u8> {
    framing.encode(format!("{}: {}", name, line).as_bytes())
}
