//! Peer identity and its UDP message encodings

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{LocalDropError, Result};

pub const DISCOVERY_REQUEST: &str = "DISCOVERY_REQUEST";
pub const DISCOVERY_RESPONSE: &str = "DISCOVERY_RESPONSE";
pub const HELLO: &str = "HELLO";
pub const BYE: &str = "BYE";

/// A peer in the LAN with a display name and a file transfer port
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Peer {
    pub name: String,
    pub ip: String,
    pub file_transfer_port: u16,
}

impl Peer {
    pub fn new(name: impl Into<String>, ip: impl Into<String>, file_transfer_port: u16) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
            file_transfer_port,
        }
    }

    /// `ip:port` of the peer's file receiver
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.file_transfer_port)
    }

    /// Two peers share an endpoint when IP and transfer port match, regardless of name
    pub fn same_endpoint(&self, other: &Peer) -> bool {
        self.ip == other.ip && self.file_transfer_port == other.file_transfer_port
    }

    pub fn to_discovery_response(&self) -> String {
        self.to_message(DISCOVERY_RESPONSE)
    }

    pub fn from_discovery_response(message: &str) -> Option<Peer> {
        Self::from_message(DISCOVERY_RESPONSE, message)
    }

    pub fn to_hello_message(&self) -> String {
        self.to_message(HELLO)
    }

    pub fn from_hello_message(message: &str) -> Option<Peer> {
        Self::from_message(HELLO, message)
    }

    pub fn to_bye_message(&self) -> String {
        self.to_message(BYE)
    }

    pub fn from_bye_message(message: &str) -> Option<Peer> {
        Self::from_message(BYE, message)
    }

    fn to_message(&self, prefix: &str) -> String {
        format!(
            "{}|{}|{}|{}",
            prefix, self.name, self.ip, self.file_transfer_port
        )
    }

    fn from_message(prefix: &str, message: &str) -> Option<Peer> {
        let parts: Vec<&str> = message.trim_end_matches(['\0', '\n']).split('|').collect();
        if parts.len() != 4 || parts[0] != prefix {
            return None;
        }
        let port = parts[3].parse::<u16>().ok()?;
        Some(Peer::new(parts[1], parts[2], port))
    }

    /// Validate a display name
    ///
    /// A valid name is non-empty and contains only letters, numbers and spaces.
    /// This also keeps the `|` separator out of every UDP message.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(LocalDropError::validation("Username must not be empty"));
        }
        if !name.chars().all(|c| c.is_alphanumeric() || c == ' ') {
            return Err(LocalDropError::validation(format!(
                "Username '{}' is invalid: a valid username can only contain letters, numbers and spaces",
                name
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}:{}", self.name, self.ip, self.file_transfer_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Peer {
        Peer::new("alice", "192.168.1.20", 40123)
    }

    #[test]
    fn test_display() {
        assert_eq!(alice().to_string(), "alice - 192.168.1.20:40123");
    }

    #[test]
    fn test_discovery_response_roundtrip() {
        let msg = alice().to_discovery_response();
        assert_eq!(msg, "DISCOVERY_RESPONSE|alice|192.168.1.20|40123");
        assert_eq!(Peer::from_discovery_response(&msg), Some(alice()));
    }

    #[test]
    fn test_prefix_must_match() {
        let hello = alice().to_hello_message();
        assert!(Peer::from_bye_message(&hello).is_none());
        assert!(Peer::from_discovery_response(&hello).is_none());
        assert_eq!(Peer::from_hello_message(&hello), Some(alice()));
    }

    #[test]
    fn test_malformed_messages() {
        assert!(Peer::from_hello_message("HELLO|alice|1.2.3.4").is_none());
        assert!(Peer::from_hello_message("HELLO|alice|1.2.3.4|notaport").is_none());
        assert!(Peer::from_hello_message("HELLO|alice|1.2.3.4|70000").is_none());
        assert!(Peer::from_hello_message("HELLO|a|b|1|extra").is_none());
        assert!(Peer::from_hello_message("").is_none());
    }

    #[test]
    fn test_same_endpoint_ignores_name() {
        let renamed = Peer::new("bob", "192.168.1.20", 40123);
        assert!(alice().same_endpoint(&renamed));
        assert_ne!(alice(), renamed);
        assert!(!alice().same_endpoint(&Peer::new("alice", "192.168.1.20", 40124)));
    }

    #[test]
    fn test_validate_name() {
        assert!(Peer::validate_name("Alice 2").is_ok());
        assert!(Peer::validate_name("   ").is_err());
        assert!(Peer::validate_name("a|b").is_err());
        assert!(Peer::validate_name("bad-name").is_err());
    }
}
