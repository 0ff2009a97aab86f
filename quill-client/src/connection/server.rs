//! Negotiated server description.

use std::fmt;
use std::net::SocketAddr;

use quill_core::{QuillError, Result};

/// A server version triple with total ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl ServerVersion {
    /// Creates a version from its parts.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses a dotted version string such as `"2.6.0"`. A missing patch or
    /// minor component is treated as zero; a trailing pre-release suffix on
    /// the last component is ignored.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = [0u32; 3];
        for (i, component) in s.splitn(3, '.').enumerate() {
            let digits: &str = component
                .split(|c: char| !c.is_ascii_digit())
                .next()
                .unwrap_or("");
            parts[i] = digits.parse().map_err(|_| {
                QuillError::Decode(format!("unparseable server version {:?}", s))
            })?;
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }

    /// Returns the major component.
    pub fn major(&self) -> u32 {
        self.major
    }

    /// Returns the minor component.
    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Returns the patch component.
    pub fn patch(&self) -> u32 {
        self.patch
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// The negotiated capability snapshot of one connection's server.
///
/// Owned by the connection; read-only to operation executors. For a given
/// description the protocol-path decision is stable, so concurrent callers
/// over the same connection reach identical decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDescription {
    address: SocketAddr,
    version: ServerVersion,
}

impl ServerDescription {
    /// Creates a description for a server at `address` reporting `version`.
    pub fn new(address: SocketAddr, version: ServerVersion) -> Self {
        Self { address, version }
    }

    /// Returns the server's address.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Returns the negotiated server version.
    pub fn version(&self) -> ServerVersion {
        self.version
    }
}
