// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("net address {0:?} is not a parseable host:port pair")]
pub struct NetAddressError(String);

/// A `host:port` pair advertised in external settings and in the on-chain
/// host announcement. Validated once at construction so every later use can
/// assume a syntactically sound address; resolving the host is a network
/// concern for whoever dials it, not this type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetAddress {
    host: String,
    port: u16,
}

impl NetAddress {
    pub fn parse(s: &str) -> Result<Self, NetAddressError> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| NetAddressError(s.to_string()))?;
        if host.is_empty() {
            return Err(NetAddressError(s.to_string()));
        }
        let port: u16 = port.parse().map_err(|_| NetAddressError(s.to_string()))?;
        Ok(NetAddress {
            host: host.to_string(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for NetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for NetAddress {
    type Err = NetAddressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NetAddress {
    type Error = NetAddressError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<NetAddress> for String {
    fn from(addr: NetAddress) -> Self {
        addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_host_port_pair() {
        let addr = NetAddress::parse("host.example.com:9982").unwrap();
        assert_eq!(addr.host(), "host.example.com");
        assert_eq!(addr.port(), 9982);
    }

    #[test]
    fn rejects_a_missing_port() {
        assert!(NetAddress::parse("host.example.com").is_err());
    }

    #[test]
    fn rejects_a_non_numeric_port() {
        assert!(NetAddress::parse("host.example.com:http").is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let addr = NetAddress::parse("127.0.0.1:9982").unwrap();
        assert_eq!(NetAddress::parse(&addr.to_string()).unwrap(), addr);
    }
}
