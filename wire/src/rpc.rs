// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

/// A 16-byte, NUL-padded ASCII identifier selecting which sub-protocol an
/// accepted connection speaks.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RpcSpecifier([u8; 16]);

macro_rules! specifier {
    ($name:ident, $text:expr) => {
        pub const $name: RpcSpecifier = RpcSpecifier(pad($text));
    };
}

const fn pad(s: &str) -> [u8; 16] {
    let bytes = s.as_bytes();
    let mut out = [0u8; 16];
    let mut i = 0;
    while i < bytes.len() {
        out[i] = bytes[i];
        i += 1;
    }
    out
}

impl RpcSpecifier {
    specifier!(SETTINGS, "RPCSettings");
    specifier!(FORM_CONTRACT, "RPCFormContract");
    specifier!(REVISE_CONTRACT, "RPCReviseContract");
    specifier!(RENEW_CONTRACT, "RPCRenewContract");
    specifier!(REVISION_REQUEST, "RPCRevisionRequest");
    specifier!(DOWNLOAD, "RPCDownload");

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        RpcSpecifier(bytes)
    }

    pub fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    /// The specifier's text with trailing NUL padding stripped.
    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(16);
        std::str::from_utf8(&self.0[..end]).unwrap_or("")
    }
}

impl fmt::Debug for RpcSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RpcSpecifier({})", self.as_str())
    }
}

impl fmt::Display for RpcSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
