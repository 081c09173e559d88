// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-chain host-announcement encoding (spec §6): the arbitrary transaction
//! data a host attaches to the chain so renters can discover its address
//! and public key. Pure encoding only — broadcasting it is a consensus
//! concern outside this crate.

use host_types::NetAddress;

const PREFIX: &[u8; 16] = b"HostAnnouncement";

/// `prefix || len-prefixed net address || 32-byte public key || 64-byte signature`.
pub fn encode_announcement(net_address: &NetAddress, public_key: &[u8; 32], signature: &[u8; 64]) -> Vec<u8> {
    let address_bytes = net_address.to_string().into_bytes();
    let mut out = Vec::with_capacity(PREFIX.len() + 8 + address_bytes.len() + public_key.len() + signature.len());
    out.extend_from_slice(PREFIX);
    out.extend_from_slice(&(address_bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(&address_bytes);
    out.extend_from_slice(public_key);
    out.extend_from_slice(signature);
    out
}

/// The signed payload (everything but the signature itself) that the host
/// key signs to produce the announcement's trailing signature.
pub fn announcement_signing_bytes(net_address: &NetAddress, public_key: &[u8; 32]) -> Vec<u8> {
    let address_bytes = net_address.to_string().into_bytes();
    let mut out = Vec::with_capacity(PREFIX.len() + 8 + address_bytes.len() + public_key.len());
    out.extend_from_slice(PREFIX);
    out.extend_from_slice(&(address_bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(&address_bytes);
    out.extend_from_slice(public_key);
    out
}

/// Decodes an announcement previously produced by [`encode_announcement`],
/// returning `(net_address, public_key, signature)`. Does not verify the
/// signature: callers hold the verification key and do that themselves.
pub fn decode_announcement(bytes: &[u8]) -> Option<(NetAddress, [u8; 32], [u8; 64])> {
    let rest = bytes.strip_prefix(PREFIX.as_slice())?;
    if rest.len() < 8 {
        return None;
    }
    let (len_bytes, rest) = rest.split_at(8);
    let len = u64::from_le_bytes(len_bytes.try_into().ok()?) as usize;
    if rest.len() < len {
        return None;
    }
    let (address_bytes, rest) = rest.split_at(len);
    let net_address = NetAddress::parse(std::str::from_utf8(address_bytes).ok()?).ok()?;
    if rest.len() != 32 + 64 {
        return None;
    }
    let (key_bytes, sig_bytes) = rest.split_at(32);
    Some((net_address, key_bytes.try_into().ok()?, sig_bytes.try_into().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_decode() {
        let addr = NetAddress::parse("127.0.0.1:9982").unwrap();
        let key = [7u8; 32];
        let sig = [9u8; 64];
        let encoded = encode_announcement(&addr, &key, &sig);
        let (decoded_addr, decoded_key, decoded_sig) = decode_announcement(&encoded).unwrap();
        assert_eq!(decoded_addr, addr);
        assert_eq!(decoded_key, key);
        assert_eq!(decoded_sig, sig);
    }

    #[test]
    fn rejects_a_buffer_missing_the_prefix() {
        assert!(decode_announcement(b"not an announcement").is_none());
    }

    #[test]
    fn signing_bytes_are_a_strict_prefix_of_the_full_encoding() {
        let addr = NetAddress::parse("example.com:9982").unwrap();
        let key = [1u8; 32];
        let sig = [2u8; 64];
        let signing_bytes = announcement_signing_bytes(&addr, &key);
        let encoded = encode_announcement(&addr, &key, &sig);
        assert_eq!(&encoded[..signing_bytes.len()], signing_bytes.as_slice());
    }
}
