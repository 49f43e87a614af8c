//! Versioned framing for key material crossing the ledger boundary.
//!
//! Every blob the ledger stores or returns — wrapped keys, shares, sealed
//! shares — carries one explicit frame instead of being guessed at decode
//! time:
//! ```text
//! [1 byte: kind tag][1 byte: version][4 bytes BE: payload length][payload]
//! ```
//! Readers validate the frame before any payload byte reaches a
//! cryptographic primitive; every violation is `MalformedKeyMaterial`.

use pv_core::{VaultError, VaultResult};

const HEADER_LEN: usize = 1 + 1 + 4;
const VERSION: u8 = 1;

/// What a framed blob claims to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Content key wrapped under the master key.
    WrappedKey,
    /// A bare (index, value) master-key share.
    Share,
    /// A share or key sealed to an identity public key.
    Sealed,
}

impl Kind {
    fn tag(&self) -> u8 {
        match self {
            Kind::WrappedKey => 0x01,
            Kind::Share => 0x02,
            Kind::Sealed => 0x03,
        }
    }

    fn from_tag(tag: u8) -> Option<Kind> {
        match tag {
            0x01 => Some(Kind::WrappedKey),
            0x02 => Some(Kind::Share),
            0x03 => Some(Kind::Sealed),
            _ => None,
        }
    }
}

/// Frame a payload for storage on the ledger.
///
/// Payload length must fit the 4-byte length field; anything larger is
/// rejected rather than framed with a truncated declared length.
pub fn encode(kind: Kind, payload: &[u8]) -> VaultResult<Vec<u8>> {
    let declared = declared_len(payload.len())?;
    let mut framed = Vec::with_capacity(HEADER_LEN + payload.len());
    framed.push(kind.tag());
    framed.push(VERSION);
    framed.extend_from_slice(&declared.to_be_bytes());
    framed.extend_from_slice(payload);
    Ok(framed)
}

fn declared_len(len: usize) -> VaultResult<u32> {
    u32::try_from(len).map_err(|_| {
        VaultError::MalformedInput(format!("payload of {len} bytes exceeds the frame length field"))
    })
}

/// Validate a frame and return its payload.
///
/// The caller states which kind it expects; a mismatched tag is rejected
/// rather than falling through to another decoder.
pub fn decode(expected: Kind, framed: &[u8]) -> VaultResult<&[u8]> {
    if framed.len() < HEADER_LEN {
        return Err(VaultError::MalformedKeyMaterial(format!(
            "frame too short: {} bytes (header is {HEADER_LEN})",
            framed.len()
        )));
    }

    let kind = Kind::from_tag(framed[0]).ok_or_else(|| {
        VaultError::MalformedKeyMaterial(format!("unknown key material tag 0x{:02x}", framed[0]))
    })?;
    if kind != expected {
        return Err(VaultError::MalformedKeyMaterial(format!(
            "expected {expected:?} material, found {kind:?}"
        )));
    }

    if framed[1] != VERSION {
        return Err(VaultError::MalformedKeyMaterial(format!(
            "unsupported key material version {}",
            framed[1]
        )));
    }

    let declared = u32::from_be_bytes(
        framed[2..6]
            .try_into()
            .expect("header slice is 4 bytes"),
    ) as usize;
    let payload = &framed[HEADER_LEN..];
    if payload.len() != declared {
        return Err(VaultError::MalformedKeyMaterial(format!(
            "declared payload length {declared} but found {} bytes",
            payload.len()
        )));
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        for kind in [Kind::WrappedKey, Kind::Share, Kind::Sealed] {
            let framed = encode(kind, b"payload bytes").unwrap();
            assert_eq!(decode(kind, &framed).unwrap(), b"payload bytes");
        }
    }

    #[test]
    fn kind_mismatch_rejected() {
        let framed = encode(Kind::Share, b"share").unwrap();
        let err = decode(Kind::WrappedKey, &framed).unwrap_err();
        assert!(matches!(err, VaultError::MalformedKeyMaterial(_)));
    }

    #[test]
    fn unknown_tag_rejected() {
        let mut framed = encode(Kind::Share, b"share").unwrap();
        framed[0] = 0x7F;
        let err = decode(Kind::Share, &framed).unwrap_err();
        assert!(matches!(err, VaultError::MalformedKeyMaterial(_)));
    }

    #[test]
    fn unknown_version_rejected() {
        let mut framed = encode(Kind::Sealed, b"sealed").unwrap();
        framed[1] = 2;
        let err = decode(Kind::Sealed, &framed).unwrap_err();
        assert!(matches!(err, VaultError::MalformedKeyMaterial(_)));
    }

    #[test]
    fn length_mismatch_rejected() {
        let mut framed = encode(Kind::WrappedKey, b"wrapped").unwrap();
        framed.push(0xAA); // trailing garbage
        let err = decode(Kind::WrappedKey, &framed).unwrap_err();
        assert!(matches!(err, VaultError::MalformedKeyMaterial(_)));
    }

    #[test]
    fn truncated_frame_rejected() {
        let err = decode(Kind::Share, &[0x02, 0x01]).unwrap_err();
        assert!(matches!(err, VaultError::MalformedKeyMaterial(_)));
    }

    #[test]
    fn oversized_payload_rejected() {
        let err = declared_len(u32::MAX as usize + 1).unwrap_err();
        assert!(matches!(err, VaultError::MalformedInput(_)));
    }

    #[test]
    fn empty_payload_allowed() {
        let framed = encode(Kind::Sealed, b"").unwrap();
        assert_eq!(decode(Kind::Sealed, &framed).unwrap(), b"");
    }
}
