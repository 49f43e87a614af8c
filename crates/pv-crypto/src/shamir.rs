//! Shamir secret sharing of the master key across custodians.
//!
//! The master key K2 is split into `total` shares with threshold `t` over
//! GF(256). Any `t` shares reconstruct K2 exactly; fewer than `t` reveal
//! nothing about it (information-theoretic, even knowing `total` and `t`).
//!
//! Interpolation alone cannot tell right shares from wrong ones: any `t`
//! 33-byte values interpolate to *some* key. The recovered candidate is
//! therefore only trusted after it unwraps the wrapped content key; the
//! disclosure layer maps that unwrap failure to `ReconstructionMismatch`.

use std::collections::HashSet;

use sharks::{Share, Sharks};
use zeroize::Zeroize;

use pv_core::{VaultError, VaultResult};

use crate::keys::MasterKey;
use crate::{KEY_SIZE, SHARE_SIZE};

/// One custodian's share of the master key.
///
/// The (index, value) pairing is load-bearing: moving a value to a
/// different index silently corrupts reconstruction, which is why shares
/// are only ever serialized as a single 33-byte unit.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyShare {
    /// Evaluation point x (1-255; 0 would be the secret itself).
    pub index: u8,
    /// Polynomial evaluations at x, one byte per secret byte.
    pub value: [u8; KEY_SIZE],
}

impl KeyShare {
    /// Serialize as `[index][32 value bytes]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(SHARE_SIZE);
        bytes.push(self.index);
        bytes.extend_from_slice(&self.value);
        bytes
    }

    /// Parse a share from its 33-byte encoding.
    pub fn from_bytes(bytes: &[u8]) -> VaultResult<Self> {
        if bytes.len() != SHARE_SIZE {
            return Err(VaultError::MalformedKeyMaterial(format!(
                "share has {} bytes (expected {SHARE_SIZE})",
                bytes.len()
            )));
        }
        if bytes[0] == 0 {
            return Err(VaultError::MalformedKeyMaterial(
                "share index must be non-zero".into(),
            ));
        }
        let mut value = [0u8; KEY_SIZE];
        value.copy_from_slice(&bytes[1..]);
        Ok(Self {
            index: bytes[0],
            value,
        })
    }

    fn to_sharks(&self) -> VaultResult<Share> {
        Share::try_from(self.to_bytes().as_slice())
            .map_err(|_| VaultError::MalformedKeyMaterial("share rejected by field codec".into()))
    }
}

impl Drop for KeyShare {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

impl std::fmt::Debug for KeyShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyShare")
            .field("index", &self.index)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Split the master key into `total` shares with reconstruction
/// threshold `threshold`.
pub fn split_master_key(
    master: &MasterKey,
    total: u8,
    threshold: u8,
) -> VaultResult<Vec<KeyShare>> {
    if threshold == 0 || threshold > total {
        return Err(VaultError::MalformedInput(format!(
            "invalid share parameters: threshold {threshold} of {total}"
        )));
    }

    let sharks = Sharks(threshold);
    let dealer = sharks.dealer(master.as_bytes());

    let shares = dealer
        .take(total as usize)
        .map(|share| {
            let bytes: Vec<u8> = (&share).into();
            KeyShare::from_bytes(&bytes)
        })
        .collect::<VaultResult<Vec<_>>>()?;

    Ok(shares)
}

/// Interpolate a candidate master key from custodian shares.
///
/// Fails closed with `InsufficientShares` below the threshold and
/// `MalformedInput` on duplicate indices. The result is a *candidate*:
/// callers must verify it against the wrapped content key before use and
/// treat an unwrap failure as `ReconstructionMismatch`.
pub fn combine_shares(shares: &[KeyShare], threshold: u8) -> VaultResult<MasterKey> {
    if shares.len() < threshold as usize {
        return Err(VaultError::InsufficientShares {
            got: shares.len(),
            need: threshold as usize,
        });
    }

    let mut seen = HashSet::new();
    for share in shares {
        if !seen.insert(share.index) {
            return Err(VaultError::MalformedInput(format!(
                "duplicate share index {}",
                share.index
            )));
        }
    }

    let sharks_shares = shares
        .iter()
        .map(|s| s.to_sharks())
        .collect::<VaultResult<Vec<_>>>()?;

    let mut secret = Sharks(threshold)
        .recover(sharks_shares.iter())
        .map_err(|e| VaultError::MalformedKeyMaterial(format!("share recovery failed: {e}")))?;

    if secret.len() != KEY_SIZE {
        secret.zeroize();
        return Err(VaultError::MalformedKeyMaterial(format!(
            "recovered secret has {} bytes (expected {KEY_SIZE})",
            secret.len()
        )));
    }

    let mut key_bytes = [0u8; KEY_SIZE];
    key_bytes.copy_from_slice(&secret);
    secret.zeroize();

    Ok(MasterKey::from_bytes(key_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_master_key;

    #[test]
    fn every_threshold_subset_reconstructs() {
        let master = generate_master_key();
        let shares = split_master_key(&master, 3, 2).unwrap();
        assert_eq!(shares.len(), 3);

        for (a, b) in [(0, 1), (0, 2), (1, 2)] {
            let subset = vec![shares[a].clone(), shares[b].clone()];
            let recovered = combine_shares(&subset, 2).unwrap();
            assert_eq!(recovered.as_bytes(), master.as_bytes());
        }
    }

    #[test]
    fn all_shares_also_reconstruct() {
        let master = generate_master_key();
        let shares = split_master_key(&master, 5, 3).unwrap();
        let recovered = combine_shares(&shares, 3).unwrap();
        assert_eq!(recovered.as_bytes(), master.as_bytes());
    }

    #[test]
    fn below_threshold_is_insufficient() {
        let master = generate_master_key();
        let shares = split_master_key(&master, 3, 2).unwrap();

        let err = combine_shares(&shares[..1], 2).unwrap_err();
        assert!(matches!(
            err,
            VaultError::InsufficientShares { got: 1, need: 2 }
        ));
    }

    #[test]
    fn duplicate_indices_are_malformed() {
        let master = generate_master_key();
        let shares = split_master_key(&master, 3, 2).unwrap();

        let duplicated = vec![shares[0].clone(), shares[0].clone()];
        let err = combine_shares(&duplicated, 2).unwrap_err();
        assert!(matches!(err, VaultError::MalformedInput(_)));
    }

    #[test]
    fn fabricated_shares_interpolate_to_a_different_key() {
        let master = generate_master_key();
        let forged = vec![
            KeyShare {
                index: 1,
                value: [0x11; KEY_SIZE],
            },
            KeyShare {
                index: 2,
                value: [0x22; KEY_SIZE],
            },
        ];

        // Interpolation itself succeeds — only the higher-layer unwrap
        // check can expose the forgery.
        let candidate = combine_shares(&forged, 2).unwrap();
        assert_ne!(candidate.as_bytes(), master.as_bytes());
    }

    #[test]
    fn invalid_parameters_rejected() {
        let master = generate_master_key();
        assert!(matches!(
            split_master_key(&master, 3, 0).unwrap_err(),
            VaultError::MalformedInput(_)
        ));
        assert!(matches!(
            split_master_key(&master, 2, 3).unwrap_err(),
            VaultError::MalformedInput(_)
        ));
    }

    #[test]
    fn share_encoding_roundtrips() {
        let master = generate_master_key();
        let shares = split_master_key(&master, 3, 2).unwrap();

        for share in &shares {
            let decoded = KeyShare::from_bytes(&share.to_bytes()).unwrap();
            assert_eq!(&decoded, share);
        }
    }

    #[test]
    fn zero_index_share_rejected() {
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&[7u8; KEY_SIZE]);
        let err = KeyShare::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, VaultError::MalformedKeyMaterial(_)));
    }
}
