//! Deterministic wallet derivation.
//!
//! A wallet is derived purely from the identity provider's user identifier:
//!
//! ```text
//! private_key = keccak256(utf8(identifier))
//! public_key  = secp256k1(private_key), uncompressed, without the 0x04 tag
//! address     = eip55(keccak256(public_key)[12..])
//! ```
//!
//! This is only used as an offline fallback when the backend cannot be
//! reached at login. The backend provisions wallets on its own, so nothing
//! guarantees that both sides arrive at the same address.

use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};

/// Length of a raw EVM address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// A keypair-backed address derived from a user identifier.
///
/// Never persisted; recompute it with [`derive_wallet`] when needed.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedWallet {
    private_key: [u8; 32],
    address: String,
}

impl DerivedWallet {
    /// Build a wallet from raw private key bytes.
    ///
    /// Returns `None` when the bytes are not a valid secp256k1 scalar
    /// (zero, or not below the curve order).
    pub fn from_private_key(private_key: [u8; 32]) -> Option<Self> {
        let signing_key = SigningKey::from_bytes(&private_key.into()).ok()?;
        let point = signing_key.verifying_key().to_encoded_point(false);
        // Skip the 0x04 uncompressed-point tag.
        let digest = keccak256(&point.as_bytes()[1..]);

        let mut raw = [0u8; ADDRESS_LEN];
        raw.copy_from_slice(&digest[32 - ADDRESS_LEN..]);

        Some(Self {
            private_key,
            address: to_checksum_address(&raw),
        })
    }

    /// The EIP-55 checksummed address, `0x`-prefixed.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Raw private key bytes.
    pub fn private_key(&self) -> &[u8; 32] {
        &self.private_key
    }

    /// Private key as `0x`-prefixed lowercase hex.
    pub fn private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.private_key))
    }

    pub fn into_address(self) -> String {
        self.address
    }
}

impl std::fmt::Debug for DerivedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedWallet")
            .field("private_key", &"<redacted>")
            .field("address", &self.address)
            .finish()
    }
}

/// Derive the wallet for `identifier`.
///
/// Returns `None` for an empty identifier. Any non-empty text is accepted
/// as-is; no format validation is applied.
pub fn derive_wallet(identifier: &str) -> Option<DerivedWallet> {
    if identifier.is_empty() {
        return None;
    }

    let private_key = keccak256(identifier.as_bytes());
    let wallet = DerivedWallet::from_private_key(private_key);
    if wallet.is_none() {
        // keccak256 output outside [1, n) has probability ~2^-128.
        tracing::error!("identifier digest is not a valid secp256k1 scalar");
    }
    wallet
}

/// Derive only the address for `identifier`, or `None` when it is empty.
pub fn derive_address(identifier: &str) -> Option<String> {
    derive_wallet(identifier).map(DerivedWallet::into_address)
}

/// Render a raw 20-byte address with the EIP-55 mixed-case checksum.
pub fn to_checksum_address(raw: &[u8; ADDRESS_LEN]) -> String {
    let lower = hex::encode(raw);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Shorten an address for display: the first six characters and `...`.
pub fn truncate_address(address: &str) -> String {
    let head: String = address.chars().take(6).collect();
    format!("{head}...")
}

fn keccak256(bytes: &[u8]) -> [u8; 32] {
    Keccak256::digest(bytes).into()
}
