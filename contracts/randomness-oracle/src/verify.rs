use drand_verify::{G2PubkeyRfc, Pubkey};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Public key of drand quicknet (scheme bls-unchained-g1-rfc9380), hex encoded.
pub const QUICKNET_PK_HEX: &str = "83cf0f2896adee7eb8b5f01fcad3912212c437e0073e911fb90022d3e760183c8c4b450b6a0a6c3ac6a5776a2d1064510d1fec758c921cc22b0e17e63aaf4bcb5ed66304de9cf809bd274ca73bab4af5a6e9c76a4bc09e76eae8991ef5ece45a";

#[derive(Error, Debug, PartialEq)]
pub enum VerifyError {
    #[error("invalid pubkey length (expected 96 bytes)")]
    InvalidPubkeyLength,

    #[error("invalid pubkey (failed to parse G2 point)")]
    InvalidPubkey,

    #[error("verification failed: {0}")]
    Malformed(String),

    #[error("signature does not match round {round}")]
    BadSignature { round: u64 },
}

/// Check a quicknet beacon against the network key and return its randomness,
/// `sha256(signature)`.
///
/// Quicknet is unchained, so the previous signature is always empty.
pub fn verify_beacon(pubkey: &[u8], round: u64, signature: &[u8]) -> Result<[u8; 32], VerifyError> {
    let pk_fixed: [u8; 96] = pubkey
        .try_into()
        .map_err(|_| VerifyError::InvalidPubkeyLength)?;
    let pk = G2PubkeyRfc::from_fixed(pk_fixed).map_err(|_| VerifyError::InvalidPubkey)?;

    let valid = pk
        .verify(round, &[], signature)
        .map_err(|e| VerifyError::Malformed(format!("{:?}", e)))?;
    if !valid {
        return Err(VerifyError::BadSignature { round });
    }

    Ok(Sha256::digest(signature).into())
}
