use cosmwasm_std::Uint128;
use sha2::{Digest, Sha256};

/// Derive the random word delivered for one job from a beacon's randomness.
///
/// `word = uint128_be( sha256( 0x02 || randomness || requester_bytes || job_id_u64_be )[0..16] )`
///
/// Every job served by the same beacon gets an independent word. The requester
/// is the raw bech32 string bytes of the requesting contract.
pub fn derive_random_word(randomness: &[u8], requester: &str, job_id: u64) -> Uint128 {
    let mut hasher = Sha256::new();
    hasher.update([0x02]);
    hasher.update(randomness);
    hasher.update(requester.as_bytes());
    hasher.update(job_id.to_be_bytes());
    let digest: [u8; 32] = hasher.finalize().into();

    let mut word = [0u8; 16];
    word.copy_from_slice(&digest[0..16]);
    Uint128::new(u128::from_be_bytes(word))
}
