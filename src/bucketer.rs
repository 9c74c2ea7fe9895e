//! Bucketer implementation.
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Number of digest bytes used for bucketing. 6 bytes (the first 12 hex
/// characters of the digest) give 48 bits, which fits comfortably in a `u64`
/// while retaining the distribution of the full digest.
const DIGEST_PREFIX_BYTES: usize = 6;

/// Maps a (user, experiment, seed) triple into the bucket space.
///
/// Implementations must be pure: no clock, no randomness, no state. The same
/// inputs always produce the same bucket.
pub trait Bucketer {
    /// Compute the bucket for `user_id` in `experiment_id`.
    ///
    /// `seed` and `salt` are operational parameters: rotating either
    /// reshuffles every bucket assignment globally. Empty strings are valid
    /// inputs and still bucket deterministically.
    fn bucket(
        &self,
        user_id: &str,
        experiment_id: &str,
        seed: &str,
        salt: &str,
        bucket_space_size: u64,
    ) -> u64;
}

/// The default (and only) bucketer: HMAC-SHA256 keyed by the salt over
/// `"{user_id}|{experiment_id}|{seed}"`.
pub struct HmacSha256Bucketer;

impl Bucketer for HmacSha256Bucketer {
    fn bucket(
        &self,
        user_id: &str,
        experiment_id: &str,
        seed: &str,
        salt: &str,
        bucket_space_size: u64,
    ) -> u64 {
        let mut mac = Hmac::<Sha256>::new_from_slice(salt.as_bytes())
            .expect("HMAC-SHA256 accepts keys of any length");
        mac.update(user_id.as_bytes());
        mac.update(b"|");
        mac.update(experiment_id.as_bytes());
        mac.update(b"|");
        mac.update(seed.as_bytes());
        let digest = mac.finalize().into_bytes();

        let mut value: u64 = 0;
        for byte in &digest[..DIGEST_PREFIX_BYTES] {
            value = (value << 8) | u64::from(*byte);
        }
        value % bucket_space_size
    }
}
