/// Pairing based accumulators
pub mod accumulator;
/// Arbitrary precision integers
pub mod bn;
/// Camenisch-Lysyanskaya signatures
pub mod cl;
/// Lagrange four square decomposition
pub mod four_squares;
/// Prime number generation
pub mod primes;

use bn::BigNumber;
use merlin::Transcript;
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake256,
};

/// General purpose crypto operations
pub struct Knox {}

impl Knox {
    /// Compute a variable length hash
    pub fn xof_digest<X: Default + ExtendableOutput + Update>(input: &[u8], output: &mut [u8]) {
        let mut r = X::default().chain(input).finalize_xof();
        r.read(output);
    }

    /// Hash bytes to a 256-bit integer
    pub fn hash_to_bignumber(input: &[u8]) -> BigNumber {
        let mut okm = [0u8; 32];
        Self::xof_digest::<Shake256>(input, &mut okm);
        BigNumber::from_bytes(&okm)
    }

    /// Append a labelled list of integers to a transcript
    pub fn append_bignumbers(transcript: &mut Transcript, label: &'static [u8], values: &[&BigNumber]) {
        for v in values {
            transcript.append_message(label, &v.to_bytes());
        }
    }

    /// Squeeze a 256-bit Fiat-Shamir challenge out of a transcript
    pub fn challenge(transcript: &mut Transcript) -> BigNumber {
        let mut okm = [0u8; 32];
        transcript.challenge_bytes(b"challenge bytes", &mut okm);
        BigNumber::from_bytes(&okm)
    }
}
