use super::{scalar_pow, RevocationKeyPrivate};
use crate::CredxResult;
use blsful::inner_types::*;
use serde::{Deserialize, Serialize};

/// The accumulator value, a sum of the tails of every member index
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Accumulator(pub(crate) G2Projective);

/// A precomputed g' * gamma^i
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tail(pub(crate) G2Projective);

impl Tail {
    /// Size of a compressed tail
    pub const BYTES: usize = 96;

    /// Compute the tail at `index` directly from the trapdoor
    pub(crate) fn new(index: u32, g_dash: &G2Projective, gamma: &Scalar) -> Self {
        Self(g_dash * scalar_pow(gamma, u64::from(index)))
    }

    /// Compressed encoding
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        self.0.to_affine().to_compressed()
    }

    /// Decode a compressed tail
    pub fn from_bytes(bytes: &[u8]) -> CredxResult<Self> {
        let bytes = <[u8; Self::BYTES]>::try_from(bytes)
            .map_err(|_| err_msg!("Invalid tail length {}", bytes.len()))?;
        Option::<G2Affine>::from(G2Affine::from_compressed(&bytes))
            .map(|p| Self(G2Projective::from(p)))
            .ok_or_else(|| err_msg!(InvalidState, "Invalid tail encoding"))
    }
}

/// Access to the tails of a registry, keyed by tail index
pub trait RevocationTailsAccessor {
    /// Fetch the tail at `tail_id`
    fn access_tail(&self, tail_id: u32) -> CredxResult<Tail>;
}

/// Generates every tail of a registry in index order.
/// Index `L + 1` is never published and is replaced by the identity.
#[derive(Debug, Clone)]
pub struct TailsGenerator {
    size: u32,
    current_index: u32,
    max_cred_num: u32,
    g_dash: G2Projective,
    gamma: Scalar,
    gamma_pow: Scalar,
}

impl TailsGenerator {
    /// Create a generator for a registry with `max_cred_num` entries
    pub(crate) fn new(g_dash: G2Projective, key: &RevocationKeyPrivate, max_cred_num: u32) -> Self {
        Self {
            size: 2 * max_cred_num + 1,
            current_index: 0,
            max_cred_num,
            g_dash,
            gamma: key.gamma,
            gamma_pow: Scalar::ONE,
        }
    }

    /// Total number of tails
    pub fn count(&self) -> u32 {
        self.size
    }
}

impl Iterator for TailsGenerator {
    type Item = Tail;

    fn next(&mut self) -> Option<Tail> {
        if self.current_index >= self.size {
            return None;
        }
        let tail = if self.current_index == self.max_cred_num + 1 {
            Tail(G2Projective::IDENTITY)
        } else {
            Tail(self.g_dash * self.gamma_pow)
        };
        self.gamma_pow *= self.gamma;
        self.current_index += 1;
        Some(tail)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.size - self.current_index) as usize;
        (remaining, Some(remaining))
    }
}

impl Accumulator {
    /// The tail index accumulated for credential `index`
    pub fn tail_index(max_cred_num: u32, index: u32) -> u32 {
        max_cred_num + 1 - index
    }

    /// An accumulator already holding every index of the registry
    pub(crate) fn full(g_dash: &G2Projective, key: &RevocationKeyPrivate, max_cred_num: u32) -> Self {
        let mut acc = Self::default();
        for index in 1..=max_cred_num {
            acc.add(&Tail::new(
                Self::tail_index(max_cred_num, index),
                g_dash,
                &key.gamma,
            ));
        }
        acc
    }

    /// Add a member's tail
    pub fn add(&mut self, tail: &Tail) {
        self.0 += tail.0;
    }

    /// Remove a member's tail
    pub fn sub(&mut self, tail: &Tail) {
        self.0 -= tail.0;
    }

    /// Is this the empty accumulator
    pub fn is_empty(&self) -> bool {
        bool::from(self.0.is_identity())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{CredentialRevocationPublicKey, RevocationKeyPublic};
    use super::*;

    #[test]
    fn generator_matches_direct_tails() {
        let (pk, _) = CredentialRevocationPublicKey::generate();
        let (_, key) = RevocationKeyPublic::generate(&pk, 4);
        let tails = TailsGenerator::new(pk.g_dash, &key, 4).collect::<Vec<_>>();
        assert_eq!(tails.len(), 9);
        for (i, tail) in tails.iter().enumerate() {
            if i == 5 {
                assert_eq!(tail.0, G2Projective::IDENTITY);
            } else {
                assert_eq!(*tail, Tail::new(i as u32, &pk.g_dash, &key.gamma));
            }
            assert_eq!(Tail::from_bytes(&tail.to_bytes()).unwrap(), *tail);
        }

        let mut acc = Accumulator::default();
        for i in 1..=4 {
            acc.add(&tails[Accumulator::tail_index(4, i) as usize]);
        }
        assert_eq!(acc, Accumulator::full(&pk.g_dash, &key, 4));
        assert!(Tail::from_bytes(&[0u8; 10]).is_err());
    }
}
