use crate::knox::{
    accumulator::cks::NonRevocProof,
    bn::BigNumber,
    cl::{PrimaryEqualProof, PrimaryPredicateInequalityProof},
};
use serde::{Deserialize, Serialize};

/// The CL part of a sub-proof
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrimaryProof {
    /// Signature knowledge with revealed attributes
    pub eq_proof: PrimaryEqualProof,
    /// One inequality proof per predicate
    #[serde(default)]
    pub ge_proofs: Vec<PrimaryPredicateInequalityProof>,
}

/// Everything proven about one credential
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubProof {
    /// The CL proofs
    pub primary_proof: PrimaryProof,
    /// Accumulator membership, when non-revocation was asked for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoc_proof: Option<NonRevocProof>,
}

/// The Fiat-Shamir challenge shared by all sub-proofs and the
/// commitments it was computed over
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AggregatedProof {
    /// The challenge
    pub c_hash: BigNumber,
    /// Every sub-proof's commitments in order
    pub c_list: Vec<Vec<u8>>,
}

/// The cryptographic part of a presentation
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Proof {
    /// One sub-proof per credential used
    pub proofs: Vec<SubProof>,
    /// The shared challenge
    pub aggregated_proof: AggregatedProof,
}

impl SubProof {
    /// Commitment values in transcript order: non-revocation first, then
    /// the equality proof, then each predicate
    pub(crate) fn c_list(&self) -> Vec<Vec<u8>> {
        let mut c_list = self
            .non_revoc_proof
            .as_ref()
            .map(|p| p.c_list())
            .unwrap_or_default();
        c_list.extend(
            self.primary_proof
                .eq_proof
                .c_list()
                .iter()
                .map(BigNumber::to_bytes),
        );
        for ge in &self.primary_proof.ge_proofs {
            c_list.extend(ge.c_list().iter().map(BigNumber::to_bytes));
        }
        c_list
    }
}
