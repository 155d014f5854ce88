use super::{
    random_scalar, Accumulator, CredentialRevocationPublicKey, NonRevocationCredentialSignature,
    RevocationKeyPublic, Witness,
};
use crate::CredxResult;
use blsful::inner_types::*;
use serde::{Deserialize, Serialize};

/// The secrets of a non-revocation proof, or their randomizers, or their
/// Schnorr responses. All three share this shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NonRevocProofXList {
    pub(crate) rho: Scalar,
    pub(crate) r: Scalar,
    pub(crate) r_prime: Scalar,
    pub(crate) r_prime_prime: Scalar,
    pub(crate) r_prime_prime_prime: Scalar,
    pub(crate) o: Scalar,
    pub(crate) o_prime: Scalar,
    pub(crate) m: Scalar,
    pub(crate) m_prime: Scalar,
    pub(crate) t: Scalar,
    pub(crate) t_prime: Scalar,
    pub(crate) m2: Scalar,
    pub(crate) s: Scalar,
    pub(crate) c: Scalar,
}

impl NonRevocProofXList {
    fn random(m2: Scalar) -> Self {
        Self {
            rho: random_scalar(),
            r: random_scalar(),
            r_prime: random_scalar(),
            r_prime_prime: random_scalar(),
            r_prime_prime_prime: random_scalar(),
            o: random_scalar(),
            o_prime: random_scalar(),
            m: random_scalar(),
            m_prime: random_scalar(),
            t: random_scalar(),
            t_prime: random_scalar(),
            m2,
            s: random_scalar(),
            c: random_scalar(),
        }
    }

    /// tilde + ch * secret, field by field
    fn respond(&self, ch: &Scalar, secrets: &Self) -> Self {
        let f = |tilde: Scalar, secret: Scalar| tilde + ch * secret;
        Self {
            rho: f(self.rho, secrets.rho),
            r: f(self.r, secrets.r),
            r_prime: f(self.r_prime, secrets.r_prime),
            r_prime_prime: f(self.r_prime_prime, secrets.r_prime_prime),
            r_prime_prime_prime: f(self.r_prime_prime_prime, secrets.r_prime_prime_prime),
            o: f(self.o, secrets.o),
            o_prime: f(self.o_prime, secrets.o_prime),
            m: f(self.m, secrets.m),
            m_prime: f(self.m_prime, secrets.m_prime),
            t: f(self.t, secrets.t),
            t_prime: f(self.t_prime, secrets.t_prime),
            m2: f(self.m2, secrets.m2),
            s: f(self.s, secrets.s),
            c: f(self.c, secrets.c),
        }
    }

    /// The credential context response, linked to the primary proof
    pub fn m2(&self) -> &Scalar {
        &self.m2
    }
}

/// Blinded commitments to the signature, witness and index
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NonRevocProofCList {
    pub(crate) e: G1Projective,
    pub(crate) d: G1Projective,
    pub(crate) a: G1Projective,
    pub(crate) g: G1Projective,
    pub(crate) w: G2Projective,
    pub(crate) s: G2Projective,
    pub(crate) u: G2Projective,
}

impl NonRevocProofCList {
    /// Encoded commitments for the challenge and the aggregated commitment list
    pub fn as_bytes(&self) -> Vec<Vec<u8>> {
        vec![
            self.e.to_affine().to_compressed().to_vec(),
            self.d.to_affine().to_compressed().to_vec(),
            self.a.to_affine().to_compressed().to_vec(),
            self.g.to_affine().to_compressed().to_vec(),
            self.w.to_affine().to_compressed().to_vec(),
            self.s.to_affine().to_compressed().to_vec(),
            self.u.to_affine().to_compressed().to_vec(),
        ]
    }
}

/// First round commitments of the non-revocation proof
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NonRevocProofTauList {
    t1: G1Projective,
    t2: G1Projective,
    t3: Gt,
    t4: Gt,
    t5: G1Projective,
    t6: G1Projective,
    t7: Gt,
    t8: Gt,
}

impl NonRevocProofTauList {
    /// Encoded values for the Fiat-Shamir transcript
    pub fn as_bytes(&self) -> Vec<Vec<u8>> {
        vec![
            self.t1.to_affine().to_compressed().to_vec(),
            self.t2.to_affine().to_compressed().to_vec(),
            self.t3.to_bytes().as_ref().to_vec(),
            self.t4.to_bytes().as_ref().to_vec(),
            self.t5.to_affine().to_compressed().to_vec(),
            self.t6.to_affine().to_compressed().to_vec(),
            self.t7.to_bytes().as_ref().to_vec(),
            self.t8.to_bytes().as_ref().to_vec(),
        ]
    }

    /// Evaluate the proof relations at `x`. The relations are linear in `x`
    /// so evaluating at responses gives tau + ch * (value at the secrets).
    fn calc(
        pk: &CredentialRevocationPublicKey,
        accumulator: &Accumulator,
        x: &NonRevocProofXList,
        c_list: &NonRevocProofCList,
    ) -> Self {
        let pair = |a: G1Projective, b: G2Projective| pairing(&a.to_affine(), &b.to_affine());

        let t1 = pk.h * x.rho + pk.htilde * x.o;
        let t2 = c_list.e * x.c - pk.h * x.m - pk.htilde * x.t;
        let t3 = pair(
            c_list.a * x.c + pk.htilde * (x.r - x.m) - pk.h1 * x.m2 - pk.h2 * x.s,
            pk.h_cap,
        ) - pair(pk.htilde * x.rho, pk.y);
        let t4 = pair(pk.htilde * x.r, accumulator.0) - pair(pk.g * x.r_prime, pk.h_cap);
        let t5 = pk.g * x.r + pk.htilde * x.o_prime;
        let t6 = c_list.d * x.r_prime_prime - pk.g * x.m_prime - pk.htilde * x.t_prime;
        let t7 = pair(
            (pk.pk + c_list.g) * x.r_prime_prime - pk.htilde * x.m_prime,
            pk.h_cap,
        ) + pair(pk.htilde * x.r, c_list.s);
        let t8 = pair(pk.htilde * x.r, pk.u) - pair(pk.g * x.r_prime_prime_prime, pk.h_cap);

        Self {
            t1,
            t2,
            t3,
            t4,
            t5,
            t6,
            t7,
            t8,
        }
    }

    /// The relations evaluated at the prover's secrets, computable by the
    /// verifier from public values
    fn expected(
        pk: &CredentialRevocationPublicKey,
        key: &RevocationKeyPublic,
        accumulator: &Accumulator,
        c_list: &NonRevocProofCList,
    ) -> Self {
        let pair = |a: G1Projective, b: G2Projective| pairing(&a.to_affine(), &b.to_affine());

        Self {
            t1: c_list.e,
            t2: G1Projective::IDENTITY,
            t3: pair(pk.h0 + c_list.g, pk.h_cap) - pair(c_list.a, pk.y),
            t4: pair(c_list.g, accumulator.0) - pair(pk.g, c_list.w) - key.z,
            t5: c_list.d,
            t6: G1Projective::IDENTITY,
            t7: pair(pk.pk + c_list.g, c_list.s) - pair(pk.g, pk.g_dash),
            t8: pair(c_list.g, pk.u) - pair(pk.g, c_list.u),
        }
    }

    fn minus_scaled(self, other: &Self, ch: &Scalar) -> Self {
        Self {
            t1: self.t1 - other.t1 * ch,
            t2: self.t2 - other.t2 * ch,
            t3: self.t3 - other.t3 * ch,
            t4: self.t4 - other.t4 * ch,
            t5: self.t5 - other.t5 * ch,
            t6: self.t6 - other.t6 * ch,
            t7: self.t7 - other.t7 * ch,
            t8: self.t8 - other.t8 * ch,
        }
    }
}

/// Prover state for a non-revocation proof
pub struct PokNonRevocation {
    secrets: NonRevocProofXList,
    tildes: NonRevocProofXList,
    c_list: NonRevocProofCList,
    tau_list: NonRevocProofTauList,
}

impl PokNonRevocation {
    /// Blind the signature and witness and commit to the randomizers.
    /// `m2_tilde` must also be used for the credential context in the
    /// primary proof.
    pub fn commit(
        pk: &CredentialRevocationPublicKey,
        accumulator: &Accumulator,
        signature: &NonRevocationCredentialSignature,
        witness: &Witness,
        m2_tilde: Scalar,
    ) -> Self {
        let rho = random_scalar();
        let r = random_scalar();
        let r_prime = random_scalar();
        let r_prime_prime = random_scalar();
        let r_prime_prime_prime = random_scalar();
        let o = random_scalar();
        let o_prime = random_scalar();

        let secrets = NonRevocProofXList {
            rho,
            r,
            r_prime,
            r_prime_prime,
            r_prime_prime_prime,
            o,
            o_prime,
            m: rho * signature.c,
            m_prime: r * r_prime_prime,
            t: o * signature.c,
            t_prime: o_prime * r_prime_prime,
            m2: signature.m2,
            s: signature.vr_prime_prime,
            c: signature.c,
        };

        let c_list = NonRevocProofCList {
            e: pk.h * rho + pk.htilde * o,
            d: pk.g * r + pk.htilde * o_prime,
            a: signature.sigma + pk.htilde * rho,
            g: signature.g_i + pk.htilde * r,
            w: witness.omega + pk.h_cap * r_prime,
            s: signature.witness_signature.sigma_i + pk.h_cap * r_prime_prime,
            u: signature.witness_signature.u_i + pk.h_cap * r_prime_prime_prime,
        };

        let tildes = NonRevocProofXList::random(m2_tilde);
        let tau_list = NonRevocProofTauList::calc(pk, accumulator, &tildes, &c_list);

        Self {
            secrets,
            tildes,
            c_list,
            tau_list,
        }
    }

    /// Values for the Fiat-Shamir tau list
    pub fn tau_list(&self) -> Vec<Vec<u8>> {
        self.tau_list.as_bytes()
    }

    /// Values for the Fiat-Shamir commitment list
    pub fn c_list(&self) -> Vec<Vec<u8>> {
        self.c_list.as_bytes()
    }

    /// Compute the responses for challenge `ch`
    pub fn finalize(self, ch: &Scalar) -> NonRevocProof {
        NonRevocProof {
            x_list: self.tildes.respond(ch, &self.secrets),
            c_list: self.c_list,
        }
    }
}

/// Proof that a credential's index is a member of the accumulator
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NonRevocProof {
    pub(crate) x_list: NonRevocProofXList,
    pub(crate) c_list: NonRevocProofCList,
}

impl NonRevocProof {
    /// The commitment list entries
    pub fn c_list(&self) -> Vec<Vec<u8>> {
        self.c_list.as_bytes()
    }

    /// The response for the credential context
    pub fn m2(&self) -> &Scalar {
        self.x_list.m2()
    }

    /// Recompute the prover's tau values against an accumulator value
    pub fn calc_tau(
        &self,
        pk: &CredentialRevocationPublicKey,
        key: &RevocationKeyPublic,
        accumulator: &Accumulator,
        ch: &Scalar,
    ) -> CredxResult<Vec<Vec<u8>>> {
        if accumulator.is_empty() {
            return Err(err_msg!(InvalidState, "Accumulator is empty"));
        }
        let calc = NonRevocProofTauList::calc(pk, accumulator, &self.x_list, &self.c_list);
        let expected = NonRevocProofTauList::expected(pk, key, accumulator, &self.c_list);
        Ok(calc.minus_scaled(&expected, ch).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Accumulator, RevocationKeyPublic, TailsGenerator, Tail};
    use super::*;
    use std::collections::BTreeSet;

    struct Tails(Vec<Tail>);

    impl super::super::RevocationTailsAccessor for Tails {
        fn access_tail(&self, tail_id: u32) -> CredxResult<Tail> {
            self.0
                .get(tail_id as usize)
                .copied()
                .ok_or_else(|| err_msg!("missing tail"))
        }
    }

    #[test]
    fn non_revocation_proof() {
        let max = 5;
        let (pk, sk) = CredentialRevocationPublicKey::generate();
        let (key_pub, key) = RevocationKeyPublic::generate(&pk, max);
        let tails = Tails(TailsGenerator::new(pk.g_dash, &key, max).collect());
        let acc = Accumulator::full(&pk.g_dash, &key, max);

        let vr_prime = random_scalar();
        let ur = pk.h2 * vr_prime;
        let m2 = random_scalar();
        let mut sig = NonRevocationCredentialSignature::new(&pk, &sk, &key, 2, m2, &ur).unwrap();
        sig.unblind(&vr_prime);
        sig.verify(&pk).unwrap();

        let issued = (1..=max).collect::<BTreeSet<_>>();
        let witness = Witness::new(2, max, &issued, &tails).unwrap();
        assert!(sig.verify_witness(&pk, &key_pub, &acc, &witness));

        let m2_tilde = random_scalar();
        let pok = PokNonRevocation::commit(&pk, &acc, &sig, &witness, m2_tilde);
        let tau = pok.tau_list();
        let ch = random_scalar();
        let proof = pok.finalize(&ch);
        assert_eq!(proof.calc_tau(&pk, &key_pub, &acc, &ch).unwrap(), tau);
        assert_eq!(*proof.m2(), m2_tilde + ch * m2);

        // revoking index 2 breaks the relation
        let mut revoked_acc = acc;
        revoked_acc.sub(&tails.0[Accumulator::tail_index(max, 2) as usize]);
        assert_ne!(proof.calc_tau(&pk, &key_pub, &revoked_acc, &ch).unwrap(), tau);

        // a witness updated for another revocation still verifies
        let mut acc3 = acc;
        acc3.sub(&tails.0[Accumulator::tail_index(max, 3) as usize]);
        let mut w = witness;
        w.update(2, max, &BTreeSet::new(), &[3u32].into_iter().collect::<BTreeSet<_>>(), &tails)
            .unwrap();
        assert!(sig.verify_witness(&pk, &key_pub, &acc3, &w));
        assert!(!sig.verify_witness(&pk, &key_pub, &acc3, &witness));
    }
}
