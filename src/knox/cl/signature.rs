use super::{
    CredentialPrimaryPrivateKey, CredentialPrimaryPublicKey, LARGE_E_END_RANGE, LARGE_E_START,
    LARGE_VPRIME_PRIME, MASTER_SECRET,
};
use crate::knox::{
    bn::BigNumber,
    primes::{generate_prime_in_range, is_prime},
    Knox,
};
use crate::CredxResult;
use merlin::Transcript;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A CL signature over the attribute values and the credential context `m_2`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrimaryCredentialSignature {
    pub(crate) m_2: BigNumber,
    pub(crate) a: BigNumber,
    pub(crate) e: BigNumber,
    pub(crate) v: BigNumber,
}

/// Proves `a` was computed with the issuer's secret key for the `q`
/// implied by the request
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SignatureCorrectnessProof {
    pub(crate) se: BigNumber,
    pub(crate) c: BigNumber,
}

/// Computes z / (s^v * rctxt^m2 * u * prod r_i^m_i)
fn calc_q(
    pk: &CredentialPrimaryPublicKey,
    v: &BigNumber,
    m_2: &BigNumber,
    u: &BigNumber,
    values: &BTreeMap<String, BigNumber>,
) -> CredxResult<BigNumber> {
    let mut rx = pk.s.mod_exp(v, &pk.n)?;
    rx = rx.mod_mul(u, &pk.n);
    rx = rx.mod_mul(&pk.rctxt.mod_exp(m_2, &pk.n)?, &pk.n);
    for (name, value) in values {
        rx = rx.mod_mul(&pk.r_for(name)?.mod_exp(value, &pk.n)?, &pk.n);
    }
    pk.z.mod_div(&rx, &pk.n)
}

fn correctness_challenge(
    q: &BigNumber,
    a: &BigNumber,
    a_cap: &BigNumber,
    nonce: &BigNumber,
) -> BigNumber {
    let mut transcript = Transcript::new(b"signature correctness proof");
    Knox::append_bignumbers(&mut transcript, b"q", &[q]);
    Knox::append_bignumbers(&mut transcript, b"a", &[a]);
    Knox::append_bignumbers(&mut transcript, b"a_cap", &[a_cap]);
    Knox::append_bignumbers(&mut transcript, b"nonce", &[nonce]);
    Knox::challenge(&mut transcript)
}

impl PrimaryCredentialSignature {
    /// Issuer side: sign the known attribute values and the blinded
    /// master secret commitment `u`
    pub fn new(
        pk: &CredentialPrimaryPublicKey,
        sk: &CredentialPrimaryPrivateKey,
        m_2: &BigNumber,
        values: &BTreeMap<String, BigNumber>,
        u: &BigNumber,
        nonce: &BigNumber,
    ) -> CredxResult<(Self, SignatureCorrectnessProof)> {
        let expected = pk.attribute_names().collect::<Vec<_>>();
        if !values.keys().eq(expected.iter().copied()) {
            return Err(err_msg!(
                "Credential values do not match the credential definition attributes"
            ));
        }

        let v_prime_prime =
            BigNumber::random(LARGE_VPRIME_PRIME - 1) + BigNumber::pow2(LARGE_VPRIME_PRIME - 1);
        let e_start = BigNumber::pow2(LARGE_E_START);
        let e_end = &e_start + &BigNumber::pow2(LARGE_E_END_RANGE);
        let e = generate_prime_in_range(&e_start, &e_end)?;

        let q = calc_q(pk, &v_prime_prime, m_2, u, values)?;
        let order = sk.order();
        let e_inverse = e.inverse(&order)?;
        let a = q.mod_exp(&e_inverse, &pk.n)?;

        let r = BigNumber::random_in_range(&order)?;
        let a_cap = q.mod_exp(&r, &pk.n)?;
        let c = correctness_challenge(&q, &a, &a_cap, nonce);
        let se = (r - &c * &e_inverse).modulus(&order);

        Ok((
            Self {
                m_2: m_2.clone(),
                a,
                e,
                v: v_prime_prime,
            },
            SignatureCorrectnessProof { se, c },
        ))
    }

    /// Holder side: fold in the blinding factor v'
    pub(crate) fn unblind(&mut self, v_prime: &BigNumber) {
        self.v = &self.v + v_prime;
    }

    /// Holder side: check an unblinded signature over the values (which
    /// include the master secret) and the issuer's correctness proof
    pub fn verify(
        &self,
        proof: &SignatureCorrectnessProof,
        pk: &CredentialPrimaryPublicKey,
        values: &BTreeMap<String, BigNumber>,
        nonce: &BigNumber,
    ) -> CredxResult<()> {
        if !values.contains_key(MASTER_SECRET) {
            return Err(err_msg!(Unexpected, "Master secret is required to verify a signature"));
        }
        let q = calc_q(pk, &self.v, &self.m_2, &BigNumber::one(), values)?;
        if self.a.mod_exp(&self.e, &pk.n)? != q {
            return Err(err_msg!(InvalidState, "Invalid credential signature"));
        }

        let e_start = BigNumber::pow2(LARGE_E_START);
        let e_end = &e_start + &BigNumber::pow2(LARGE_E_END_RANGE);
        if !is_prime(&self.e) || self.e < e_start || self.e > e_end {
            return Err(err_msg!(InvalidState, "Invalid signature exponent"));
        }

        let exp = &proof.c + &(&proof.se * &self.e);
        let a_cap = self.a.mod_exp(&exp, &pk.n)?;
        if correctness_challenge(&q, &self.a, &a_cap, nonce) != proof.c {
            return Err(err_msg!(InvalidState, "Invalid signature correctness proof"));
        }
        Ok(())
    }
}
