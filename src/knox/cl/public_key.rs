use super::{gen_x, random_qr, CredentialKeyCorrectnessProof, CredentialPrimaryPrivateKey, MASTER_SECRET};
use crate::knox::{bn::BigNumber, primes::generate_safe_prime};
use crate::CredxResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The issuer's primary public key.
///
/// `r` holds one base per signed attribute plus one for the master secret,
/// `rctxt` is the base for the credential context.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialPrimaryPublicKey {
    pub(crate) n: BigNumber,
    pub(crate) s: BigNumber,
    pub(crate) r: BTreeMap<String, BigNumber>,
    pub(crate) rctxt: BigNumber,
    pub(crate) z: BigNumber,
}

impl CredentialPrimaryPublicKey {
    /// Generate a new primary key pair for the attribute names along with a
    /// proof that every base lies in the group generated by `s`
    pub fn generate<'a>(
        attribute_names: impl IntoIterator<Item = &'a String>,
        modulus_bits: usize,
    ) -> CredxResult<(Self, CredentialPrimaryPrivateKey, CredentialKeyCorrectnessProof)> {
        if modulus_bits < 512 || modulus_bits % 2 != 0 {
            return Err(err_msg!("Invalid modulus size {}", modulus_bits));
        }
        log::trace!("generating {} bit safe primes", modulus_bits / 2);
        let p_safe = generate_safe_prime(modulus_bits / 2)?;
        let mut q_safe = generate_safe_prime(modulus_bits / 2)?;
        while q_safe == p_safe {
            q_safe = generate_safe_prime(modulus_bits / 2)?;
        }

        let p = BigNumber((&p_safe.0 - 1) >> 1);
        let q = BigNumber((&q_safe.0 - 1) >> 1);
        let n = &p_safe * &q_safe;
        let s = random_qr(&n)?;

        let xz = gen_x(&p, &q)?;
        let z = s.mod_exp(&xz, &n)?;

        let mut xr = BTreeMap::new();
        let mut r = BTreeMap::new();
        for name in attribute_names
            .into_iter()
            .map(String::as_str)
            .chain(std::iter::once(MASTER_SECRET))
        {
            let x = gen_x(&p, &q)?;
            r.insert(name.to_string(), s.mod_exp(&x, &n)?);
            xr.insert(name.to_string(), x);
        }

        let xrctxt = gen_x(&p, &q)?;
        let rctxt = s.mod_exp(&xrctxt, &n)?;

        let public_key = Self { n, s, r, rctxt, z };
        let proof = CredentialKeyCorrectnessProof::new(&public_key, &xz, &xr, &xrctxt)?;
        Ok((public_key, CredentialPrimaryPrivateKey { p, q }, proof))
    }

    /// The RSA modulus
    pub fn modulus(&self) -> &BigNumber {
        &self.n
    }

    /// The attribute names this key signs, excluding the master secret
    pub fn attribute_names(&self) -> impl Iterator<Item = &String> {
        self.r.keys().filter(|k| k.as_str() != MASTER_SECRET)
    }

    /// The base for an attribute
    pub(crate) fn r_for(&self, name: &str) -> CredxResult<&BigNumber> {
        self.r
            .get(name)
            .ok_or_else(|| err_msg!("Public key has no base for attribute {}", name))
    }
}
