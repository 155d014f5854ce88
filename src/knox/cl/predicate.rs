use super::{
    CredentialPrimaryPublicKey, ITERATION, LARGE_ALPHATILDE, LARGE_UTILDE, LARGE_VPRIME,
    LARGE_VPRIME_TILDE,
};
use crate::knox::{bn::BigNumber, four_squares::four_squares};
use crate::CredxResult;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Comparison operator for a predicate
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum PredicateType {
    /// attribute >= value
    #[serde(rename = ">=")]
    GE,
    /// attribute > value
    #[serde(rename = ">")]
    GT,
    /// attribute <= value
    #[serde(rename = "<=")]
    LE,
    /// attribute < value
    #[serde(rename = "<")]
    LT,
}

impl PredicateType {
    fn sign(self) -> i64 {
        match self {
            Self::GE | Self::GT => 1,
            Self::LE | Self::LT => -1,
        }
    }

    /// The bound the difference is measured against
    fn delta_bound(self, value: i32) -> i64 {
        let v = i64::from(value);
        match self {
            Self::GE | Self::LE => v,
            Self::GT => v + 1,
            Self::LT => v - 1,
        }
    }

    /// The symbol used in presentation requests
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GE => ">=",
            Self::GT => ">",
            Self::LE => "<=",
            Self::LT => "<",
        }
    }
}

impl fmt::Display for PredicateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredicateType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">=" | "GE" => Ok(Self::GE),
            ">" | "GT" => Ok(Self::GT),
            "<=" | "LE" => Ok(Self::LE),
            "<" | "LT" => Ok(Self::LT),
            _ => Err(err_msg!("Unknown predicate type {:?}", s)),
        }
    }
}

/// A numeric comparison on a hidden attribute
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Predicate {
    pub(crate) attr_name: String,
    pub(crate) p_type: PredicateType,
    pub(crate) value: i32,
}

impl Predicate {
    /// Create a new predicate
    pub fn new(attr_name: impl Into<String>, p_type: PredicateType, value: i32) -> Self {
        Self {
            attr_name: attr_name.into(),
            p_type,
            value,
        }
    }

    /// The difference that has to be non-negative for the predicate to hold
    pub fn delta(&self, attr_value: i64) -> i64 {
        self.p_type.sign() * (attr_value - self.p_type.delta_bound(self.value))
    }

    /// Is the predicate satisfied by `attr_value`
    pub fn is_satisfied(&self, attr_value: i64) -> bool {
        self.delta(attr_value) >= 0
    }
}

const DELTA: usize = ITERATION;

/// Prover state for an inequality proof over one attribute.
///
/// The attribute's randomizer `m_tilde` must be the one used in the
/// signature proof so the two are bound to the same value.
pub struct PokPredicate {
    predicate: Predicate,
    u: [BigNumber; ITERATION],
    u_tilde: [BigNumber; ITERATION],
    // r_0..r_3 then r_delta
    r: [BigNumber; ITERATION + 1],
    r_tilde: [BigNumber; ITERATION + 1],
    alpha_tilde: BigNumber,
    t: [BigNumber; ITERATION + 1],
    tau: Vec<BigNumber>,
}

impl PokPredicate {
    /// Decompose the difference into four squares and commit to them
    pub fn commit(
        pk: &CredentialPrimaryPublicKey,
        predicate: &Predicate,
        attr_value: &BigNumber,
        m_tilde: &BigNumber,
    ) -> CredxResult<Self> {
        let value = attr_value
            .to_i64()
            .ok_or_else(|| err_msg!("Predicate attribute {} is not an integer", predicate.attr_name))?;
        let delta = predicate.delta(value);
        if delta < 0 {
            return Err(err_msg!("Predicate is not satisfied"));
        }
        let u = four_squares(delta)?;

        let r: [BigNumber; ITERATION + 1] = std::array::from_fn(|_| BigNumber::random(LARGE_VPRIME));
        let u_tilde: [BigNumber; ITERATION] = std::array::from_fn(|_| BigNumber::random(LARGE_UTILDE));
        let r_tilde: [BigNumber; ITERATION + 1] =
            std::array::from_fn(|_| BigNumber::random(LARGE_VPRIME_TILDE));
        let alpha_tilde = BigNumber::random(LARGE_ALPHATILDE);

        let mut t = Vec::with_capacity(ITERATION + 1);
        for i in 0..ITERATION {
            t.push(commit_z_s(pk, &u[i], &r[i])?);
        }
        t.push(commit_z_s(pk, &BigNumber::from(delta), &r[DELTA])?);

        let mut tau = Vec::with_capacity(ITERATION + 2);
        for i in 0..ITERATION {
            tau.push(commit_z_s(pk, &u_tilde[i], &r_tilde[i])?);
        }
        let sigma = BigNumber::from(predicate.p_type.sign());
        tau.push(commit_z_s(pk, &(&sigma * m_tilde), &r_tilde[DELTA])?);

        let mut q = pk.s.mod_exp(&alpha_tilde, &pk.n)?;
        for i in 0..ITERATION {
            q = q.mod_mul(&t[i].mod_exp(&u_tilde[i], &pk.n)?, &pk.n);
        }
        tau.push(q);

        let t: [BigNumber; ITERATION + 1] = t
            .try_into()
            .map_err(|_| err_msg!(Unexpected, "Invalid predicate commitment count"))?;

        Ok(Self {
            predicate: predicate.clone(),
            u,
            u_tilde,
            r,
            r_tilde,
            alpha_tilde,
            t,
            tau,
        })
    }

    /// Values that feed the Fiat-Shamir tau list
    pub fn tau_list(&self) -> Vec<BigNumber> {
        self.tau.clone()
    }

    /// Values that feed the Fiat-Shamir commitment list
    pub fn c_list(&self) -> Vec<BigNumber> {
        self.t.to_vec()
    }

    /// Compute the Schnorr responses. `m_cap` is the attribute response
    /// from the matching signature proof.
    pub fn finalize(self, c: &BigNumber, m_cap: &BigNumber) -> PrimaryPredicateInequalityProof {
        let mut alpha = self.r[DELTA].clone();
        for i in 0..ITERATION {
            alpha = alpha - &self.u[i] * &self.r[i];
        }
        let u = std::array::from_fn(|i| c * &self.u[i] + &self.u_tilde[i]);
        let r = std::array::from_fn(|i| c * &self.r[i] + &self.r_tilde[i]);
        PrimaryPredicateInequalityProof {
            u,
            r,
            mj: m_cap.clone(),
            alpha: c * &alpha + &self.alpha_tilde,
            t: self.t,
            predicate: self.predicate,
        }
    }
}

fn commit_z_s(
    pk: &CredentialPrimaryPublicKey,
    z_exp: &BigNumber,
    s_exp: &BigNumber,
) -> CredxResult<BigNumber> {
    Ok(pk
        .z
        .mod_exp(z_exp, &pk.n)?
        .mod_mul(&pk.s.mod_exp(s_exp, &pk.n)?, &pk.n))
}

/// Proof that a hidden attribute satisfies an inequality
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrimaryPredicateInequalityProof {
    pub(crate) u: [BigNumber; ITERATION],
    pub(crate) r: [BigNumber; ITERATION + 1],
    pub(crate) mj: BigNumber,
    pub(crate) alpha: BigNumber,
    pub(crate) t: [BigNumber; ITERATION + 1],
    pub(crate) predicate: Predicate,
}

impl PrimaryPredicateInequalityProof {
    /// The predicate being proven
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// The attribute response, must equal the signature proof's response
    pub fn m_cap(&self) -> &BigNumber {
        &self.mj
    }

    /// The commitment list entries
    pub fn c_list(&self) -> Vec<BigNumber> {
        self.t.to_vec()
    }

    /// Recompute the prover's tau values from the responses
    pub fn calc_tau(&self, pk: &CredentialPrimaryPublicKey, c: &BigNumber) -> CredxResult<Vec<BigNumber>> {
        let minus_c = -c;
        let mut tau = Vec::with_capacity(ITERATION + 2);
        for i in 0..ITERATION {
            let t = commit_z_s(pk, &self.u[i], &self.r[i])?;
            tau.push(t.mod_mul(&self.t[i].mod_exp(&minus_c, &pk.n)?, &pk.n));
        }

        let sigma = BigNumber::from(self.predicate.p_type.sign());
        let bound = BigNumber::from(self.predicate.p_type.delta_bound(self.predicate.value));
        let t_delta = commit_z_s(pk, &(&sigma * &self.mj), &self.r[DELTA])?;
        let adjusted = self.t[DELTA].mod_mul(&pk.z.mod_exp(&(&sigma * &bound), &pk.n)?, &pk.n);
        tau.push(t_delta.mod_mul(&adjusted.mod_exp(&minus_c, &pk.n)?, &pk.n));

        let mut q = pk.s.mod_exp(&self.alpha, &pk.n)?;
        for i in 0..ITERATION {
            q = q.mod_mul(&self.t[i].mod_exp(&self.u[i], &pk.n)?, &pk.n);
        }
        q = q.mod_mul(&self.t[DELTA].mod_exp(&minus_c, &pk.n)?, &pk.n);
        tau.push(q);
        Ok(tau)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_delta() {
        assert!(Predicate::new("age", PredicateType::GE, 18).is_satisfied(18));
        assert!(!Predicate::new("age", PredicateType::GT, 18).is_satisfied(18));
        assert!(Predicate::new("age", PredicateType::LE, 18).is_satisfied(18));
        assert!(!Predicate::new("age", PredicateType::LT, 18).is_satisfied(18));
        assert!(Predicate::new("age", PredicateType::LT, 18).is_satisfied(-5));
        assert_eq!(Predicate::new("age", PredicateType::LT, 18).delta(10), 7);
        assert_eq!("<=".parse::<PredicateType>().unwrap(), PredicateType::LE);
        assert!("=".parse::<PredicateType>().is_err());
        assert_eq!(serde_json::to_string(&PredicateType::GT).unwrap(), "\">\"");
    }

    #[test]
    fn inequality_proof_round() {
        let names = vec!["age".to_string()];
        let (pk, _, _) = CredentialPrimaryPublicKey::generate(&names, 512).unwrap();
        for (p_type, bound) in [
            (PredicateType::GE, 18),
            (PredicateType::GT, 27),
            (PredicateType::LE, 28),
            (PredicateType::LT, 60),
        ] {
            let predicate = Predicate::new("age", p_type, bound);
            let m = BigNumber::from(28u32);
            let m_tilde = BigNumber::random(592);
            let pok = PokPredicate::commit(&pk, &predicate, &m, &m_tilde).unwrap();
            let tau = pok.tau_list();
            let c = BigNumber::random(256);
            let m_cap = &c * &m + &m_tilde;
            let proof = pok.finalize(&c, &m_cap);
            assert_eq!(proof.calc_tau(&pk, &c).unwrap(), tau, "{}", p_type);
        }

        let predicate = Predicate::new("age", PredicateType::GE, 30);
        assert!(PokPredicate::commit(&pk, &predicate, &BigNumber::from(28u32), &BigNumber::one()).is_err());
    }
}
