use super::bn::BigNumber;
use crate::CredxResult;
use num::{bigint::RandBigInt, BigUint, Integer, One, Zero};
use std::sync::OnceLock;

/// Miller-Rabin rounds for a probable prime
const MILLER_RABIN_ROUNDS: usize = 40;
/// Primes below this bound are used for trial division
const SIEVE_LIMIT: u32 = 3000;
/// Give up after this many random candidates
const MAX_CANDIDATES: usize = 5_000_000;

fn small_primes() -> &'static [u32] {
    static PRIMES: OnceLock<Vec<u32>> = OnceLock::new();
    PRIMES.get_or_init(|| {
        let limit = SIEVE_LIMIT as usize;
        let mut composite = vec![false; limit];
        let mut primes = Vec::new();
        for i in 2..limit {
            if !composite[i] {
                primes.push(i as u32);
                let mut j = i * i;
                while j < limit {
                    composite[j] = true;
                    j += i;
                }
            }
        }
        primes
    })
}

/// Trial division. Returns false if `n` has a small factor other than itself.
fn passes_sieve(n: &BigUint) -> bool {
    for p in small_primes() {
        let p = *p;
        if (n % p).is_zero() {
            return *n == BigUint::from(p);
        }
    }
    true
}

fn miller_rabin(n: &BigUint, rounds: usize) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u32);
    if *n < two {
        return false;
    }
    if *n == two || *n == BigUint::from(3u32) {
        return true;
    }
    if n.is_even() {
        return false;
    }
    let n_minus_one = n - &one;
    let mut d = n_minus_one.clone();
    let mut s = 0usize;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }
    let mut rng = rand::thread_rng();
    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
            if x == one {
                return false;
            }
        }
        return false;
    }
    true
}

/// Probabilistic primality test
pub fn is_prime(n: &BigNumber) -> bool {
    match n.0.to_biguint() {
        Some(n) => passes_sieve(&n) && miller_rabin(&n, MILLER_RABIN_ROUNDS),
        None => false,
    }
}

/// Generate a random prime p with start <= p < end
pub fn generate_prime_in_range(start: &BigNumber, end: &BigNumber) -> CredxResult<BigNumber> {
    let width = end - start;
    for _ in 0..MAX_CANDIDATES {
        let mut candidate = start + &BigNumber::random_in_range(&width)?;
        if !candidate.is_odd() {
            candidate = candidate + BigNumber::one();
        }
        if candidate >= *end {
            continue;
        }
        if is_prime(&candidate) {
            return Ok(candidate);
        }
    }
    Err(err_msg!(Unexpected, "Unable to find a prime in range"))
}

/// Generate a safe prime p = 2q + 1 of `bits` length where q is also prime
pub fn generate_safe_prime(bits: usize) -> CredxResult<BigNumber> {
    if bits < 16 {
        return Err(err_msg!("Safe primes must be at least 16 bits"));
    }
    let mut rng = rand::thread_rng();
    let top = BigUint::one() << (bits - 2);
    for _ in 0..MAX_CANDIDATES {
        // q has bits - 1 bits with the top bit set, so p has exactly `bits`
        let mut q = rng.gen_biguint((bits - 2) as u64) | &top;
        q |= BigUint::one();
        let p = (&q << 1) + BigUint::one();
        if !passes_sieve(&q) || !passes_sieve(&p) {
            continue;
        }
        // cheap Fermat filter before the full tests
        if BigUint::from(2u32).modpow(&(&p - BigUint::one()), &p) != BigUint::one() {
            continue;
        }
        if miller_rabin(&q, MILLER_RABIN_ROUNDS) && miller_rabin(&p, MILLER_RABIN_ROUNDS) {
            return Ok(BigNumber::from(p));
        }
    }
    Err(err_msg!(Unexpected, "Unable to generate a safe prime"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_primes() {
        assert!(is_prime(&BigNumber::from(2u32)));
        assert!(is_prime(&BigNumber::from(2_147_483_647u32)));
        assert!(!is_prime(&BigNumber::from(561u32)));
        assert!(!is_prime(&BigNumber::from(1u32)));
        assert!(!is_prime(&BigNumber::from(-7i32)));
        // 2^127 - 1
        let m127 = BigNumber::pow2(127) - BigNumber::one();
        assert!(is_prime(&m127));
        assert!(!is_prime(&(BigNumber::pow2(128) + BigNumber::one())));
    }

    #[test]
    fn safe_prime_is_safe() {
        let p = generate_safe_prime(128).unwrap();
        assert_eq!(p.bits(), 128);
        assert!(is_prime(&p));
        let q = BigNumber((&p.0 - 1) >> 1);
        assert!(is_prime(&q));
    }

    #[test]
    fn prime_in_range() {
        let start = BigNumber::pow2(100);
        let end = &start + &BigNumber::pow2(40);
        let p = generate_prime_in_range(&start, &end).unwrap();
        assert!(p >= start && p < end);
        assert!(is_prime(&p));
    }
}
