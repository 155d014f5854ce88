use super::bn::BigNumber;
use crate::CredxResult;
use num::integer::Roots;

/// Decomposes `delta` into u0..u3 such that u0^2 + u1^2 + u2^2 + u3^2 = delta.
///
/// Predicate deltas fit in 64 bits so a descending search that fixes the
/// largest squares first is quick in practice.
pub fn four_squares(delta: i64) -> CredxResult<[BigNumber; 4]> {
    if delta < 0 {
        return Err(err_msg!("Cannot decompose a negative number: {}", delta));
    }
    let n = delta as u128;
    let mut a = n.sqrt();
    loop {
        let r1 = n - a * a;
        if r1 > 3 * a * a {
            break;
        }
        let mut b = r1.sqrt().min(a);
        loop {
            let r2 = r1 - b * b;
            if r2 > 2 * b * b {
                break;
            }
            let mut c = r2.sqrt().min(b);
            loop {
                let r3 = r2 - c * c;
                if r3 > c * c {
                    break;
                }
                let d = r3.sqrt();
                if d * d == r3 {
                    return Ok([
                        BigNumber::from(a),
                        BigNumber::from(b),
                        BigNumber::from(c),
                        BigNumber::from(d),
                    ]);
                }
                if c == 0 {
                    break;
                }
                c -= 1;
            }
            if b == 0 {
                break;
            }
            b -= 1;
        }
        if a == 0 {
            break;
        }
        a -= 1;
    }
    Err(err_msg!(Unexpected, "Four squares decomposition failed for {}", delta))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(delta: i64) {
        let u = four_squares(delta).unwrap();
        let sum = u
            .iter()
            .fold(BigNumber::zero(), |acc, x| acc + (x * x));
        assert_eq!(sum, BigNumber::from(delta), "delta = {}", delta);
    }

    #[test]
    fn decompose_small_and_large() {
        for delta in 0..200 {
            check(delta);
        }
        check(i64::from(i32::MAX));
        check(2 * i64::from(i32::MAX) + 1);
        check(1_000_000_007);
    }

    #[test]
    fn negative_fails() {
        assert!(four_squares(-1).is_err());
    }
}
