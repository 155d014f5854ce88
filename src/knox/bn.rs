use crate::CredxResult;
use blsful::inner_types::Scalar;
use num::{
    bigint::{RandBigInt, RandomBits, Sign},
    BigInt, BigUint, Integer, One, Signed, Zero,
};
use rand::distributions::Distribution;
use serde::{
    de::{Error as DError, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};
use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::{Add, Mul, Neg, Sub},
};

/// The order of the BLS12-381 scalar field, big endian
const GROUP_ORDER: [u8; 32] = [
    0x73, 0xed, 0xa7, 0x53, 0x29, 0x9d, 0x7d, 0x48, 0x33, 0x39, 0xd8, 0x08, 0x09, 0xa1, 0xd8, 0x05,
    0x53, 0xbd, 0xa4, 0x02, 0xff, 0xfe, 0x5b, 0xfe, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x01,
];

/// An arbitrary precision signed integer used for the
/// RSA group arithmetic of CL signatures
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BigNumber(pub(crate) BigInt);

impl Debug for BigNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "BigNumber({})", self.0)
    }
}

impl Display for BigNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for BigNumber {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_dec())
    }
}

impl<'de> Deserialize<'de> for BigNumber {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct BigNumberVisitor;

        impl<'de> Visitor<'de> for BigNumberVisitor {
            type Value = BigNumber;

            fn expecting(&self, f: &mut Formatter) -> fmt::Result {
                write!(f, "a decimal string")
            }

            fn visit_str<E: DError>(self, v: &str) -> Result<Self::Value, E> {
                BigNumber::from_dec(v).map_err(|_| E::custom("invalid decimal integer"))
            }

            fn visit_u64<E: DError>(self, v: u64) -> Result<Self::Value, E> {
                Ok(BigNumber::from(v))
            }

            fn visit_i64<E: DError>(self, v: i64) -> Result<Self::Value, E> {
                Ok(BigNumber::from(v))
            }
        }

        d.deserialize_any(BigNumberVisitor)
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for BigNumber {
                fn from(v: $ty) -> Self {
                    Self(BigInt::from(v))
                }
            }
        )+
    };
}

impl_from_primitive!(u32, i32, u64, i64, u128);

impl From<BigInt> for BigNumber {
    fn from(v: BigInt) -> Self {
        Self(v)
    }
}

impl From<BigUint> for BigNumber {
    fn from(v: BigUint) -> Self {
        Self(BigInt::from(v))
    }
}

impl From<&Scalar> for BigNumber {
    fn from(s: &Scalar) -> Self {
        Self::from_bytes(&s.to_be_bytes())
    }
}

macro_rules! impl_binop {
    ($trait:ident, $method:ident) => {
        impl $trait<&BigNumber> for &BigNumber {
            type Output = BigNumber;

            fn $method(self, rhs: &BigNumber) -> BigNumber {
                BigNumber((&self.0).$method(&rhs.0))
            }
        }

        impl $trait<BigNumber> for BigNumber {
            type Output = BigNumber;

            fn $method(self, rhs: BigNumber) -> BigNumber {
                BigNumber(self.0.$method(rhs.0))
            }
        }

        impl $trait<&BigNumber> for BigNumber {
            type Output = BigNumber;

            fn $method(self, rhs: &BigNumber) -> BigNumber {
                BigNumber(self.0.$method(&rhs.0))
            }
        }
    };
}

impl_binop!(Add, add);
impl_binop!(Sub, sub);
impl_binop!(Mul, mul);

impl Neg for BigNumber {
    type Output = BigNumber;

    fn neg(self) -> BigNumber {
        BigNumber(-self.0)
    }
}

impl Neg for &BigNumber {
    type Output = BigNumber;

    fn neg(self) -> BigNumber {
        BigNumber(-&self.0)
    }
}

impl BigNumber {
    /// The value zero
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    /// The value one
    pub fn one() -> Self {
        Self(BigInt::one())
    }

    /// 2^bits
    pub fn pow2(bits: usize) -> Self {
        Self(BigInt::one() << bits)
    }

    /// Parse a base 10 string
    pub fn from_dec(value: &str) -> CredxResult<Self> {
        BigInt::parse_bytes(value.trim().as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| err_msg!("Invalid decimal number: {:?}", value))
    }

    /// Print as a base 10 string
    pub fn to_dec(&self) -> String {
        self.0.to_str_radix(10)
    }

    /// Interpret big endian bytes as an unsigned integer
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(BigInt::from_bytes_be(Sign::Plus, bytes))
    }

    /// Signed big endian representation, used when hashing
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_signed_bytes_be()
    }

    /// A uniformly random non-negative number less than 2^bits
    pub fn random(bits: usize) -> Self {
        let n: BigUint = RandomBits::new(bits as u64).sample(&mut rand::thread_rng());
        Self::from(n)
    }

    /// A uniformly random number in [0, upper)
    pub fn random_in_range(upper: &BigNumber) -> CredxResult<Self> {
        let upper = upper
            .0
            .to_biguint()
            .filter(|u| !u.is_zero())
            .ok_or_else(|| err_msg!(Unexpected, "Random range upper bound must be positive"))?;
        Ok(Self::from(rand::thread_rng().gen_biguint_below(&upper)))
    }

    /// The number of significant bits
    pub fn bits(&self) -> u64 {
        self.0.bits()
    }

    /// Is this value below zero
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Is this value zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Is this value odd
    pub fn is_odd(&self) -> bool {
        self.0.is_odd()
    }

    /// Convert to i64 if the value fits
    pub fn to_i64(&self) -> Option<i64> {
        i64::try_from(&self.0).ok()
    }

    /// Reduce into [0, modulus)
    pub fn modulus(&self, modulus: &BigNumber) -> Self {
        Self(self.0.mod_floor(&modulus.0))
    }

    /// (self * rhs) mod modulus
    pub fn mod_mul(&self, rhs: &BigNumber, modulus: &BigNumber) -> Self {
        Self((&self.0 * &rhs.0).mod_floor(&modulus.0))
    }

    /// self / rhs mod modulus
    pub fn mod_div(&self, rhs: &BigNumber, modulus: &BigNumber) -> CredxResult<Self> {
        Ok(self.mod_mul(&rhs.inverse(modulus)?, modulus))
    }

    /// self^exp mod modulus. Negative exponents invert the base first.
    pub fn mod_exp(&self, exp: &BigNumber, modulus: &BigNumber) -> CredxResult<Self> {
        if !modulus.0.is_positive() {
            return Err(err_msg!(Unexpected, "Modulus must be positive"));
        }
        if exp.0.is_negative() {
            let base = self.inverse(modulus)?;
            return Ok(Self(base.0.modpow(&(-&exp.0), &modulus.0)));
        }
        let base = self.0.mod_floor(&modulus.0);
        Ok(Self(base.modpow(&exp.0, &modulus.0)))
    }

    /// Multiplicative inverse modulo `modulus`
    pub fn inverse(&self, modulus: &BigNumber) -> CredxResult<Self> {
        let a = self.0.mod_floor(&modulus.0);
        let egcd = a.extended_gcd(&modulus.0);
        if !egcd.gcd.is_one() {
            return Err(err_msg!(Unexpected, "Value is not invertible"));
        }
        Ok(Self(egcd.x.mod_floor(&modulus.0)))
    }

    /// Reduce into the BLS12-381 scalar field
    pub fn to_scalar(&self) -> CredxResult<Scalar> {
        let order = BigInt::from_bytes_be(Sign::Plus, &GROUP_ORDER);
        let (_, bytes) = self.0.mod_floor(&order).to_bytes_be();
        let mut repr = [0u8; 32];
        repr[32 - bytes.len()..].copy_from_slice(&bytes);
        Option::<Scalar>::from(Scalar::from_be_bytes(&repr))
            .ok_or_else(|| err_msg!(Unexpected, "Invalid scalar"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mod_exp_negative_exponent() {
        let n = BigNumber::from(23u32);
        let a = BigNumber::from(5u32);
        let inv = a.mod_exp(&BigNumber::from(-1i32), &n).unwrap();
        assert_eq!(a.mod_mul(&inv, &n), BigNumber::one());
        let a3 = a.mod_exp(&BigNumber::from(3u32), &n).unwrap();
        let a_neg3 = a.mod_exp(&BigNumber::from(-3i32), &n).unwrap();
        assert_eq!(a3.mod_mul(&a_neg3, &n), BigNumber::one());
    }

    #[test]
    fn inverse_fails_for_shared_factor() {
        let n = BigNumber::from(21u32);
        assert!(BigNumber::from(7u32).inverse(&n).is_err());
        assert_eq!(
            BigNumber::from(-2i32).modulus(&n),
            BigNumber::from(19u32)
        );
    }

    #[test]
    fn serde_decimal_string() {
        let n = BigNumber::from_dec("-123456789012345678901234567890").unwrap();
        let s = serde_json::to_string(&n).unwrap();
        assert_eq!(s, "\"-123456789012345678901234567890\"");
        let m: BigNumber = serde_json::from_str(&s).unwrap();
        assert_eq!(n, m);
        assert!(BigNumber::from_dec("12a").is_err());
    }

    #[test]
    fn scalar_reduction() {
        let s = Scalar::from(42u64);
        let b = BigNumber::from(&s);
        assert_eq!(b, BigNumber::from(42u32));
        assert_eq!(b.to_scalar().unwrap(), s);
        let order = BigNumber::from_bytes(&GROUP_ORDER);
        let wrapped = &order + &BigNumber::from(42u32);
        assert_eq!(wrapped.to_scalar().unwrap(), s);
    }

    #[test]
    fn random_ranges() {
        let upper = BigNumber::from(1000u32);
        for _ in 0..50 {
            let r = BigNumber::random_in_range(&upper).unwrap();
            assert!(r < upper && !r.is_negative());
        }
        assert!(BigNumber::random(80).bits() <= 80);
        assert!(BigNumber::random_in_range(&BigNumber::zero()).is_err());
    }
}
