//! Arithmetic in GF(2^255 - 19)
//!
//! Elements are stored as five 51-bit limbs. Every public operation returns a
//! weakly reduced element (each limb below 2^52), which keeps all products in
//! [`FieldElement::mul`] inside a `u128` accumulator.

use std::ops::{Add, Mul, Neg, Sub};

const LOW_51_BIT_MASK: u64 = (1u64 << 51) - 1;

/// 16 * p, limb-wise. Added before subtracting so limbs never underflow.
const SIXTEEN_P: [u64; 5] = [
    36028797018963664,
    36028797018963952,
    36028797018963952,
    36028797018963952,
    36028797018963952,
];

/// Little-endian exponent with every byte 0xff except the first and last.
const fn exponent(low: u8, high: u8) -> [u8; 32] {
    let mut e = [0xffu8; 32];
    e[0] = low;
    e[31] = high;
    e
}

/// p - 2, for inversion via Fermat's little theorem
const P_MINUS_2: [u8; 32] = exponent(0xeb, 0x7f);

/// (p - 5) / 8 = 2^252 - 3
const P_MINUS_5_OVER_8: [u8; 32] = exponent(0xfd, 0x0f);

/// (p - 1) / 4 = 2^253 - 5
const P_MINUS_1_OVER_4: [u8; 32] = exponent(0xfb, 0x1f);

/// An element of GF(2^255 - 19)
#[derive(Clone, Copy, Debug)]
pub struct FieldElement(pub(crate) [u64; 5]);

impl FieldElement {
    pub const ZERO: FieldElement = FieldElement([0, 0, 0, 0, 0]);
    pub const ONE: FieldElement = FieldElement([1, 0, 0, 0, 0]);

    /// Build an element from a small integer (below 2^51)
    pub const fn from_u64(n: u64) -> Self {
        FieldElement([n & LOW_51_BIT_MASK, n >> 51, 0, 0, 0])
    }

    /// Decode 32 little-endian bytes, ignoring the top bit.
    ///
    /// Values in [p, 2^255) are accepted and reduced; callers that need a
    /// canonical encoding compare against [`FieldElement::to_bytes`].
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        let load8 = |offset: usize| -> u64 {
            bytes[offset..offset + 8]
                .iter()
                .enumerate()
                .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (8 * i)))
        };

        FieldElement([
            load8(0) & LOW_51_BIT_MASK,
            (load8(6) >> 3) & LOW_51_BIT_MASK,
            (load8(12) >> 6) & LOW_51_BIT_MASK,
            (load8(19) >> 1) & LOW_51_BIT_MASK,
            (load8(24) >> 12) & LOW_51_BIT_MASK,
        ])
    }

    /// Canonical 32-byte little-endian encoding (fully reduced mod p)
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut limbs = Self::reduce(self.0).0;

        // q = 1 iff limbs >= p. Adding 19q and dropping bit 255 subtracts qp.
        let mut q = (limbs[0] + 19) >> 51;
        q = (limbs[1] + q) >> 51;
        q = (limbs[2] + q) >> 51;
        q = (limbs[3] + q) >> 51;
        q = (limbs[4] + q) >> 51;

        limbs[0] += 19 * q;
        limbs[1] += limbs[0] >> 51;
        limbs[0] &= LOW_51_BIT_MASK;
        limbs[2] += limbs[1] >> 51;
        limbs[1] &= LOW_51_BIT_MASK;
        limbs[3] += limbs[2] >> 51;
        limbs[2] &= LOW_51_BIT_MASK;
        limbs[4] += limbs[3] >> 51;
        limbs[3] &= LOW_51_BIT_MASK;
        limbs[4] &= LOW_51_BIT_MASK;

        let mut out = [0u8; 32];
        let mut acc: u128 = 0;
        let mut bits = 0u32;
        let mut idx = 0usize;
        for limb in limbs {
            acc |= u128::from(limb) << bits;
            bits += 51;
            while bits >= 8 && idx < 32 {
                out[idx] = acc as u8;
                acc >>= 8;
                bits -= 8;
                idx += 1;
            }
        }
        if idx < 32 {
            out[idx] = acc as u8;
        }
        out
    }

    /// Carry every limb into the next, folding the top carry back times 19
    fn reduce(mut limbs: [u64; 5]) -> Self {
        let c0 = limbs[0] >> 51;
        let c1 = limbs[1] >> 51;
        let c2 = limbs[2] >> 51;
        let c3 = limbs[3] >> 51;
        let c4 = limbs[4] >> 51;

        limbs[0] &= LOW_51_BIT_MASK;
        limbs[1] &= LOW_51_BIT_MASK;
        limbs[2] &= LOW_51_BIT_MASK;
        limbs[3] &= LOW_51_BIT_MASK;
        limbs[4] &= LOW_51_BIT_MASK;

        limbs[0] += c4 * 19;
        limbs[1] += c0;
        limbs[2] += c1;
        limbs[3] += c2;
        limbs[4] += c3;

        FieldElement(limbs)
    }

    pub fn square(&self) -> Self {
        self * self
    }

    /// self + self
    pub fn double(&self) -> Self {
        self + self
    }

    /// Raise to a public exponent given as 32 little-endian bytes
    fn pow(&self, exp: &[u8; 32]) -> Self {
        let mut acc = FieldElement::ONE;
        for i in (0..256).rev() {
            acc = acc.square();
            if (exp[i >> 3] >> (i & 7)) & 1 == 1 {
                acc = &acc * self;
            }
        }
        acc
    }

    /// Multiplicative inverse. The inverse of zero is zero.
    pub fn invert(&self) -> Self {
        self.pow(&P_MINUS_2)
    }

    /// self^((p - 5) / 8), the core of the square-root computation
    pub fn pow22523(&self) -> Self {
        self.pow(&P_MINUS_5_OVER_8)
    }

    /// A fixed square root of -1, computed as 2^((p - 1) / 4)
    pub fn sqrt_minus_one() -> Self {
        FieldElement::from_u64(2).pow(&P_MINUS_1_OVER_4)
    }

    /// The "sign" of an element: the low bit of its canonical encoding
    pub fn is_negative(&self) -> bool {
        self.to_bytes()[0] & 1 == 1
    }

    pub fn is_zero(&self) -> bool {
        self.to_bytes() == [0u8; 32]
    }
}

impl PartialEq for FieldElement {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for FieldElement {}

impl<'a, 'b> Add<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: &'b FieldElement) -> FieldElement {
        let mut limbs = self.0;
        for (limb, r) in limbs.iter_mut().zip(rhs.0) {
            *limb += r;
        }
        FieldElement::reduce(limbs)
    }
}

impl<'a, 'b> Sub<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: &'b FieldElement) -> FieldElement {
        let mut limbs = self.0;
        for i in 0..5 {
            limbs[i] = (limbs[i] + SIXTEEN_P[i]) - rhs.0[i];
        }
        FieldElement::reduce(limbs)
    }
}

impl<'a> Neg for &'a FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        &FieldElement::ZERO - self
    }
}

impl<'a, 'b> Mul<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: &'b FieldElement) -> FieldElement {
        #[inline(always)]
        fn m(x: u64, y: u64) -> u128 {
            u128::from(x) * u128::from(y)
        }

        let a = &self.0;
        let b = &rhs.0;

        // 2^255 = 19 (mod p), so limbs that wrap past 2^255 pick up a factor of 19
        let b1_19 = b[1] * 19;
        let b2_19 = b[2] * 19;
        let b3_19 = b[3] * 19;
        let b4_19 = b[4] * 19;

        let c0 = m(a[0], b[0]) + m(a[4], b1_19) + m(a[3], b2_19) + m(a[2], b3_19) + m(a[1], b4_19);
        let mut c1 = m(a[1], b[0]) + m(a[0], b[1]) + m(a[4], b2_19) + m(a[3], b3_19) + m(a[2], b4_19);
        let mut c2 = m(a[2], b[0]) + m(a[1], b[1]) + m(a[0], b[2]) + m(a[4], b3_19) + m(a[3], b4_19);
        let mut c3 = m(a[3], b[0]) + m(a[2], b[1]) + m(a[1], b[2]) + m(a[0], b[3]) + m(a[4], b4_19);
        let mut c4 = m(a[4], b[0]) + m(a[3], b[1]) + m(a[2], b[2]) + m(a[1], b[3]) + m(a[0], b[4]);

        let mut out = [0u64; 5];

        c1 += c0 >> 51;
        out[0] = (c0 as u64) & LOW_51_BIT_MASK;
        c2 += c1 >> 51;
        out[1] = (c1 as u64) & LOW_51_BIT_MASK;
        c3 += c2 >> 51;
        out[2] = (c2 as u64) & LOW_51_BIT_MASK;
        c4 += c3 >> 51;
        out[3] = (c3 as u64) & LOW_51_BIT_MASK;

        let carry = (c4 >> 51) as u64;
        out[4] = (c4 as u64) & LOW_51_BIT_MASK;

        out[0] += carry * 19;
        out[1] += out[0] >> 51;
        out[0] &= LOW_51_BIT_MASK;

        FieldElement(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// p = 2^255 - 19, little-endian
    const P_BYTES: [u8; 32] = exponent(0xed, 0x7f);

    fn sample(seed: u8) -> FieldElement {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = seed.wrapping_mul(31).wrapping_add(i as u8 * 7);
        }
        bytes[31] &= 0x7f;
        FieldElement::from_bytes(&bytes)
    }

    #[test]
    fn test_bytes_roundtrip_small() {
        let mut bytes = [0u8; 32];
        bytes[0] = 9;
        bytes[17] = 0xab;
        assert_eq!(FieldElement::from_bytes(&bytes).to_bytes(), bytes);
    }

    #[test]
    fn test_p_encodes_as_zero() {
        let p = FieldElement::from_bytes(&P_BYTES);
        assert_eq!(p.to_bytes(), [0u8; 32]);
        assert!(p.is_zero());
    }

    #[test]
    fn test_p_minus_one_is_canonical() {
        let mut bytes = P_BYTES;
        bytes[0] = 0xec;
        assert_eq!(FieldElement::from_bytes(&bytes).to_bytes(), bytes);
        assert_eq!(FieldElement::from_bytes(&bytes), -&FieldElement::ONE);
    }

    #[test]
    fn test_add_sub_inverse() {
        let a = sample(3);
        let b = sample(200);
        assert_eq!(&(&a + &b) - &b, a);
        assert_eq!(&a - &a, FieldElement::ZERO);
        assert_eq!(&a + &(-&a), FieldElement::ZERO);
    }

    #[test]
    fn test_mul_small_values() {
        let six = &FieldElement::from_u64(2) * &FieldElement::from_u64(3);
        assert_eq!(six, FieldElement::from_u64(6));
    }

    #[test]
    fn test_mul_distributes() {
        let a = sample(1);
        let b = sample(2);
        let c = sample(3);
        assert_eq!(&a * &(&b + &c), &(&a * &b) + &(&a * &c));
    }

    #[test]
    fn test_invert() {
        for seed in [1u8, 7, 42, 255] {
            let a = sample(seed);
            assert_eq!(&a * &a.invert(), FieldElement::ONE);
        }
        assert_eq!(FieldElement::ZERO.invert(), FieldElement::ZERO);
    }

    #[test]
    fn test_sqrt_minus_one_squares_to_minus_one() {
        let i = FieldElement::sqrt_minus_one();
        assert_eq!(i.square(), -&FieldElement::ONE);
    }

    #[test]
    fn test_sign_of_negation() {
        let a = FieldElement::from_u64(5);
        assert!(a.is_negative());
        assert!(!(-&a).is_negative());
        assert!(!FieldElement::ZERO.is_negative());
    }
}
