//! Twisted Edwards curve points for Ed25519
//!
//! The curve is -x^2 + y^2 = 1 + d x^2 y^2 over GF(2^255 - 19). Points move
//! between four coordinate systems depending on the next operation:
//!
//! | Type              | Coordinates            | Affine point              |
//! |-------------------|------------------------|---------------------------|
//! | `ProjectivePoint` | (X : Y : Z)            | x = X/Z, y = Y/Z          |
//! | `ExtendedPoint`   | (X : Y : Z : T)        | as projective, XY = ZT    |
//! | `CompletedPoint`  | ((X : Z), (Y : T))     | x = X/Z, y = Y/T          |
//! | `CachedPoint`     | (Y+X, Y-X, Z, 2dT)     | addend form of extended   |
//!
//! Doubling consumes projective coordinates, addition consumes an extended
//! point plus a cached point, and both produce completed coordinates.
//!
//! Nothing in this module is constant-time. It exists for signature
//! verification, where every input is public.

use once_cell::sync::Lazy;

use crate::field::FieldElement;

/// Standard encoding of the Ed25519 base point (y = 4/5, x even)
pub const BASEPOINT_COMPRESSED: [u8; 32] = [
    0x58, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
    0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
    0x66, 0x66,
];

/// d = -121665 / 121666
static EDWARDS_D: Lazy<FieldElement> = Lazy::new(|| {
    let numerator = -&FieldElement::from_u64(121665);
    &numerator * &FieldElement::from_u64(121666).invert()
});

static EDWARDS_D2: Lazy<FieldElement> = Lazy::new(|| EDWARDS_D.double());

static SQRT_M1: Lazy<FieldElement> = Lazy::new(FieldElement::sqrt_minus_one);

static BASEPOINT: Lazy<ExtendedPoint> = Lazy::new(|| {
    ExtendedPoint::decompress(&BASEPOINT_COMPRESSED).expect("base point encoding is on the curve")
});

/// Odd multiples B, 3B, 5B, ..., 15B of the base point
static BASEPOINT_ODD_MULTIPLES: Lazy<[CachedPoint; 8]> =
    Lazy::new(|| odd_multiples(&BASEPOINT));

#[derive(Clone, Copy, Debug)]
pub struct ProjectivePoint {
    pub x: FieldElement,
    pub y: FieldElement,
    pub z: FieldElement,
}

#[derive(Clone, Copy, Debug)]
pub struct ExtendedPoint {
    pub x: FieldElement,
    pub y: FieldElement,
    pub z: FieldElement,
    pub t: FieldElement,
}

#[derive(Clone, Copy, Debug)]
pub struct CompletedPoint {
    pub x: FieldElement,
    pub y: FieldElement,
    pub z: FieldElement,
    pub t: FieldElement,
}

#[derive(Clone, Copy, Debug)]
pub struct CachedPoint {
    pub y_plus_x: FieldElement,
    pub y_minus_x: FieldElement,
    pub z: FieldElement,
    pub t2d: FieldElement,
}

/// Encode (X/Z, Y/Z) as y with the sign of x in the top bit
fn encode(x: &FieldElement, y: &FieldElement, z: &FieldElement) -> [u8; 32] {
    let recip = z.invert();
    let x = x * &recip;
    let y = y * &recip;
    let mut s = y.to_bytes();
    s[31] ^= u8::from(x.is_negative()) << 7;
    s
}

impl ProjectivePoint {
    pub fn identity() -> Self {
        Self {
            x: FieldElement::ZERO,
            y: FieldElement::ONE,
            z: FieldElement::ONE,
        }
    }

    /// r = 2p
    pub fn double(&self) -> CompletedPoint {
        let xx = self.x.square();
        let yy = self.y.square();
        let zz2 = self.z.square().double();
        let x_plus_y_sq = (&self.x + &self.y).square();

        let y = &yy + &xx;
        let z = &yy - &xx;
        CompletedPoint {
            x: &x_plus_y_sq - &y,
            y,
            z,
            t: &zz2 - &z,
        }
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        encode(&self.x, &self.y, &self.z)
    }
}

impl ExtendedPoint {
    pub fn identity() -> Self {
        Self {
            x: FieldElement::ZERO,
            y: FieldElement::ONE,
            z: FieldElement::ONE,
            t: FieldElement::ZERO,
        }
    }

    /// The Ed25519 base point B
    pub fn basepoint() -> &'static ExtendedPoint {
        &BASEPOINT
    }

    /// Decode a 32-byte point encoding.
    ///
    /// Returns `None` when y is not canonical (y >= p), when no x satisfies
    /// the curve equation, or when x = 0 is paired with a set sign bit.
    pub fn decompress(bytes: &[u8; 32]) -> Option<Self> {
        Self::decompress_with_sign(bytes, false)
    }

    /// Decode a point encoding and return its negation, -P
    pub fn decompress_negate_vartime(bytes: &[u8; 32]) -> Option<Self> {
        Self::decompress_with_sign(bytes, true)
    }

    fn decompress_with_sign(bytes: &[u8; 32], negate: bool) -> Option<Self> {
        let y = FieldElement::from_bytes(bytes);
        let mut canonical = *bytes;
        canonical[31] &= 0x7f;
        if y.to_bytes() != canonical {
            return None;
        }
        let sign = bytes[31] >> 7 == 1;

        // x^2 = u / v with u = y^2 - 1, v = d y^2 + 1
        let yy = y.square();
        let u = &yy - &FieldElement::ONE;
        let v = &(&yy * &*EDWARDS_D) + &FieldElement::ONE;

        // x = u v^3 (u v^7)^((p - 5) / 8)
        let v3 = &v.square() * &v;
        let uv7 = &(&v3.square() * &v) * &u;
        let mut x = &(&uv7.pow22523() * &v3) * &u;

        let vxx = &x.square() * &v;
        if !(&vxx - &u).is_zero() {
            if !(&vxx + &u).is_zero() {
                return None;
            }
            x = &x * &*SQRT_M1;
        }

        if x.is_zero() && sign {
            return None;
        }

        // Pick the root whose sign matches the encoding (or the opposite one)
        if (x.is_negative() == sign) == negate {
            x = -&x;
        }

        Some(Self {
            x,
            y,
            z: FieldElement::ONE,
            t: &x * &y,
        })
    }

    pub fn to_projective(&self) -> ProjectivePoint {
        ProjectivePoint {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }

    pub fn to_cached(&self) -> CachedPoint {
        CachedPoint {
            y_plus_x: &self.y + &self.x,
            y_minus_x: &self.y - &self.x,
            z: self.z,
            t2d: &self.t * &*EDWARDS_D2,
        }
    }

    /// r = 2p, computed through the projective form (T is not needed)
    pub fn double(&self) -> CompletedPoint {
        self.to_projective().double()
    }

    /// r = p + q
    pub fn add_cached(&self, q: &CachedPoint) -> CompletedPoint {
        let pp = &(&self.y + &self.x) * &q.y_plus_x;
        let mm = &(&self.y - &self.x) * &q.y_minus_x;
        let tt2d = &self.t * &q.t2d;
        let zz2 = (&self.z * &q.z).double();

        CompletedPoint {
            x: &pp - &mm,
            y: &pp + &mm,
            z: &zz2 + &tt2d,
            t: &zz2 - &tt2d,
        }
    }

    /// r = p - q
    pub fn sub_cached(&self, q: &CachedPoint) -> CompletedPoint {
        let pm = &(&self.y + &self.x) * &q.y_minus_x;
        let mp = &(&self.y - &self.x) * &q.y_plus_x;
        let tt2d = &self.t * &q.t2d;
        let zz2 = (&self.z * &q.z).double();

        CompletedPoint {
            x: &pm - &mp,
            y: &pm + &mp,
            z: &zz2 - &tt2d,
            t: &zz2 + &tt2d,
        }
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        encode(&self.x, &self.y, &self.z)
    }

    /// Check -X^2 Z^2 + Y^2 Z^2 = Z^4 + d X^2 Y^2 and XY = ZT
    pub fn is_on_curve(&self) -> bool {
        let xx = self.x.square();
        let yy = self.y.square();
        let zz = self.z.square();
        let lhs = &(&yy - &xx) * &zz;
        let rhs = &zz.square() + &(&(&xx * &yy) * &*EDWARDS_D);
        lhs == rhs && &self.x * &self.y == &self.z * &self.t
    }
}

impl CompletedPoint {
    pub fn to_projective(&self) -> ProjectivePoint {
        ProjectivePoint {
            x: &self.x * &self.t,
            y: &self.y * &self.z,
            z: &self.z * &self.t,
        }
    }

    pub fn to_extended(&self) -> ExtendedPoint {
        ExtendedPoint {
            x: &self.x * &self.t,
            y: &self.y * &self.z,
            z: &self.z * &self.t,
            t: &self.x * &self.y,
        }
    }
}

/// [P, 3P, 5P, ..., 15P] in cached form
fn odd_multiples(point: &ExtendedPoint) -> [CachedPoint; 8] {
    let double = point.double().to_extended();
    let mut table = [point.to_cached(); 8];
    for i in 0..7 {
        table[i + 1] = double.add_cached(&table[i]).to_extended().to_cached();
    }
    table
}

/// Signed sliding-window recoding of a 256-bit little-endian scalar.
///
/// Every non-zero digit is odd and lies in [-15, 15]; at most one of any
/// seven consecutive digits is non-zero. The scalar must be below 2^255 so
/// the final carry stays in range.
fn slide(scalar: &[u8; 32]) -> [i8; 256] {
    let mut r = [0i8; 256];
    for (i, digit) in r.iter_mut().enumerate() {
        *digit = ((scalar[i >> 3] >> (i & 7)) & 1) as i8;
    }

    for i in 0..256 {
        if r[i] == 0 {
            continue;
        }
        for b in 1..=6 {
            if i + b >= 256 {
                break;
            }
            if r[i + b] == 0 {
                continue;
            }
            let shifted = i32::from(r[i + b]) << b;
            let current = i32::from(r[i]);
            if current + shifted <= 15 {
                r[i] = (current + shifted) as i8;
                r[i + b] = 0;
            } else if current - shifted >= -15 {
                r[i] = (current - shifted) as i8;
                for digit in r.iter_mut().skip(i + b) {
                    if *digit == 0 {
                        *digit = 1;
                        break;
                    }
                    *digit = 0;
                }
            } else {
                break;
            }
        }
    }
    r
}

fn apply_digit(t: CompletedPoint, digit: i8, table: &[CachedPoint; 8]) -> CompletedPoint {
    match digit {
        0 => t,
        d if d > 0 => t.to_extended().add_cached(&table[(d / 2) as usize]),
        d => t.to_extended().sub_cached(&table[(-d / 2) as usize]),
    }
}

/// Compute a·A + b·B where B is the base point.
///
/// Variable-time: the sequence of additions depends on the scalars. Only
/// call this with public scalars (signature verification). Scalars must be
/// below 2^255.
pub fn double_scalar_mul_vartime(
    a: &[u8; 32],
    point: &ExtendedPoint,
    b: &[u8; 32],
) -> ProjectivePoint {
    let a_digits = slide(a);
    let b_digits = slide(b);
    let a_table = odd_multiples(point);
    let b_table = &*BASEPOINT_ODD_MULTIPLES;

    let mut r = ProjectivePoint::identity();
    let Some(top) = (0..256).rev().find(|&i| a_digits[i] != 0 || b_digits[i] != 0) else {
        return r;
    };

    for i in (0..=top).rev() {
        let mut t = r.double();
        t = apply_digit(t, a_digits[i], &a_table);
        t = apply_digit(t, b_digits[i], b_table);
        r = t.to_projective();
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
    use curve25519_dalek::scalar::Scalar;

    fn scalar_bytes(n: u64) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[..8].copy_from_slice(&n.to_le_bytes());
        out
    }

    #[test]
    fn test_basepoint_roundtrip() {
        let b = ExtendedPoint::basepoint();
        assert!(b.is_on_curve());
        assert_eq!(b.to_bytes(), BASEPOINT_COMPRESSED);
    }

    #[test]
    fn test_identity_doubles_to_identity() {
        let r = ProjectivePoint::identity().double().to_projective();
        assert_eq!(r.to_bytes(), ExtendedPoint::identity().to_bytes());
    }

    #[test]
    fn test_double_matches_self_addition() {
        let b = ExtendedPoint::basepoint();
        let doubled = b.double().to_extended();
        let added = b.add_cached(&b.to_cached()).to_extended();
        assert!(doubled.is_on_curve());
        assert_eq!(doubled.to_bytes(), added.to_bytes());
    }

    #[test]
    fn test_double_matches_reference() {
        let expected = (ED25519_BASEPOINT_POINT * Scalar::from(2u64)).compress().to_bytes();
        assert_eq!(ExtendedPoint::basepoint().double().to_projective().to_bytes(), expected);

        let four = (ED25519_BASEPOINT_POINT * Scalar::from(4u64)).compress().to_bytes();
        let b2 = ExtendedPoint::basepoint().double().to_extended();
        assert_eq!(b2.double().to_projective().to_bytes(), four);
    }

    #[test]
    fn test_sub_undoes_add() {
        let b = ExtendedPoint::basepoint();
        let b2 = b.double().to_extended();
        let back = b2.add_cached(&b.to_cached()).to_extended().sub_cached(&b.to_cached());
        assert_eq!(back.to_projective().to_bytes(), b2.to_bytes());
    }

    #[test]
    fn test_negated_decompression() {
        let neg_b = ExtendedPoint::decompress_negate_vartime(&BASEPOINT_COMPRESSED).unwrap();
        assert!(neg_b.is_on_curve());
        let sum = ExtendedPoint::basepoint().add_cached(&neg_b.to_cached());
        assert_eq!(sum.to_projective().to_bytes(), ExtendedPoint::identity().to_bytes());

        let mut expected = BASEPOINT_COMPRESSED;
        expected[31] ^= 0x80;
        assert_eq!(neg_b.to_bytes(), expected);
    }

    #[test]
    fn test_decompress_rejects_non_canonical_y() {
        // y = p encodes zero non-canonically
        let mut bytes = [0xffu8; 32];
        bytes[0] = 0xed;
        bytes[31] = 0x7f;
        assert!(ExtendedPoint::decompress(&bytes).is_none());
    }

    #[test]
    fn test_decompress_rejects_negative_zero_x() {
        // y = 1 has x = 0; the sign bit must be clear
        let mut bytes = [0u8; 32];
        bytes[0] = 1;
        assert!(ExtendedPoint::decompress(&bytes).is_some());
        bytes[31] = 0x80;
        assert!(ExtendedPoint::decompress(&bytes).is_none());
    }

    #[test]
    fn test_decompress_small_y_values() {
        // Roughly half of all y values have no x on the curve
        let mut accepted = 0;
        let mut rejected = 0;
        for y in 2u8..40 {
            let mut bytes = [0u8; 32];
            bytes[0] = y;
            match ExtendedPoint::decompress(&bytes) {
                Some(point) => {
                    assert!(point.is_on_curve());
                    assert_eq!(point.to_bytes(), bytes);
                    accepted += 1;
                }
                None => rejected += 1,
            }
        }
        assert!(accepted > 0);
        assert!(rejected > 0);
    }

    #[test]
    fn test_slide_digits_reconstruct_scalar() {
        let scalar = Scalar::from(0x1234_5678_9abc_def0u64) * Scalar::from(0x0fed_cba9_8765_4321u64);
        let bytes = scalar.to_bytes();
        let digits = slide(&bytes);

        let mut acc = Scalar::ZERO;
        for &d in digits.iter().rev() {
            acc += acc;
            if d >= 0 {
                acc += Scalar::from(d as u64);
            } else {
                acc -= Scalar::from((-d) as u64);
            }
        }
        assert_eq!(acc.to_bytes(), bytes);
        assert!(digits.iter().all(|&d| d == 0 || (d % 2 != 0 && (-15..=15).contains(&d))));
    }

    #[test]
    fn test_double_scalar_mul_matches_reference() {
        let a = Scalar::from(0xdead_beefu64) * Scalar::from(0x1_0000_0001u64);
        let b = Scalar::from(987_654_321u64);
        let point = ED25519_BASEPOINT_POINT * Scalar::from(7u64);
        let expected = (point * a + ED25519_BASEPOINT_POINT * b).compress().to_bytes();

        let ours = ExtendedPoint::decompress(&point.compress().to_bytes()).unwrap();
        let r = double_scalar_mul_vartime(&a.to_bytes(), &ours, &b.to_bytes());
        assert_eq!(r.to_bytes(), expected);
    }

    #[test]
    fn test_double_scalar_mul_zero_scalars() {
        let r = double_scalar_mul_vartime(&[0u8; 32], ExtendedPoint::basepoint(), &[0u8; 32]);
        assert_eq!(r.to_bytes(), ExtendedPoint::identity().to_bytes());

        let r = double_scalar_mul_vartime(&[0u8; 32], ExtendedPoint::basepoint(), &scalar_bytes(1));
        assert_eq!(r.to_bytes(), BASEPOINT_COMPRESSED);
    }
}
