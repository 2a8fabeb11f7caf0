/*
 * sss: shamir secret sharing over GF(2^8) with authenticated shares
 * Copyright (C) 2018-2022 Aleksa Sarai <cyphar@cyphar.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::{
    fmt,
    ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign},
};

use once_cell::sync::Lazy;
use rand::{CryptoRng, RngCore};
use zeroize::{DefaultIsZeroes, Zeroize};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("point {index} shares its x value with another point, so interpolation is impossible")]
    NonInvertiblePoint { index: usize },
}

/// Primitive uint type for GfElems.
pub type GfElemPrimitive = u8;

/// A field element of `GF(2^8)`, with characteristic polynomial
/// `x^8 + x^4 + x^3 + x + 1` (the same field used by AES).
///
/// Multiplication and inversion go through log/antilog tables which are
/// generated once per process and never modified afterwards. Lookups do not
/// branch on the value of the operands, but table lookups are not guaranteed
/// to be cache-timing safe.
// NOTE: PartialEq is not timing-safe.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct GfElem(GfElemPrimitive);

/// (x, y) in GF.
#[cfg(test)]
pub type GfPoint = (GfElem, GfElem);

// Lets a Vec<GfElem> holding secret coefficients be wiped on drop.
impl DefaultIsZeroes for GfElem {}

struct Tables {
    // exp[i] = g^i, stored twice so that log[a] + log[b] never needs a modulo.
    exp: [GfElemPrimitive; 2 * 255],
    // log[g^i] = i. log[0] is meaningless and left as zero.
    log: [GfElemPrimitive; 256],
}

impl Tables {
    fn generate() -> Self {
        let mut exp = [0; 2 * 255];
        let mut log = [0; 256];

        let mut x = GfElem::ONE.0;
        for i in 0..255 {
            exp[i] = x;
            exp[i + 255] = x;
            log[x as usize] = i as GfElemPrimitive;
            x = GfElem::polynomial_mul(x, GfElem::GENERATOR);
        }

        Self { exp, log }
    }
}

static TABLES: Lazy<Tables> = Lazy::new(Tables::generate);

impl GfElem {
    // x^8 + x^4 + x^3 + x + 1
    #[allow(dead_code)]
    const POLYNOMIAL: u16 = 0b1_0001_1011;

    // Self::POLYNOMIAL but with the top-most bit unset.
    const TRUNC_POLYNOMIAL: GfElemPrimitive = 0b0001_1011;

    // x + 1 is the smallest primitive element of this field (x itself only
    // has order 51), so its powers enumerate every non-zero element.
    const GENERATOR: GfElemPrimitive = 0b0000_0011;

    /// Additive identity.
    pub const ZERO: GfElem = GfElem(0);

    /// Multiplicative identity.
    pub const ONE: GfElem = GfElem(1);

    pub(crate) fn inner(&self) -> GfElemPrimitive {
        self.0
    }

    pub(crate) fn from_inner(v: GfElemPrimitive) -> Self {
        Self(v)
    }

    // NOTE: Definitely not constant-time.
    #[cfg(test)]
    pub fn pow(self, mut n: usize) -> Self {
        let mut mult = self;
        let mut result = Self::ONE;
        while n != 0 {
            if n & 1 == 1 {
                result *= mult;
            }
            mult *= mult;
            n >>= 1;
        }
        result
    }

    // Russian Peasant Multiplication, using masks rather than branches. Only
    // used to build the tables (and to check them in tests).
    fn polynomial_mul(mut a: GfElemPrimitive, mut b: GfElemPrimitive) -> GfElemPrimitive {
        let mut p = 0;
        for _ in 0..8 {
            p ^= a & (b & 1).wrapping_neg();
            let carry = (a >> 7).wrapping_neg();
            a = (a << 1) ^ (Self::TRUNC_POLYNOMIAL & carry);
            b >>= 1;
        }
        p
    }

    fn table_mul(a: GfElemPrimitive, b: GfElemPrimitive) -> GfElemPrimitive {
        let tables = &*TABLES;
        let product =
            tables.exp[tables.log[a as usize] as usize + tables.log[b as usize] as usize];
        // The log of zero is garbage, so zero the product if either side is.
        let mask = (((a != 0) & (b != 0)) as GfElemPrimitive).wrapping_neg();
        product & mask
    }

    pub fn inverse(self) -> Option<Self> {
        match self {
            Self::ZERO => None,
            _ => {
                let tables = &*TABLES;
                Some(Self(tables.exp[255 - tables.log[self.0 as usize] as usize]))
            }
        }
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for GfElem {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self(GfElemPrimitive::arbitrary(g))
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(Self))
    }
}

impl Add for GfElem {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for GfElem {
    fn add_assign(&mut self, rhs: Self) {
        // Addition in GF(2^n) is actually XOR.
        #![allow(clippy::suspicious_op_assign_impl)]
        self.0 ^= rhs.0
    }
}

impl Sub for GfElem {
    type Output = Self;
    fn sub(mut self, rhs: Self) -> Self::Output {
        self -= rhs;
        self
    }
}

impl SubAssign for GfElem {
    fn sub_assign(&mut self, rhs: Self) {
        // Subtraction in GF(2^n) is identical to addition.
        #![allow(clippy::suspicious_op_assign_impl)]
        *self += rhs
    }
}

impl Neg for GfElem {
    type Output = Self;
    fn neg(self) -> Self::Output {
        self
    }
}

impl Mul for GfElem {
    type Output = Self;
    fn mul(mut self, rhs: Self) -> Self::Output {
        self *= rhs;
        self
    }
}

impl MulAssign for GfElem {
    fn mul_assign(&mut self, rhs: Self) {
        self.0 = Self::table_mul(self.0, rhs.0)
    }
}

impl Div for GfElem {
    type Output = Self;
    fn div(mut self, rhs: Self) -> Self::Output {
        self /= rhs;
        self
    }
}

impl DivAssign for GfElem {
    fn div_assign(&mut self, rhs: Self) {
        #![allow(clippy::suspicious_op_assign_impl)]
        *self *= rhs.inverse().expect("rhs cannot be inverted")
    }
}

/// A polynomial in `GF(2^8)`.
///
/// One of these is generated per secret byte when dealing shards. They hold
/// secret material (the constant term is the secret byte), so the
/// coefficients are wiped when the polynomial is dropped.
// The coefficients are in *increasing* degree.
#[derive(Clone, PartialEq, Eq)]
pub struct GfPolynomial(Vec<GfElem>);

impl fmt::Debug for GfPolynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GfPolynomial")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

impl Drop for GfPolynomial {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl GfPolynomial {
    /// Generate a polynomial of degree `n` with the given constant term and
    /// uniformly random higher-order coefficients.
    ///
    /// Exactly `n` bytes are drawn from `r`. Coefficients may be zero, which
    /// only means that some polynomials have a lower degree than `n`. Since
    /// that happens with the same probability as any other coefficient value,
    /// it leaks nothing about the constant term.
    pub fn new_rand<R: CryptoRng + RngCore + ?Sized>(
        n: usize,
        constant: GfElem,
        r: &mut R,
    ) -> Result<Self, rand::Error> {
        let mut coeffs = vec![GfElem::ZERO; n + 1];
        coeffs[0] = constant;

        let mut random = vec![0u8; n];
        let filled = r.try_fill_bytes(&mut random);
        coeffs[1..]
            .iter_mut()
            .zip(&random)
            .for_each(|(coeff, b)| *coeff = GfElem(*b));
        random.zeroize();

        // Construct before propagating the error so the partial coefficients
        // still get wiped.
        let poly = Self(coeffs);
        filled?;
        Ok(poly)
    }

    #[cfg(test)]
    pub fn degree(&self) -> usize {
        match self.0.len() {
            0 => panic!("GfPolynomial must have at least one element"),
            n => n - 1,
        }
    }

    /// Retreive the constant term of the polynomial.
    #[cfg(test)]
    pub fn constant(&self) -> GfElem {
        *self
            .0
            .first()
            .expect("GfPolynomial must have at least one element")
    }

    /// Evaluate the polynomial at a given `x` value.
    pub fn evaluate(&self, x: GfElem) -> GfElem {
        // Horner's method, in reverse because the coefficients are stored in
        // increasing degree.
        self.0
            .iter()
            .rev()
            .fold(GfElem::ZERO, |acc, coeff| *coeff + x * acc)
    }

    /// Compute the Lagrange basis polynomials for the given `xs`, evaluated at
    /// `x = 0`.
    ///
    /// The constant term of any polynomial of degree `< xs.len()` passing
    /// through `(xs[j], ys[j])` is then `\sum_j ys[j] * basis[j]`. The basis
    /// only depends on the x values, so when many polynomials are sampled at
    /// the same x values (as with a shard's y-values) it only needs to be
    /// computed once.
    ///
    /// The x values must be distinct. They do not need to be non-zero.
    pub fn lagrange_basis<X: AsRef<[GfElem]>>(xs: X) -> Result<Vec<GfElem>, Error> {
        let xs = xs.as_ref();
        let k = xs.len();

        // Substituting x=0 into the Lagrange basis polynomials
        //
        //   l_j(x) = \prod_{m=0,m!=j}^{k} \frac{x-x_m}{x_j-x_m}
        //
        // gives (remembering that subtraction is addition in GF(2^n))
        //
        //   l_j(0) = \prod_{m=0,m!=j}^{k} \frac{x_m}{x_m-x_j}
        //
        // which we compute as a single numerator and a single denominator so
        // that there is only one inversion per basis polynomial.
        (0..k)
            .map(|j| -> Result<GfElem, Error> {
                let (numerator, denominator) = (0..k).filter(|m| *m != j).try_fold(
                    (GfElem::ONE, GfElem::ONE),
                    |(num, den), m| match xs[m] - xs[j] {
                        GfElem::ZERO => Err(Error::NonInvertiblePoint { index: j.max(m) }),
                        diff => Ok((num * xs[m], den * diff)),
                    },
                )?;
                // A product of non-zero elements in a field is never zero.
                let denominator_inv = denominator
                    .inverse()
                    .ok_or(Error::NonInvertiblePoint { index: j })?;
                Ok(numerator * denominator_inv)
            })
            .collect()
    }

    /// Interpolate the constant term of a polynomial in `GF(2^8)`, given a set
    /// of points along that polynomial.
    ///
    /// If fewer points are given than the polynomial needs, this still returns
    /// *a* value -- it just isn't the constant term. There is no way to detect
    /// this from the points alone.
    #[cfg(test)]
    pub fn lagrange_constant<P: AsRef<[GfPoint]>>(points: P) -> Result<GfElem, Error> {
        let (xs, ys): (Vec<_>, Vec<_>) = points.as_ref().iter().copied().unzip();
        let basis = Self::lagrange_basis(xs)?;
        Ok(ys
            .iter()
            .zip(&basis)
            .fold(GfElem::ZERO, |acc, (y, l)| acc + *y * *l))
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for GfPolynomial {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        // More than 255 coefficients cannot be recovered with distinct
        // non-zero x values.
        let len = 1 + usize::arbitrary(g) % g.size().clamp(1, 255);
        GfPolynomial((0..len).map(|_| GfElem::arbitrary(g)).collect::<Vec<_>>())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use quickcheck::TestResult;
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

    #[test]
    fn known_products() {
        // FIPS-197 section 4.2.
        assert_eq!(GfElem(0x57) * GfElem(0x83), GfElem(0xc1));
        assert_eq!(GfElem(0x57) * GfElem(0x13), GfElem(0xfe));
        // FIPS-197 section 4.2.1 -- {53} and {ca} are inverses.
        assert_eq!(GfElem(0x53).inverse(), Some(GfElem(0xca)));
        assert_eq!(GfElem::ZERO.inverse(), None);
    }

    #[test]
    fn tables_match_polynomial_mul() {
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                assert_eq!(
                    GfElem::table_mul(a, b),
                    GfElem::polynomial_mul(a, b),
                    "{:#04x} * {:#04x}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn generator_is_primitive() {
        let tables = &*TABLES;
        let mut seen = tables.exp[..255].to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 255);
        assert!(!seen.contains(&0));
    }

    #[test]
    fn reduction_polynomial() {
        // x^7 * x = x^8 = x^4 + x^3 + x + 1.
        assert_eq!(
            GfElem(0x80) * GfElem(0x02),
            GfElem((GfElem::POLYNOMIAL & 0xff) as GfElemPrimitive)
        );
    }

    #[quickcheck]
    fn add_commutativity(a: GfElem, b: GfElem) -> bool {
        (a + b) == (b + a)
    }

    #[quickcheck]
    fn mul_commutativity(a: GfElem, b: GfElem) -> bool {
        (a * b) == (b * a)
    }

    #[quickcheck]
    fn add_associativity(a: GfElem, b: GfElem, c: GfElem) -> bool {
        ((a + b) + c) == (a + (b + c))
    }

    #[quickcheck]
    fn mul_associativity(a: GfElem, b: GfElem, c: GfElem) -> bool {
        ((a * b) * c) == (a * (b * c))
    }

    #[quickcheck]
    fn add_identity(a: GfElem) -> bool {
        (a + GfElem::ZERO) == a
    }

    #[quickcheck]
    fn mul_identity(a: GfElem) -> bool {
        (a * GfElem::ONE) == a
    }

    #[quickcheck]
    fn mul_zero_identity(a: GfElem) -> bool {
        (a * GfElem::ZERO) == GfElem::ZERO
    }

    #[quickcheck]
    fn add_inverse(a: GfElem) -> bool {
        a - a == GfElem::ZERO && a + (-a) == GfElem::ZERO
    }

    #[test]
    fn mul_inverse_exhaustive() {
        for a in 1..=255u8 {
            let a = GfElem(a);
            let a_inv = a.inverse().expect("non-zero elements are invertible");
            assert_eq!(a * a_inv, GfElem::ONE);
            assert_eq!(GfElem::ONE / a, a_inv);
        }
    }

    #[quickcheck]
    fn div_mul_invertibility(a: GfElem, b: GfElem) -> TestResult {
        match b {
            GfElem::ZERO => TestResult::discard(),
            _ => TestResult::from_bool((a / b) * b == a),
        }
    }

    #[quickcheck]
    fn distributivity(a: GfElem, b: GfElem, c: GfElem) -> bool {
        (a * (b + c)) == ((a * b) + (a * c))
    }

    #[quickcheck]
    fn fermat(a: GfElem) -> bool {
        // Every element of GF(2^8) satisfies a^256 = a.
        a.pow(256) == a
    }

    // Inefficient, but "obviously correct" implementation of
    // GfPolynomial::evaluate(), to compare against for the test.
    fn manual_poly(poly: &GfPolynomial, x: GfElem) -> GfElem {
        poly.0
            .iter()
            .enumerate()
            .map(|(n, coeff)| *coeff * x.pow(n))
            .fold(GfElem::ZERO, Add::add)
    }

    #[quickcheck]
    fn polynomial_evaluate(poly: GfPolynomial, x: GfElem) -> bool {
        poly.evaluate(x) == manual_poly(&poly, x)
    }

    #[quickcheck]
    fn polynomial_constant(poly: GfPolynomial) -> bool {
        poly.evaluate(GfElem::ZERO) == poly.constant()
    }

    #[quickcheck]
    fn polynomial_new_rand(n: u8, constant: GfElem, seed: u64) -> bool {
        let poly = GfPolynomial::new_rand(n.into(), constant, &mut StdRng::seed_from_u64(seed))
            .expect("StdRng never fails");
        poly.degree() == n as usize && poly.constant() == constant
    }

    #[test]
    fn polynomial_debug_hides_coefficients() {
        let poly = GfPolynomial(vec![GfElem(0xa7), GfElem(0x13), GfElem(0x5c)]);
        let debug = format!("{:?}", poly);
        assert_eq!(debug, "GfPolynomial { len: 3, .. }");
    }

    #[quickcheck]
    fn polynomial_lagrange_constant(poly: GfPolynomial, seed: u64) -> bool {
        let mut xs = (1..=255).map(GfElem).collect::<Vec<_>>();
        xs.shuffle(&mut StdRng::seed_from_u64(seed));
        xs.truncate(poly.degree() + 1);

        let points = xs
            .iter()
            .map(|x| (*x, poly.evaluate(*x)))
            .collect::<Vec<_>>();
        let constant = GfPolynomial::lagrange_constant(points)
            .expect("should not get errors from lagrange_constant");

        poly.constant() == constant
    }

    #[quickcheck]
    fn polynomial_lagrange_extra_points(poly: GfPolynomial, extra: u8, seed: u64) -> bool {
        // Supplying more points than necessary must not change the result.
        let needed = poly.degree() + 1;
        let mut xs = (1..=255).map(GfElem).collect::<Vec<_>>();
        xs.shuffle(&mut StdRng::seed_from_u64(seed));
        xs.truncate((needed + extra as usize).min(255));

        let points = xs
            .iter()
            .map(|x| (*x, poly.evaluate(*x)))
            .collect::<Vec<_>>();

        GfPolynomial::lagrange_constant(points).ok() == Some(poly.constant())
    }

    #[test]
    fn lagrange_zero_x_point() {
        // A point at x=0 *is* the constant term.
        let poly = GfPolynomial(vec![GfElem(0x2a), GfElem(0x11), GfElem(0xfe)]);
        let points = [GfElem(0), GfElem(7), GfElem(200)]
            .iter()
            .map(|x| (*x, poly.evaluate(*x)))
            .collect::<Vec<_>>();
        assert_eq!(
            GfPolynomial::lagrange_constant(points).unwrap(),
            GfElem(0x2a)
        );
    }

    #[test]
    fn lagrange_duplicate_x() {
        let points = [
            (GfElem(1), GfElem(10)),
            (GfElem(2), GfElem(20)),
            (GfElem(1), GfElem(30)),
        ];
        match GfPolynomial::lagrange_constant(points) {
            Err(Error::NonInvertiblePoint { index }) => assert_eq!(index, 2),
            other => panic!("expected NonInvertiblePoint, got {:?}", other),
        }
    }
}
