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

use crate::shamir::{
    gf::{GfElem, GfElemPrimitive, GfPolynomial},
    Error, Shard,
};

use std::fmt;

use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

/// Deals [`Shard`]s of a single secret.
///
/// The random polynomials are generated once when the `Dealer` is created,
/// so every shard it hands out belongs to the same shard set.
pub struct Dealer {
    polys: Vec<GfPolynomial>,
}

// The polynomials are secret, so only their shape is printed.
impl fmt::Debug for Dealer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dealer")
            .field("secret_len", &self.polys.len())
            .finish_non_exhaustive()
    }
}

impl Dealer {
    /// Create a dealer for `secret`, such that any `threshold` of its shards
    /// can recover the secret.
    ///
    /// Exactly `secret.len() * (threshold - 1)` bytes are drawn from `r`.
    /// `threshold` must be at least one.
    pub fn new<R, B>(threshold: GfElemPrimitive, secret: B, r: &mut R) -> Result<Self, rand::Error>
    where
        R: CryptoRng + RngCore + ?Sized,
        B: AsRef<[u8]>,
    {
        debug_assert!(threshold > 0, "threshold must be at least one");
        let degree = threshold.saturating_sub(1) as usize;

        let polys = secret
            .as_ref()
            .iter()
            .map(|b| GfPolynomial::new_rand(degree, GfElem::from_inner(*b), r))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Dealer { polys })
    }

    /// Evaluate every polynomial at `x`.
    ///
    /// `x` must not be zero -- the shard at zero is the secret itself.
    pub fn shard(&self, x: GfElemPrimitive) -> Shard {
        debug_assert!(x != 0, "shard x-value must be non-zero");
        let x = GfElem::from_inner(x);
        Shard {
            x,
            ys: self.polys.iter().map(|poly| poly.evaluate(x)).collect(),
        }
    }

    /// The first `count` shards, with x-values `1..=count`.
    pub fn shards(&self, count: GfElemPrimitive) -> impl Iterator<Item = Shard> + '_ {
        (1..=count).map(move |x| self.shard(x))
    }
}

/// Split `secret` into `count` shards, any `threshold` of which can recover
/// it. Shard `i` (zero-based) has the x-value `i + 1`.
pub fn split<R, B>(
    secret: B,
    count: GfElemPrimitive,
    threshold: GfElemPrimitive,
    r: &mut R,
) -> Result<Vec<Shard>, rand::Error>
where
    R: CryptoRng + RngCore + ?Sized,
    B: AsRef<[u8]>,
{
    debug_assert!(threshold <= count, "threshold must not exceed count");
    let dealer = Dealer::new(threshold, secret, r)?;
    Ok(dealer.shards(count).collect())
}

/// Recover the secret from a set of shards with distinct x-values and
/// identical lengths.
///
/// If fewer shards are given than the threshold they were dealt with, the
/// result is the wrong secret and no error is returned. Callers which need
/// to know must check the result some other way.
pub fn recover_secret<S: AsRef<[Shard]>>(shards: S) -> Result<Zeroizing<Vec<u8>>, Error> {
    let shards = shards.as_ref();
    let secret_len = shards.first().map(|s| s.ys.len()).unwrap_or(0);
    debug_assert!(
        shards.iter().all(|s| s.ys.len() == secret_len),
        "all shards must have the same length"
    );

    let basis = GfPolynomial::lagrange_basis(shards.iter().map(|s| s.x).collect::<Vec<_>>())?;

    let secret = (0..secret_len)
        .map(|i| {
            shards
                .iter()
                .zip(&basis)
                .fold(GfElem::ZERO, |acc, (shard, l)| acc + shard.ys[i] * *l)
                .inner()
        })
        .collect::<Vec<_>>();

    Ok(Zeroizing::new(secret))
}
