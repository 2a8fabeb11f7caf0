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

//! This package implements a Shamir Secret Sharing scheme in GF(2^8), meaning
//! that every byte of the secret gets its own polynomial and all x and y
//! values are single bytes. A shard set therefore has at most 255 members.
//!
//! ## Security ##
//! **Recovering a secret from fewer shards than the threshold (or from
//! shards which were tampered with) silently produces the wrong secret.**
//! Nothing in a shard records the threshold, so there is no way to detect
//! this at this layer. Only uniformly random secrets (keys) should be sharded
//! directly, and anything which needs tamper detection has to be layered on
//! top (see [`crate::envelope`]).

mod dealer;
pub(crate) mod gf;
pub(crate) mod shard;

pub use dealer::{recover_secret, split, Dealer};
pub use shard::Shard;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("lagrange interpolation failed: {0}")]
    LagrangeError(#[from] gf::Error),
}
