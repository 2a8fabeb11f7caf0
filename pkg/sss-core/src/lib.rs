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

//! Shamir secret sharing over GF(2^8), with shares that can tell when they
//! have been misused.
//!
//! The main interface is [`create_shares`] and [`combine_shares`]. A
//! [`SECRET_LENGTH`]-byte secret is sealed under a random one-time key, and
//! the key is split with Shamir's scheme. Every share carries the same
//! sealed envelope, so combining too few (or tampered) shares is detected
//! when the envelope fails to open rather than silently yielding garbage.
//!
//! ```
//! let secret = [0x2a; sss_core::SECRET_LENGTH];
//! let shares = sss_core::create_shares(&secret, 5, 3)?;
//!
//! assert_eq!(sss_core::combine_shares(&shares[..3])?, Some(secret));
//! assert_eq!(sss_core::combine_shares(&shares[..2])?, None);
//! # Ok::<(), sss_core::Error>(())
//! ```
//!
//! [`create_keyshares`] and [`combine_keyshares`] split a [`KEY_LENGTH`]-byte
//! key directly with no envelope. They are **hazardous**: nothing detects a
//! wrong result. See their documentation before using them.

#![forbid(unsafe_code)]

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use]
extern crate quickcheck_macros;

/// Implementation of Shamir Secret Sharing.
#[cfg(not(feature = "donotuse_expose_internal_modules"))]
mod shamir;

// Expose the module so we can benchmark it with criterion. This feature is only enabled as a
// dev-dependency.
#[cfg(feature = "donotuse_expose_internal_modules")]
pub mod shamir;

/// Sealing and opening of the secret envelope.
pub mod envelope;

mod share;
mod validate;
mod wire;

pub use share::{
    combine_keyshares, combine_shares, combine_shares_with, create_keyshares,
    create_keyshares_with, create_shares, create_shares_with,
};
pub use validate::{validate_combine_input, validate_split_params};

/// Length of the secret handled by [`create_shares`].
pub const SECRET_LENGTH: usize = 64;

/// Length of the key handled by [`create_keyshares`], and of the one-time
/// envelope key.
pub const KEY_LENGTH: usize = 32;

/// A keyshare is its index byte followed by one byte per key byte.
pub const KEYSHARE_LENGTH: usize = 1 + KEY_LENGTH;

/// Ciphertext plus authentication tag.
pub const ENVELOPE_LENGTH: usize = SECRET_LENGTH + 16;

/// A share is a keyshare followed by the envelope.
pub const SHARE_LENGTH: usize = KEYSHARE_LENGTH + ENVELOPE_LENGTH;

/// Most shares that can be created from one secret (one per non-zero index).
pub const MAX_SHARE_COUNT: usize = 255;

/// Most shares accepted by [`combine_shares`] and [`combine_keyshares`].
pub const MAX_COMBINE_SHARES: usize = 254;

/// Why a particular share was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    #[error("expected {expected} bytes but got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("share index must be non-zero")]
    ZeroIndex,

    #[error("share belongs to a different set of shares")]
    EnvelopeMismatch,

    #[error("another share has the same index {x} but different contents")]
    ConflictingIndex { x: u8 },
}

impl From<wire::Error> for MalformedReason {
    fn from(err: wire::Error) -> Self {
        match err {
            wire::Error::WrongLength { expected, actual } => {
                MalformedReason::Length { expected, actual }
            }
            wire::Error::ZeroIndex => MalformedReason::ZeroIndex,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("share count {count} must be between 1 and {}", MAX_SHARE_COUNT)]
    InvalidCount { count: usize },

    #[error("threshold {threshold} must be between 1 and the share count {count}")]
    InvalidThreshold { threshold: usize, count: usize },

    #[error("no shares given")]
    EmptyInput,

    #[error("too many shares given ({count} > {max})")]
    TooManyShares { count: usize, max: usize },

    #[error("share {index} is malformed: {reason}")]
    MalformedShare {
        index: usize,
        #[source]
        reason: MalformedReason,
    },

    #[error("failed to draw randomness: {0}")]
    RandomSource(#[source] rand::Error),

    #[error("failed to seal secret: {0}")]
    AeadEncryption(#[source] aead::Error),
}

#[cfg(test)]
pub(crate) fn arbitrary_fill_slice<S, T>(g: &mut quickcheck::Gen, mut slice: S)
where
    T: quickcheck::Arbitrary,
    S: AsMut<[T]>,
{
    slice.as_mut().fill_with(|| T::arbitrary(g))
}
