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

//! Fixed-length wire encodings.
//!
//! None of the encodings carry a version or length prefix -- every object
//! has exactly one size, so a buffer of the wrong size is simply malformed.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("expected {expected} bytes but got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("share index must be non-zero")]
    ZeroIndex,
}

pub trait FromWire: Sized {
    fn from_wire_partial(input: &[u8]) -> Result<(&[u8], Self), Error>;

    fn from_wire<B: AsRef<[u8]>>(input: B) -> Result<Self, Error> {
        let input = input.as_ref();
        match Self::from_wire_partial(input)? {
            ([], ret) => Ok(ret),
            (remain, _) => Err(Error::WrongLength {
                expected: input.len() - remain.len(),
                actual: input.len(),
            }),
        }
    }
}

/// Copy a slice produced by a fixed-size `nom::bytes::complete::take` into an
/// array.
pub(crate) fn to_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut buffer = [0u8; N];
    buffer
        .iter_mut()
        .zip(bytes)
        .for_each(|(dst, src)| *dst = *src);
    buffer
}
