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

use crate::{
    shamir::gf::GfElem,
    wire::{self, to_array, FromWire},
    KEYSHARE_LENGTH, KEY_LENGTH,
};

/// Piece of a key which has been sharded with [Shamir Secret Sharing][sss].
///
/// On the wire a shard is its x-value (a single non-zero byte) followed by
/// one y-value per byte of the key.
///
/// [sss]: https://en.wikipedia.org/wiki/Shamir%27s_Secret_Sharing
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Shard {
    pub(super) x: GfElem,
    pub(super) ys: Vec<GfElem>,
}

impl Shard {
    pub const WIRE_LENGTH: usize = KEYSHARE_LENGTH;

    /// Returns the x-value of this `Shard`.
    ///
    /// Two shards with the same index cannot be used together for secret
    /// recovery.
    pub fn index(&self) -> u8 {
        self.x.inner()
    }

    pub fn to_bytes(&self) -> [u8; KEYSHARE_LENGTH] {
        let mut bytes = [0u8; KEYSHARE_LENGTH];
        bytes[0] = self.x.inner();
        bytes[1..]
            .iter_mut()
            .zip(&self.ys)
            .for_each(|(b, y)| *b = y.inner());
        bytes
    }
}

impl FromWire for Shard {
    fn from_wire_partial(input: &[u8]) -> Result<(&[u8], Self), wire::Error> {
        use nom::{bytes::complete::take, number::complete::be_u8, sequence::tuple, IResult};

        fn parse(input: &[u8]) -> IResult<&[u8], (u8, &[u8])> {
            tuple((be_u8, take(KEY_LENGTH)))(input)
        }

        let (remain, (x, ys)) = parse(input).map_err(|_| wire::Error::WrongLength {
            expected: Self::WIRE_LENGTH,
            actual: input.len(),
        })?;

        if x == 0 {
            return Err(wire::Error::ZeroIndex);
        }

        let ys: [u8; KEY_LENGTH] = to_array(ys);
        Ok((
            remain,
            Shard {
                x: GfElem::from_inner(x),
                ys: ys.iter().copied().map(GfElem::from_inner).collect(),
            },
        ))
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Shard {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self {
            x: GfElem::from_inner(1 + u8::arbitrary(g) % 255),
            ys: (0..KEY_LENGTH).map(|_| GfElem::arbitrary(g)).collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[quickcheck]
    fn shard_bytes_roundtrip(shard: Shard) {
        let wire = shard.to_bytes();
        assert_eq!(wire.len(), Shard::WIRE_LENGTH);
        assert_eq!(wire[0], shard.index());
        let shard2 = Shard::from_wire(&wire).unwrap();
        assert_eq!(shard, shard2);
    }

    #[quickcheck]
    fn shard_wrong_length(shard: Shard, len: usize) -> bool {
        let len = len % (2 * Shard::WIRE_LENGTH);
        let mut wire = shard.to_bytes().to_vec();
        wire.resize(len, 0xaa);
        match Shard::from_wire(&wire) {
            Ok(_) => len == Shard::WIRE_LENGTH,
            Err(wire::Error::WrongLength { actual, .. }) => actual == len,
            Err(_) => false,
        }
    }

    #[test]
    fn shard_zero_index() {
        let mut wire = [0x42u8; Shard::WIRE_LENGTH];
        wire[0] = 0;
        assert_eq!(Shard::from_wire(wire), Err(wire::Error::ZeroIndex));
    }
}
