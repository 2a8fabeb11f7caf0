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
    envelope::{self, ChaChaPoly, EnvelopeCipher, EnvelopeKey, SealedEnvelope},
    shamir::{self, gf, Shard},
    validate::{dedup_shares, validate_combine_input, validate_split_params},
    wire::{self, FromWire},
    Error, MalformedReason, KEYSHARE_LENGTH, KEY_LENGTH, SECRET_LENGTH, SHARE_LENGTH,
};

use log::{debug, warn};
use rand::{rngs::OsRng, CryptoRng, RngCore};
use zeroize::Zeroizing;

/// A key shard together with the envelope sealed under the key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Share {
    keyshare: Shard,
    envelope: SealedEnvelope,
}

impl Share {
    pub const WIRE_LENGTH: usize = SHARE_LENGTH;

    pub fn to_bytes(&self) -> [u8; SHARE_LENGTH] {
        let mut bytes = [0u8; SHARE_LENGTH];
        let (keyshare, envelope) = bytes.split_at_mut(Shard::WIRE_LENGTH);
        keyshare.copy_from_slice(&self.keyshare.to_bytes());
        envelope.copy_from_slice(&self.envelope.to_bytes());
        bytes
    }
}

impl FromWire for Share {
    fn from_wire_partial(input: &[u8]) -> Result<(&[u8], Self), wire::Error> {
        let (input, keyshare) = Shard::from_wire_partial(input)?;
        let (input, envelope) = SealedEnvelope::from_wire_partial(input)?;
        Ok((input, Share { keyshare, envelope }))
    }
}

fn parse_shares<T: FromWire, S: AsRef<[u8]>>(shares: &[S]) -> Result<Vec<T>, Error> {
    shares
        .iter()
        .enumerate()
        .map(|(index, share)| {
            T::from_wire(share).map_err(|err| Error::MalformedShare {
                index,
                reason: err.into(),
            })
        })
        .collect()
}

// Interpolate the key from deduplicated key shards. Positions refer to the
// caller's list of shares.
fn recover_key(keyshares: Vec<(usize, Shard)>) -> Result<Zeroizing<EnvelopeKey>, Error> {
    let (positions, keyshares): (Vec<_>, Vec<_>) = keyshares.into_iter().unzip();

    let recovered = shamir::recover_secret(&keyshares).map_err(|err| match err {
        shamir::Error::LagrangeError(gf::Error::NonInvertiblePoint { index }) => {
            Error::MalformedShare {
                index: positions[index],
                reason: MalformedReason::ConflictingIndex {
                    x: keyshares[index].index(),
                },
            }
        }
    })?;

    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    key.iter_mut()
        .zip(recovered.iter())
        .for_each(|(k, b)| *k = *b);
    Ok(key)
}

/// Split `secret` into `count` shares, any `threshold` of which can restore
/// it.
///
/// The secret is sealed under a one-time key and only the key is sharded, so
/// [`combine_shares`] can tell when it was given too few (or tampered)
/// shares. Each share is [`SHARE_LENGTH`] bytes long.
///
/// `count` must be in `[1, 255]` and `threshold` in `[1, count]`.
pub fn create_shares(
    secret: &[u8; SECRET_LENGTH],
    count: usize,
    threshold: usize,
) -> Result<Vec<[u8; SHARE_LENGTH]>, Error> {
    create_shares_with(&mut OsRng, &ChaChaPoly, secret, count, threshold)
}

/// [`create_shares`] with an explicit random source and cipher.
pub fn create_shares_with<R, C>(
    r: &mut R,
    cipher: &C,
    secret: &[u8; SECRET_LENGTH],
    count: usize,
    threshold: usize,
) -> Result<Vec<[u8; SHARE_LENGTH]>, Error>
where
    R: CryptoRng + RngCore + ?Sized,
    C: EnvelopeCipher + ?Sized,
{
    let (count, threshold) = validate_split_params(count, threshold)?;

    let (envelope, key) = envelope::seal(r, cipher, secret)?;
    let keyshares =
        shamir::split(&key[..], count, threshold, r).map_err(Error::RandomSource)?;
    debug!(
        "dealt {} shares with threshold {}",
        keyshares.len(),
        threshold
    );

    Ok(keyshares
        .into_iter()
        .map(|keyshare| {
            Share {
                keyshare,
                envelope: envelope.clone(),
            }
            .to_bytes()
        })
        .collect())
}

/// Restore the secret from shares created by [`create_shares`].
///
/// Every share must be exactly [`SHARE_LENGTH`] bytes. Shares which are
/// byte-for-byte identical are only counted once for interpolation, but every
/// given share counts towards the [`MAX_COMBINE_SHARES`](crate::MAX_COMBINE_SHARES) limit.
///
/// A split with a threshold of 255 can never be combined, since that needs
/// more shares than the limit allows.
///
/// Returns `Ok(None)` if no secret could be recovered from the shares. This
/// is not an error: it is how too few shares, shares from different splits,
/// or tampered shares show up. Callers must check for it.
pub fn combine_shares<S: AsRef<[u8]>>(
    shares: &[S],
) -> Result<Option<[u8; SECRET_LENGTH]>, Error> {
    combine_shares_with(&ChaChaPoly, shares)
}

/// [`combine_shares`] with an explicit cipher.
pub fn combine_shares_with<C, S>(
    cipher: &C,
    shares: &[S],
) -> Result<Option<[u8; SECRET_LENGTH]>, Error>
where
    C: EnvelopeCipher + ?Sized,
    S: AsRef<[u8]>,
{
    validate_combine_input(shares, Share::WIRE_LENGTH)?;
    let shares = parse_shares::<Share, _>(shares)?;

    // Every share of a split carries the same envelope. If they disagree the
    // shares cannot all have come from one split.
    let envelope = match shares.split_first() {
        Some((first, rest)) => {
            if let Some(position) = rest.iter().position(|s| s.envelope != first.envelope) {
                return Err(Error::MalformedShare {
                    index: position + 1,
                    reason: MalformedReason::EnvelopeMismatch,
                });
            }
            first.envelope.clone()
        }
        None => return Err(Error::EmptyInput),
    };

    let input_len = shares.len();
    let keyshares = dedup_shares(
        shares.into_iter().map(|share| share.keyshare),
        Shard::to_bytes,
    );
    debug!(
        "combining {} shares ({} after removing duplicates)",
        input_len,
        keyshares.len()
    );

    let key = match recover_key(keyshares) {
        Ok(key) => key,
        Err(Error::MalformedShare {
            reason: MalformedReason::ConflictingIndex { x },
            ..
        }) => {
            warn!("shares with index {} disagree, no secret recoverable", x);
            return Ok(None);
        }
        Err(err) => return Err(err),
    };

    match envelope::open(cipher, &envelope, &key) {
        Some(secret) => Ok(Some(*secret)),
        None => {
            warn!("envelope failed authentication, no secret recoverable");
            Ok(None)
        }
    }
}

/// Split a 32-byte key into `count` keyshares, any `threshold` of which can
/// restore it. Each keyshare is [`KEYSHARE_LENGTH`] bytes long.
///
/// **Hazardous.** Keyshares carry no integrity protection at all. Only use
/// this for keys which are uniformly random; for anything else a share
/// holder could tamper with their keyshare to steer the restored value. Use
/// [`create_shares`] unless you know exactly why you can't.
pub fn create_keyshares(
    key: &[u8; KEY_LENGTH],
    count: usize,
    threshold: usize,
) -> Result<Vec<[u8; KEYSHARE_LENGTH]>, Error> {
    create_keyshares_with(&mut OsRng, key, count, threshold)
}

/// [`create_keyshares`] with an explicit random source.
pub fn create_keyshares_with<R>(
    r: &mut R,
    key: &[u8; KEY_LENGTH],
    count: usize,
    threshold: usize,
) -> Result<Vec<[u8; KEYSHARE_LENGTH]>, Error>
where
    R: CryptoRng + RngCore + ?Sized,
{
    let (count, threshold) = validate_split_params(count, threshold)?;

    let keyshares = shamir::split(key, count, threshold, r).map_err(Error::RandomSource)?;
    debug!(
        "dealt {} keyshares with threshold {}",
        keyshares.len(),
        threshold
    );

    Ok(keyshares.iter().map(Shard::to_bytes).collect())
}

/// Restore a key from keyshares created by [`create_keyshares`].
///
/// **Hazardous.** If fewer keyshares are given than the threshold they were
/// created with, or any keyshare was altered, this returns the *wrong* key
/// with no indication that anything went wrong. There is no way to detect
/// this from the keyshares, so callers have to verify the key by using it
/// (for instance by decrypting something authenticated with it).
pub fn combine_keyshares<S: AsRef<[u8]>>(shares: &[S]) -> Result<[u8; KEY_LENGTH], Error> {
    validate_combine_input(shares, Shard::WIRE_LENGTH)?;
    let keyshares = parse_shares::<Shard, _>(shares)?;

    let input_len = keyshares.len();
    let keyshares = dedup_shares(keyshares, Shard::to_bytes);
    debug!(
        "combining {} keyshares ({} after removing duplicates)",
        input_len,
        keyshares.len()
    );

    recover_key(keyshares).map(|key| *key)
}
