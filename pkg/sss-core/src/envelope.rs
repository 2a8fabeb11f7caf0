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

//! Authenticated encryption of the secret under a one-time key.
//!
//! Shamir shards on their own are malleable and give no indication when too
//! few of them were combined. So the secret itself is never sharded: it is
//! sealed under a fresh random key, and only that key is sharded. Combining
//! the wrong shards yields the wrong key, which fails the authentication tag
//! check when opening the envelope.

use crate::{
    wire::{self, to_array, FromWire},
    Error, ENVELOPE_LENGTH, KEY_LENGTH, SECRET_LENGTH,
};

use aead::{generic_array::GenericArray, AeadCore, AeadInPlace, KeyInit, KeySizeUser};
use chacha20poly1305::ChaCha20Poly1305;
use rand::{CryptoRng, RngCore};
use typenum::Unsigned;
use zeroize::Zeroizing;

/// One-time key for a [`SealedEnvelope`].
pub type EnvelopeKey = [u8; KEY_LENGTH];

/// Length of the authentication tag appended to the ciphertext.
pub const TAG_LENGTH: usize = ENVELOPE_LENGTH - SECRET_LENGTH;

type ChaChaPolyNonce = GenericArray<u8, <ChaCha20Poly1305 as AeadCore>::NonceSize>;

const CHACHAPOLY_KEY_LENGTH: usize = <<ChaCha20Poly1305 as KeySizeUser>::KeySize as Unsigned>::USIZE;
const CHACHAPOLY_TAG_LENGTH: usize = <<ChaCha20Poly1305 as AeadCore>::TagSize as Unsigned>::USIZE;

const _: () = assert!(CHACHAPOLY_KEY_LENGTH == KEY_LENGTH);
const _: () = assert!(CHACHAPOLY_TAG_LENGTH == TAG_LENGTH);

/// A secret sealed with an authenticated cipher.
///
/// Every share produced by one split carries an identical copy of the
/// envelope.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SealedEnvelope {
    ciphertext: [u8; SECRET_LENGTH],
    tag: [u8; TAG_LENGTH],
}

impl SealedEnvelope {
    pub const WIRE_LENGTH: usize = ENVELOPE_LENGTH;

    pub fn new(ciphertext: [u8; SECRET_LENGTH], tag: [u8; TAG_LENGTH]) -> Self {
        Self { ciphertext, tag }
    }

    pub fn ciphertext(&self) -> &[u8; SECRET_LENGTH] {
        &self.ciphertext
    }

    pub fn tag(&self) -> &[u8; TAG_LENGTH] {
        &self.tag
    }

    pub fn to_bytes(&self) -> [u8; ENVELOPE_LENGTH] {
        let mut bytes = [0u8; ENVELOPE_LENGTH];
        let (ciphertext, tag) = bytes.split_at_mut(SECRET_LENGTH);
        ciphertext.copy_from_slice(&self.ciphertext);
        tag.copy_from_slice(&self.tag);
        bytes
    }
}

impl FromWire for SealedEnvelope {
    fn from_wire_partial(input: &[u8]) -> Result<(&[u8], Self), wire::Error> {
        use nom::{bytes::complete::take, sequence::tuple, IResult};

        fn parse(input: &[u8]) -> IResult<&[u8], (&[u8], &[u8])> {
            tuple((take(SECRET_LENGTH), take(TAG_LENGTH)))(input)
        }

        let (remain, (ciphertext, tag)) = parse(input).map_err(|_| wire::Error::WrongLength {
            expected: Self::WIRE_LENGTH,
            actual: input.len(),
        })?;

        Ok((remain, Self::new(to_array(ciphertext), to_array(tag))))
    }
}

/// An authenticated cipher used to seal secrets under one-time keys.
///
/// Implementations may use a fixed nonce: every key passed to `seal` is
/// freshly generated and never used for a second message.
pub trait EnvelopeCipher {
    /// Encrypt and authenticate `secret` under `key`.
    fn seal(
        &self,
        key: &EnvelopeKey,
        secret: &[u8; SECRET_LENGTH],
    ) -> Result<SealedEnvelope, aead::Error>;

    /// Verify and decrypt `envelope` under `key`. Returns `None` if the tag
    /// does not match, in which case no plaintext is released.
    fn open(
        &self,
        key: &EnvelopeKey,
        envelope: &SealedEnvelope,
    ) -> Option<Zeroizing<[u8; SECRET_LENGTH]>>;
}

/// ChaCha20-Poly1305 with an all-zero nonce and no associated data.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChaChaPoly;

impl ChaChaPoly {
    fn aead(key: &EnvelopeKey) -> ChaCha20Poly1305 {
        // Cannot panic, the key lengths are checked at compile time.
        ChaCha20Poly1305::new(GenericArray::from_slice(key))
    }
}

impl EnvelopeCipher for ChaChaPoly {
    fn seal(
        &self,
        key: &EnvelopeKey,
        secret: &[u8; SECRET_LENGTH],
    ) -> Result<SealedEnvelope, aead::Error> {
        let mut ciphertext = *secret;
        let tag = Self::aead(key).encrypt_in_place_detached(
            &ChaChaPolyNonce::default(),
            b"",
            &mut ciphertext,
        )?;
        Ok(SealedEnvelope::new(ciphertext, to_array(&tag)))
    }

    fn open(
        &self,
        key: &EnvelopeKey,
        envelope: &SealedEnvelope,
    ) -> Option<Zeroizing<[u8; SECRET_LENGTH]>> {
        let mut plaintext = Zeroizing::new(envelope.ciphertext);
        Self::aead(key)
            .decrypt_in_place_detached(
                &ChaChaPolyNonce::default(),
                b"",
                &mut plaintext[..],
                GenericArray::from_slice(&envelope.tag),
            )
            .ok()?;
        Some(plaintext)
    }
}

/// Seal `secret` under a fresh key drawn from `r`.
///
/// The returned key must be handed to the dealer and then dropped -- it
/// must never be used to seal anything else.
pub fn seal<R, C>(
    r: &mut R,
    cipher: &C,
    secret: &[u8; SECRET_LENGTH],
) -> Result<(SealedEnvelope, Zeroizing<EnvelopeKey>), Error>
where
    R: CryptoRng + RngCore + ?Sized,
    C: EnvelopeCipher + ?Sized,
{
    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    r.try_fill_bytes(&mut key[..])
        .map_err(Error::RandomSource)?;
    let envelope = cipher.seal(&key, secret).map_err(Error::AeadEncryption)?;
    Ok((envelope, key))
}

/// Open `envelope` with a (possibly wrong) key. `None` means no secret could
/// be recovered.
pub fn open<C>(
    cipher: &C,
    envelope: &SealedEnvelope,
    key: &EnvelopeKey,
) -> Option<Zeroizing<[u8; SECRET_LENGTH]>>
where
    C: EnvelopeCipher + ?Sized,
{
    cipher.open(key, envelope)
}

#[cfg(test)]
impl quickcheck::Arbitrary for SealedEnvelope {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let mut ciphertext = [0u8; SECRET_LENGTH];
        let mut tag = [0u8; TAG_LENGTH];
        crate::arbitrary_fill_slice(g, &mut ciphertext);
        crate::arbitrary_fill_slice(g, &mut tag);
        Self { ciphertext, tag }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn check_length_consts() {
        // GenericArray doesn't give us a way to get the size, so we need to do
        // this in a test...
        assert_eq!(KEY_LENGTH, CHACHAPOLY_KEY_LENGTH);
        assert_eq!(12, ChaChaPolyNonce::default().len());
        assert_eq!(SealedEnvelope::WIRE_LENGTH, SECRET_LENGTH + TAG_LENGTH);
    }

    #[quickcheck]
    fn envelope_bytes_roundtrip(envelope: SealedEnvelope) -> bool {
        SealedEnvelope::from_wire(envelope.to_bytes()).unwrap() == envelope
    }

    #[quickcheck]
    fn seal_open_roundtrip(seed: u64, fill: u8) -> bool {
        let secret = [fill; SECRET_LENGTH];
        let (envelope, key) = seal(&mut StdRng::seed_from_u64(seed), &ChaChaPoly, &secret).unwrap();
        match open(&ChaChaPoly, &envelope, &key) {
            Some(plaintext) => *plaintext == secret,
            None => false,
        }
    }

    #[test]
    fn ciphertext_is_not_plaintext() {
        let secret = [0x2a; SECRET_LENGTH];
        let (envelope, _) = seal(&mut StdRng::seed_from_u64(0), &ChaChaPoly, &secret).unwrap();
        assert_ne!(envelope.ciphertext(), &secret);
    }

    #[quickcheck]
    fn tampered_envelope_fails(seed: u64, byte: usize, bit: u8) -> bool {
        let secret = [0x2a; SECRET_LENGTH];
        let (envelope, key) = seal(&mut StdRng::seed_from_u64(seed), &ChaChaPoly, &secret).unwrap();

        let mut bytes = envelope.to_bytes();
        bytes[byte % ENVELOPE_LENGTH] ^= 1 << (bit % 8);
        let tampered = SealedEnvelope::from_wire(bytes).unwrap();

        open(&ChaChaPoly, &tampered, &key).is_none()
    }

    #[quickcheck]
    fn wrong_key_fails(seed: u64, byte: usize, bit: u8) -> bool {
        let secret = [0x2a; SECRET_LENGTH];
        let (envelope, key) = seal(&mut StdRng::seed_from_u64(seed), &ChaChaPoly, &secret).unwrap();

        let mut wrong_key = *key;
        wrong_key[byte % KEY_LENGTH] ^= 1 << (bit % 8);

        open(&ChaChaPoly, &envelope, &wrong_key).is_none()
    }
}
