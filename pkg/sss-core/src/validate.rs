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

use crate::{Error, MalformedReason, MAX_COMBINE_SHARES, MAX_SHARE_COUNT};

use itertools::Itertools;

/// Check the share count `n` and threshold `k` for a split, returning them
/// as the byte-sized values the dealer works with.
///
/// `n` must be in `[1, 255]` and `k` must be in `[1, n]`.
pub fn validate_split_params(count: usize, threshold: usize) -> Result<(u8, u8), Error> {
    let count = match u8::try_from(count) {
        Ok(n) if n >= 1 && usize::from(n) <= MAX_SHARE_COUNT => n,
        _ => return Err(Error::InvalidCount { count }),
    };
    match u8::try_from(threshold) {
        Ok(k) if k >= 1 && k <= count => Ok((count, k)),
        _ => Err(Error::InvalidThreshold {
            threshold,
            count: count.into(),
        }),
    }
}

/// Check the list of shares handed to a combine operation, where every share
/// must be exactly `share_len` bytes long.
///
/// Between 1 and 254 shares may be combined.
pub fn validate_combine_input<S: AsRef<[u8]>>(shares: &[S], share_len: usize) -> Result<(), Error> {
    if shares.is_empty() {
        return Err(Error::EmptyInput);
    }
    if shares.len() > MAX_COMBINE_SHARES {
        return Err(Error::TooManyShares {
            count: shares.len(),
            max: MAX_COMBINE_SHARES,
        });
    }
    match shares
        .iter()
        .map(AsRef::as_ref)
        .find_position(|share| share.len() != share_len)
    {
        Some((index, share)) => Err(Error::MalformedShare {
            index,
            reason: MalformedReason::Length {
                expected: share_len,
                actual: share.len(),
            },
        }),
        None => Ok(()),
    }
}

/// Remove exact duplicates, keeping the first copy of each along with its
/// position in the input.
///
/// Items are compared by their wire bytes, so two shares with the same index
/// but a different payload are *not* duplicates -- they both survive.
pub(crate) fn dedup_shares<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<(usize, T)>
where
    K: Eq + std::hash::Hash,
    F: Fn(&T) -> K,
{
    items
        .into_iter()
        .enumerate()
        .unique_by(|(_, item)| key(item))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[quickcheck]
    fn split_params(count: usize, threshold: usize) -> bool {
        let count = count % 300;
        let threshold = threshold % 300;
        let valid = (1..=255).contains(&count) && (1..=count).contains(&threshold);
        match validate_split_params(count, threshold) {
            Ok((n, k)) => valid && usize::from(n) == count && usize::from(k) == threshold,
            Err(Error::InvalidCount { count: c }) => !(1..=255).contains(&count) && c == count,
            Err(Error::InvalidThreshold { threshold: t, count: c }) => {
                (1..=255).contains(&count) && !valid && t == threshold && c == count
            }
            Err(_) => false,
        }
    }

    #[test]
    fn split_params_bounds() {
        assert!(matches!(
            validate_split_params(0, 1),
            Err(Error::InvalidCount { count: 0 })
        ));
        assert!(matches!(
            validate_split_params(256, 1),
            Err(Error::InvalidCount { count: 256 })
        ));
        assert!(matches!(
            validate_split_params(5, 6),
            Err(Error::InvalidThreshold {
                threshold: 6,
                count: 5
            })
        ));
        assert!(matches!(
            validate_split_params(5, 0),
            Err(Error::InvalidThreshold { threshold: 0, .. })
        ));
        assert_eq!(validate_split_params(255, 255).unwrap(), (255, 255));
        assert_eq!(validate_split_params(1, 1).unwrap(), (1, 1));
    }

    #[test]
    fn combine_input_counts() {
        let none: [[u8; 4]; 0] = [];
        assert!(matches!(
            validate_combine_input(&none, 4),
            Err(Error::EmptyInput)
        ));

        let max = vec![[0u8; 4]; MAX_COMBINE_SHARES];
        assert!(validate_combine_input(&max, 4).is_ok());

        let too_many = vec![[0u8; 4]; MAX_COMBINE_SHARES + 1];
        assert!(matches!(
            validate_combine_input(&too_many, 4),
            Err(Error::TooManyShares { count: 255, max: 254 })
        ));
    }

    #[test]
    fn combine_input_lengths() {
        let shares = vec![vec![0u8; 4], vec![0u8; 4], vec![0u8; 3], vec![0u8; 5]];
        match validate_combine_input(&shares, 4) {
            Err(Error::MalformedShare {
                index,
                reason: MalformedReason::Length { expected, actual },
            }) => {
                assert_eq!(index, 2);
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("expected MalformedShare, got {:?}", other),
        }
    }

    #[test]
    fn dedup_keeps_first_positions() {
        let items = vec![[1u8, 2], [1, 3], [1, 2], [4, 4], [1, 3]];
        let unique = dedup_shares(items, |item| *item);
        assert_eq!(unique, vec![(0, [1, 2]), (1, [1, 3]), (3, [4, 4])]);
    }

    #[test]
    fn dedup_same_index_different_payload() {
        // Contradictory shares are not duplicates.
        let items = vec![[7u8, 0], [7, 1]];
        assert_eq!(dedup_shares(items, |item| *item).len(), 2);
    }
}
