//! Chronologically ordered record keys.
//!
//! Push ids are 20 characters: 8 characters encoding the creation time in
//! milliseconds followed by 12 random characters. The alphabet is in ASCII
//! order, so lexicographic order of ids equals creation order. Ids minted
//! within the same millisecond increment the random tail instead of
//! re-rolling it, which keeps them strictly increasing per generator.

use rand::Rng;

/// 64-symbol alphabet, sorted by ASCII code.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIME_LEN: usize = 8;
const RANDOM_LEN: usize = 12;

/// Total length of a generated id.
pub const PUSH_ID_LEN: usize = TIME_LEN + RANDOM_LEN;

/// Stateful push-id generator. One per store connection.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    last_millis: u64,
    last_random: [u8; RANDOM_LEN],
}

impl PushIdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints the next id for wall-clock time `now_millis`.
    ///
    /// A clock that steps backwards is clamped to the last seen time, so
    /// ids never go backwards either.
    pub fn next_id(&mut self, now_millis: u64) -> String {
        let mut millis = now_millis.max(self.last_millis);

        if millis == self.last_millis && !self.is_unset() {
            if !increment(&mut self.last_random) {
                // Tail exhausted inside one millisecond: borrow the next one.
                millis += 1;
                self.reroll();
            }
        } else {
            self.reroll();
        }
        self.last_millis = millis;

        let mut id = String::with_capacity(PUSH_ID_LEN);
        let mut time_chars = [0u8; TIME_LEN];
        let mut remaining = millis;
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[usize::try_from(remaining % 64).unwrap_or_default()];
            remaining /= 64;
        }
        id.extend(time_chars.iter().map(|b| char::from(*b)));
        id.extend(
            self.last_random
                .iter()
                .map(|idx| char::from(PUSH_CHARS[usize::from(*idx)])),
        );
        id
    }

    fn is_unset(&self) -> bool {
        self.last_millis == 0 && self.last_random == [0; RANDOM_LEN]
    }

    fn reroll(&mut self) {
        let mut rng = rand::rng();
        for slot in &mut self.last_random {
            *slot = rng.random_range(0..64);
        }
    }
}

/// Adds one to a base-64 digit string. Returns `false` on overflow.
fn increment(digits: &mut [u8; RANDOM_LEN]) -> bool {
    for digit in digits.iter_mut().rev() {
        if *digit < 63 {
            *digit += 1;
            return true;
        }
        *digit = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn ids_have_fixed_length_and_alphabet() {
        let mut generator = PushIdGenerator::new();
        let id = generator.next_id(1_700_000_000_000);
        assert_eq!(id.len(), PUSH_ID_LEN);
        assert!(id.bytes().all(|b| PUSH_CHARS.contains(&b)));
    }

    #[test]
    fn same_millisecond_ids_are_increasing() {
        let mut generator = PushIdGenerator::new();
        let first = generator.next_id(42);
        let second = generator.next_id(42);
        let third = generator.next_id(42);
        assert!(first < second);
        assert!(second < third);
        assert_eq!(first[..TIME_LEN], second[..TIME_LEN]);
    }

    #[test]
    fn clock_skew_does_not_reorder() {
        let mut generator = PushIdGenerator::new();
        let later = generator.next_id(10_000);
        let earlier_clock = generator.next_id(5_000);
        assert!(later < earlier_clock);
    }

    #[test]
    fn exhausted_tail_rolls_into_next_millisecond() {
        let mut generator = PushIdGenerator::new();
        let first = generator.next_id(7);
        generator.last_random = [63; RANDOM_LEN];
        let next = generator.next_id(7);
        assert!(first < next);
        assert_eq!(generator.last_millis, 8);
    }

    #[test]
    fn increment_carries() {
        let mut digits = [0u8; RANDOM_LEN];
        digits[RANDOM_LEN - 1] = 63;
        assert!(increment(&mut digits));
        assert_eq!(digits[RANDOM_LEN - 1], 0);
        assert_eq!(digits[RANDOM_LEN - 2], 1);
    }

    proptest! {
        #[test]
        fn ids_sort_in_creation_order(mut times in prop::collection::vec(1u64..4_000_000_000_000, 1..40)) {
            times.sort_unstable();
            let mut generator = PushIdGenerator::new();
            let ids: Vec<String> = times.iter().map(|t| generator.next_id(*t)).collect();
            for pair in ids.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
        }
    }
}
