use crate::acorn_assert_moderate;
use crate::acorn_assert_simple;
use crate::engine::search_tree::HistoryId;

/// Sentinel for "no value above"; variable bounds must lie strictly inside
/// the sentinel range so that arithmetic on bounds cannot overflow.
pub const PLUS_INFINITY: i32 = i32::MAX / 2;
/// Sentinel for "no value below".
pub const MINUS_INFINITY: i32 = -PLUS_INFINITY;

const WORD_BITS: usize = u64::BITS as usize;

/// The domain of a single constrained variable.
///
/// The domain is always the range `[min_val, max_val]` minus interior holes.
/// While no hole exists the domain is represented by the bounds alone
/// (bounds-consistency fast path); the first removal that splits the range
/// lazily promotes the representation to a bit vector. The bit vector is
/// based at `min_dom`, the lower bound at promotion time; bounds only ever
/// shrink, so every later value fits above that base.
///
/// Emptiness is never represented: a removal that would wipe out the domain
/// is refused and reported to the caller instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BitsetDomain {
    /// Base value of bit 0 of `bits`. Meaningless while `bits` is `None`.
    min_dom: i32,
    min_val: i32,
    max_val: i32,
    /// Number of values currently present. Always consistent with the
    /// representation.
    set_count: u32,
    bits: Option<Vec<u64>>,
    /// Identifies the search frame in which this domain was last snapshotted,
    /// so it is saved at most once per frame generation.
    pub(crate) last_save_id: HistoryId,
}

impl BitsetDomain {
    pub(crate) fn new(min_val: i32, max_val: i32) -> BitsetDomain {
        acorn_assert_simple!(
            min_val <= max_val && min_val > MINUS_INFINITY && max_val < PLUS_INFINITY,
            "cannot create an empty or unbounded domain [{min_val}, {max_val}]"
        );

        BitsetDomain {
            min_dom: min_val,
            min_val,
            max_val,
            set_count: range_len(min_val, max_val),
            bits: None,
            last_save_id: HistoryId::NONE,
        }
    }

    pub(crate) fn min(&self) -> i32 {
        self.min_val
    }

    pub(crate) fn max(&self) -> i32 {
        self.max_val
    }

    pub(crate) fn size(&self) -> u32 {
        self.set_count
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.set_count == 1
    }

    /// Whether the domain is the contiguous range `[min, max]` without holes.
    pub(crate) fn is_continuous(&self) -> bool {
        self.bits.is_none()
    }

    pub(crate) fn contains(&self, value: i32) -> bool {
        if value < self.min_val || value > self.max_val {
            return false;
        }
        match &self.bits {
            None => true,
            Some(words) => {
                let index = self.bit_index(value);
                (words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
            }
        }
    }

    /// Whether every value in `[lo, hi]` is present.
    pub(crate) fn contains_range(&self, lo: i32, hi: i32) -> bool {
        acorn_assert_simple!(lo <= hi);
        if lo < self.min_val || hi > self.max_val {
            return false;
        }
        match &self.bits {
            None => true,
            Some(_) => self.count_in_range(lo, hi) == range_len(lo, hi),
        }
    }

    /// Removes every value in `[lo, hi]`.
    ///
    /// Returns `false` without mutating anything when the removal would empty
    /// the domain; the pre-failure domain is preserved for reporting. A
    /// removal of values that are already absent is a no-op returning `true`.
    pub(crate) fn remove_range(&mut self, lo: i32, hi: i32) -> bool {
        let lo = lo.max(self.min_val);
        let hi = hi.min(self.max_val);
        if lo > hi {
            return true;
        }

        let removed = self.count_in_range(lo, hi);
        if removed == self.set_count {
            return false;
        }
        if removed == 0 {
            return true;
        }

        let splits_domain = lo > self.min_val && hi < self.max_val;
        if splits_domain && self.bits.is_none() {
            self.promote_to_bitset();
        }

        if let Some(_) = &self.bits {
            self.clear_range(lo, hi);
            self.set_count -= removed;
            if lo <= self.min_val {
                let new_min = self.next(hi);
                acorn_assert_moderate!(new_min < PLUS_INFINITY);
                self.min_val = new_min;
            }
            if hi >= self.max_val {
                let new_max = self.previous(lo);
                acorn_assert_moderate!(new_max > MINUS_INFINITY);
                self.max_val = new_max;
            }
        } else {
            // Still contiguous, so the removal shaves a prefix or a suffix.
            self.set_count -= removed;
            if lo <= self.min_val {
                self.min_val = hi + 1;
            } else {
                self.max_val = lo - 1;
            }
        }

        acorn_assert_moderate!(self.debug_invariants_hold());
        true
    }

    /// The smallest present value strictly greater than `value`, or
    /// [`PLUS_INFINITY`] when none exists.
    pub(crate) fn next(&self, value: i32) -> i32 {
        if value < self.min_val {
            return self.min_val;
        }
        if value >= self.max_val {
            return PLUS_INFINITY;
        }
        match &self.bits {
            None => value + 1,
            Some(words) => {
                let start = self.bit_index(value + 1);
                let mut word_index = start / WORD_BITS;
                // Mask away the bits below the starting position.
                let mut word = words[word_index] & (u64::MAX << (start % WORD_BITS));
                loop {
                    if word != 0 {
                        let index = word_index * WORD_BITS + word.trailing_zeros() as usize;
                        return self.value_at(index);
                    }
                    word_index += 1;
                    if word_index >= words.len() {
                        return PLUS_INFINITY;
                    }
                    word = words[word_index];
                }
            }
        }
    }

    /// The largest present value strictly less than `value`, or
    /// [`MINUS_INFINITY`] when none exists.
    pub(crate) fn previous(&self, value: i32) -> i32 {
        if value > self.max_val {
            return self.max_val;
        }
        if value <= self.min_val {
            return MINUS_INFINITY;
        }
        match &self.bits {
            None => value - 1,
            Some(words) => {
                let start = self.bit_index(value - 1);
                let mut word_index = start / WORD_BITS;
                let shift = WORD_BITS - 1 - (start % WORD_BITS);
                // Mask away the bits above the starting position.
                let mut word = words[word_index] & (u64::MAX >> shift);
                loop {
                    if word != 0 {
                        let index =
                            word_index * WORD_BITS + (WORD_BITS - 1 - word.leading_zeros() as usize);
                        return self.value_at(index);
                    }
                    if word_index == 0 {
                        return MINUS_INFINITY;
                    }
                    word_index -= 1;
                    word = words[word_index];
                }
            }
        }
    }

    /// The smallest *missing* value strictly greater than `value` within the
    /// bounds, or [`PLUS_INFINITY`] when the rest of the domain is contiguous.
    /// Used to enumerate holes.
    pub(crate) fn next_gap(&self, value: i32) -> i32 {
        let words = match &self.bits {
            // A contiguous domain has no interior gaps.
            None => return PLUS_INFINITY,
            Some(words) => words,
        };

        // Bounds are always present values, so gaps live strictly inside them.
        let start = (value + 1).max(self.min_val + 1);
        if start >= self.max_val {
            return PLUS_INFINITY;
        }

        let start_index = self.bit_index(start);
        let end_index = self.bit_index(self.max_val);
        let mut word_index = start_index / WORD_BITS;
        // Look for zero bits: set the bits below the start so they are
        // ignored, then skip all-ones words in one step each.
        let mut word = words[word_index] | !(u64::MAX << (start_index % WORD_BITS));
        loop {
            if word != u64::MAX {
                let index = word_index * WORD_BITS + word.trailing_ones() as usize;
                if index >= end_index {
                    return PLUS_INFINITY;
                }
                return self.value_at(index);
            }
            word_index += 1;
            acorn_assert_moderate!(word_index < words.len(), "max_val bit must stop the scan");
            word = words[word_index];
        }
    }

    /// Iterator over the present values in increasing order.
    pub(crate) fn iter(&self) -> DomainValueIter<'_> {
        DomainValueIter {
            domain: self,
            cursor: MINUS_INFINITY,
        }
    }

    fn bit_index(&self, value: i32) -> usize {
        // Widen before subtracting: `value - min_dom` itself cannot overflow
        // within the sentinel range, but keeping the arithmetic in i64 keeps
        // the sign handling obvious when min_dom is negative.
        let index = i64::from(value) - i64::from(self.min_dom);
        acorn_assert_moderate!(index >= 0);
        index as usize
    }

    fn value_at(&self, bit_index: usize) -> i32 {
        (i64::from(self.min_dom) + bit_index as i64) as i32
    }

    /// Number of present values in `[lo, hi]`; both ends must be within the
    /// current bounds.
    fn count_in_range(&self, lo: i32, hi: i32) -> u32 {
        acorn_assert_moderate!(lo >= self.min_val && hi <= self.max_val && lo <= hi);
        let words = match &self.bits {
            None => return range_len(lo, hi),
            Some(words) => words,
        };

        let lo_index = self.bit_index(lo);
        let hi_index = self.bit_index(hi);
        let first_word = lo_index / WORD_BITS;
        let last_word = hi_index / WORD_BITS;

        let mut count = 0u32;
        for word_index in first_word..=last_word {
            let mut word = words[word_index];
            if word == 0 {
                continue;
            }
            if word_index == first_word {
                word &= u64::MAX << (lo_index % WORD_BITS);
            }
            if word_index == last_word {
                let upper = hi_index % WORD_BITS;
                word &= u64::MAX >> (WORD_BITS - 1 - upper);
            }
            count += word.count_ones();
        }
        count
    }

    /// Clears the bits for `[lo, hi]`. Only called with `bits` allocated.
    fn clear_range(&mut self, lo: i32, hi: i32) {
        let lo_index = self.bit_index(lo);
        let hi_index = self.bit_index(hi);
        let first_word = lo_index / WORD_BITS;
        let last_word = hi_index / WORD_BITS;
        let words = self.bits.as_mut().expect("caller ensures bits exist");

        for word_index in first_word..=last_word {
            let mut mask = u64::MAX;
            if word_index == first_word {
                mask &= u64::MAX << (lo_index % WORD_BITS);
            }
            if word_index == last_word {
                let upper = hi_index % WORD_BITS;
                mask &= u64::MAX >> (WORD_BITS - 1 - upper);
            }
            words[word_index] &= !mask;
        }
    }

    /// Switches to the bit-vector representation, sized to the *current*
    /// bounds since bounds only ever shrink.
    fn promote_to_bitset(&mut self) {
        acorn_assert_simple!(self.bits.is_none());
        self.min_dom = self.min_val;

        let num_bits = self.bit_index(self.max_val) + 1;
        let num_words = num_bits.div_ceil(WORD_BITS);
        let mut words = vec![u64::MAX; num_words];
        // Mask off the bits above max_val in the final word.
        let upper = (num_bits - 1) % WORD_BITS;
        words[num_words - 1] &= u64::MAX >> (WORD_BITS - 1 - upper);

        self.bits = Some(words);
    }

    fn debug_invariants_hold(&self) -> bool {
        self.min_val <= self.max_val
            && self.contains(self.min_val)
            && self.contains(self.max_val)
            && self.set_count >= 1
            && (self.bits.is_some() || self.set_count == range_len(self.min_val, self.max_val))
    }
}

fn range_len(lo: i32, hi: i32) -> u32 {
    (i64::from(hi) - i64::from(lo) + 1) as u32
}

#[derive(Debug)]
pub(crate) struct DomainValueIter<'a> {
    domain: &'a BitsetDomain,
    cursor: i32,
}

impl Iterator for DomainValueIter<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        let next = self.domain.next(self.cursor);
        if next == PLUS_INFINITY {
            None
        } else {
            self.cursor = next;
            Some(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enumerate(domain: &BitsetDomain) -> Vec<i32> {
        domain.iter().collect()
    }

    #[test]
    fn contiguous_domain_basics() {
        let domain = BitsetDomain::new(-3, 4);
        assert_eq!(domain.min(), -3);
        assert_eq!(domain.max(), 4);
        assert_eq!(domain.size(), 8);
        assert!(domain.is_continuous());
        assert!(domain.contains_range(-3, 4));
        assert_eq!(enumerate(&domain), (-3..=4).collect::<Vec<_>>());
    }

    #[test]
    fn prefix_and_suffix_removal_stay_contiguous() {
        let mut domain = BitsetDomain::new(0, 9);
        assert!(domain.remove_range(MINUS_INFINITY, 2));
        assert!(domain.remove_range(8, PLUS_INFINITY));
        assert!(domain.is_continuous());
        assert_eq!(domain.min(), 3);
        assert_eq!(domain.max(), 7);
        assert_eq!(domain.size(), 5);
    }

    #[test]
    fn interior_removal_promotes_to_bitset() {
        let mut domain = BitsetDomain::new(0, 9);
        assert!(domain.remove_range(4, 6));
        assert!(!domain.is_continuous());
        assert_eq!(domain.size(), 7);
        assert_eq!(enumerate(&domain), vec![0, 1, 2, 3, 7, 8, 9]);
        assert!(!domain.contains(5));
        assert!(domain.contains_range(0, 3));
        assert!(!domain.contains_range(3, 7));
    }

    #[test]
    fn removal_that_would_empty_is_refused_and_unapplied() {
        let mut domain = BitsetDomain::new(2, 5);
        assert!(!domain.remove_range(0, 10));
        assert_eq!(domain.min(), 2);
        assert_eq!(domain.max(), 5);
        assert_eq!(domain.size(), 4);

        assert!(domain.remove_range(3, 3));
        assert!(!domain.remove_range(2, 5));
        assert_eq!(enumerate(&domain), vec![2, 4, 5]);
    }

    #[test]
    fn bound_removal_skips_holes() {
        let mut domain = BitsetDomain::new(0, 9);
        assert!(domain.remove_range(7, 8));
        // Removing the old maximum must land the new maximum below the hole.
        assert!(domain.remove_range(9, 9));
        assert_eq!(domain.max(), 6);
        assert!(domain.remove_range(1, 2));
        assert!(domain.remove_range(0, 0));
        assert_eq!(domain.min(), 3);
        assert_eq!(enumerate(&domain), vec![3, 4, 5, 6]);
    }

    #[test]
    fn next_and_previous_with_holes() {
        let mut domain = BitsetDomain::new(0, 200);
        assert!(domain.remove_range(10, 150));
        assert_eq!(domain.next(9), 151);
        assert_eq!(domain.next(200), PLUS_INFINITY);
        assert_eq!(domain.previous(151), 9);
        assert_eq!(domain.previous(0), MINUS_INFINITY);
        assert_eq!(domain.next(MINUS_INFINITY), 0);
        assert_eq!(domain.previous(PLUS_INFINITY), 200);
    }

    #[test]
    fn next_gap_enumerates_holes() {
        let mut domain = BitsetDomain::new(0, 10);
        assert_eq!(domain.next_gap(MINUS_INFINITY), PLUS_INFINITY);
        assert!(domain.remove_range(3, 4));
        assert!(domain.remove_range(7, 7));
        assert_eq!(domain.next_gap(0), 3);
        assert_eq!(domain.next_gap(3), 4);
        assert_eq!(domain.next_gap(4), 7);
        assert_eq!(domain.next_gap(7), PLUS_INFINITY);
    }

    #[test]
    fn negative_minimum_bit_offsets() {
        let mut domain = BitsetDomain::new(-100, 100);
        assert!(domain.remove_range(-50, 50));
        assert_eq!(domain.size(), 100);
        assert!(domain.contains(-51));
        assert!(!domain.contains(0));
        assert_eq!(domain.next(-51), 51);
        assert_eq!(domain.previous(51), -51);
    }

    #[test]
    fn size_always_matches_enumeration() {
        let mut domain = BitsetDomain::new(-5, 70);
        let removals = [(0, 3), (60, 70), (-5, -5), (10, 10), (40, 41)];
        for (lo, hi) in removals {
            assert!(domain.remove_range(lo, hi));
            assert_eq!(domain.size() as usize, enumerate(&domain).len());
        }
    }

    #[test]
    fn snapshot_restore_is_bit_identical() {
        let mut domain = BitsetDomain::new(0, 63);
        assert!(domain.remove_range(10, 20));
        let snapshot = domain.clone();
        assert!(domain.remove_range(30, 40));
        assert!(domain.remove_range(0, 5));
        domain = snapshot.clone();
        assert_eq!(domain, snapshot);
        assert_eq!(domain.size() as usize, enumerate(&domain).len());
    }
}
