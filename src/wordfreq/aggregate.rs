use std::borrow::Borrow;

use super::count::WordCounts;

impl WordCounts {
    /// Add every count in `other` into `self`.
    pub fn merge_from(&mut self, other: &WordCounts) {
        for (word, &n) in other {
            self.add(word, n);
        }
    }
}

/// Sum per-segment counts into one table.
///
/// Summation is associative and commutative, so the input order never
/// changes the result. Empty tables contribute nothing.
pub fn merge<I>(results: I) -> WordCounts
where
    I: IntoIterator,
    I::Item: Borrow<WordCounts>,
{
    let mut total = WordCounts::new();
    for c in results {
        let c = c.borrow();
        if c.is_empty() {
            continue;
        }
        if total.is_empty() {
            total = c.clone();
        } else {
            total.merge_from(c);
        }
    }
    total
}
