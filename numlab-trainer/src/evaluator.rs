//! Answer evaluation
//!
//! Pure comparison of the learner's input against the expected answer.

use numlab_common::events::DigitStatus;

/// Per-position comparison, one entry per character of the expected answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitDiff(Vec<DigitStatus>);

impl DigitDiff {
    pub fn statuses(&self) -> &[DigitStatus] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every position is Correct
    pub fn all_correct(&self) -> bool {
        self.0.iter().all(|s| *s == DigitStatus::Correct)
    }

    pub fn count(&self, status: DigitStatus) -> usize {
        self.0.iter().filter(|s| **s == status).count()
    }

    pub fn into_vec(self) -> Vec<DigitStatus> {
        self.0
    }
}

/// Compare `actual` against `expected` position by position
///
/// Positions past the end of `actual` are Missing. Extra characters in
/// `actual` beyond the expected length are not represented.
///
/// # Examples
///
/// ```
/// use numlab_common::events::DigitStatus;
/// use numlab_trainer::evaluator::diff;
///
/// let d = diff("4821", "49");
/// assert_eq!(
///     d.statuses(),
///     &[DigitStatus::Correct, DigitStatus::Incorrect, DigitStatus::Missing, DigitStatus::Missing]
/// );
/// ```
pub fn diff(expected: &str, actual: &str) -> DigitDiff {
    let mut actual_chars = actual.chars();
    let statuses = expected
        .chars()
        .map(|want| match actual_chars.next() {
            None => DigitStatus::Missing,
            Some(got) if got == want => DigitStatus::Correct,
            Some(_) => DigitStatus::Incorrect,
        })
        .collect();
    DigitDiff(statuses)
}

/// Exact match, length included; no partial credit
pub fn is_correct(expected: &str, actual: &str) -> bool {
    expected == actual
}
