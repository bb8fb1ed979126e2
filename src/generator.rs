//! The common contract every catalog generator implements.

use crate::error::Result;
use crate::number_sequence::NumberSequence;
use crate::number_type::NumberType;

/// A single catalog generator: a named member of a PRNG family with fixed
/// parameters and mutable internal state.
///
/// Implementors are the closed set `LinearCongruentialGenerator` and
/// `MersenneTwister` — there is deliberately no facility for registering a
/// third family at runtime (see the REDESIGN FLAGS note on generator
/// polymorphism: a closed trait plus an enum-backed catalog replaces open
/// subclassing).
pub trait Generator {
    /// Catalog display name, e.g. "glibc" or "MT19937".
    fn name(&self) -> &'static str;

    /// Bit width of one raw internal word.
    fn word_size(&self) -> u32;

    /// Whether this generator is currently considered a live candidate
    /// (still matches the observed history).
    fn is_active(&self) -> bool;

    fn set_active(&mut self, active: bool);

    /// Advances the generator by one raw word, returning it.
    fn next_word(&mut self) -> u64;

    /// Advances by `n` raw words without mutating state (restored
    /// afterward), used to check candidates against future output.
    fn peek_next(&mut self, n: usize) -> Vec<u64>;

    /// Advances by `n` raw words, mutating state permanently.
    fn next_n(&mut self, n: usize) -> Vec<u64> {
        (0..n).map(|_| self.next_word()).collect()
    }

    /// Resets to the generator's defined initial/seed state and marks it
    /// active again.
    fn reset(&mut self);

    /// Attempts to bring this generator's internal state in line with
    /// `observed`, the most recent reported values, given the history
    /// accumulated so far, and returns the retrospective prediction: what
    /// this generator would have produced at each of `observed`'s positions.
    /// Comparing the result against `observed` word-for-word (e.g. via
    /// `NumberSequence::count_matches_with`) is how a caller judges whether
    /// this generator remains a viable candidate.
    fn find_sequence(&mut self, observed: &NumberSequence, history: &[u64]) -> Result<NumberSequence>;

    /// Packed state vector for persistence (`RandomManager::save_state`).
    fn state_vector(&self) -> Vec<u64>;

    /// Restores state from a vector previously produced by `state_vector`.
    fn set_state_vector(&mut self, state: &[u64]) -> Result<()>;

    /// Typed convenience wrapper over `next_n`.
    fn next_outputs(&mut self, count: usize, ty: NumberType) -> NumberSequence {
        let per = ty.words_per_number(self.word_size());
        let raw = self.next_n(count * per);
        NumberSequence::from_raw_words(&raw, self.word_size(), ty)
    }

    /// Typed convenience wrapper over `peek_next`.
    fn peek_next_outputs(&mut self, count: usize, ty: NumberType) -> NumberSequence {
        let per = ty.words_per_number(self.word_size());
        let raw = self.peek_next(count * per);
        NumberSequence::from_raw_words(&raw, self.word_size(), ty)
    }
}
