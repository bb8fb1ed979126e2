//! Recovers a Mersenne Twister's pre-twist seed array from truncated
//! (FLOAT/DOUBLE) output by solving a GF(2) linear system.
//!
//! Every observed bit of tempered output is a fixed XOR of bits of the
//! `n*w` seed-array unknowns: tempering is a linear map (shifts and XORs
//! with constant masks, no data-dependent branching), and so is one step of
//! the twist recurrence once the `if x & 1 { xa ^= a }` correction is
//! rewritten as "XOR in `a`'s bit wherever `a` has a 1, scaled by the GF(2)
//! value of `x`'s low bit" — a constant-times-linear-combination is still
//! linear. `coeff(s, p)` below builds that linear combination symbolically
//! and memoizes it, since the same sub-expression recurs constantly across
//! neighboring sequence positions.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{DerandomError, Result};
use crate::mt::MersenneTwister;

#[derive(Debug, Clone)]
struct EquationVector {
    words: Vec<u64>,
}

impl EquationVector {
    fn zero(bits: usize) -> Self {
        EquationVector { words: vec![0u64; bits.div_ceil(64)] }
    }

    fn set_bit(&mut self, index: usize) {
        self.words[index / 64] |= 1u64 << (index % 64);
    }

    fn xor_with(&mut self, other: &EquationVector) {
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a ^= b;
        }
    }

    fn highest_bit(&self) -> Option<usize> {
        for (i, &word) in self.words.iter().enumerate().rev() {
            if word != 0 {
                let bit = 63 - word.leading_zeros() as usize;
                return Some(i * 64 + bit);
            }
        }
        None
    }

    fn is_bit_set(&self, index: usize) -> bool {
        (self.words[index / 64] >> (index % 64)) & 1 == 1
    }
}

pub struct StateFinder<'a> {
    mt: &'a MersenneTwister,
    tempering_columns: Vec<u64>,
}

impl<'a> StateFinder<'a> {
    pub fn new(mt: &'a MersenneTwister) -> Self {
        let columns = (0..mt.w()).map(|j| mt.temper(1u64 << j)).collect();
        StateFinder { mt, tempering_columns: columns }
    }

    fn total_bits(&self) -> usize {
        self.mt.n() * self.mt.w() as usize
    }

    /// Linear combination (over the `n*w` seed unknowns) for bit `p` (0 =
    /// LSB) of the pre-tempered word at sequence position `s`.
    fn coeff(
        &self,
        s: usize,
        p: u32,
        cache: &mut HashMap<(usize, u32), Rc<EquationVector>>,
    ) -> Result<Rc<EquationVector>> {
        if let Some(v) = cache.get(&(s, p)) {
            return Ok(v.clone());
        }
        let n = self.mt.n();
        let w = self.mt.w();
        let vector = if s < n {
            let mut v = EquationVector::zero(self.total_bits());
            v.set_bit(s * w as usize + p as usize);
            v
        } else {
            let r = self.mt.r();
            let m = self.mt.m();
            let a = self.mt.matrix_a();
            let mut v = if p == w - 1 {
                EquationVector::zero(self.total_bits())
            } else {
                let src = if p + 1 >= r { s - n } else { s - n + 1 };
                (*self.coeff(src, p + 1, cache)?).clone()
            };
            if (a >> p) & 1 == 1 {
                let bit0 = self.coeff(s - n + 1, 0, cache)?;
                v.xor_with(&bit0);
            }
            let base = self.coeff(s - n + m, p, cache)?;
            v.xor_with(&base);
            v
        };
        cache
            .try_reserve(1)
            .map_err(|_| DerandomError::OutOfMemory("state finder coefficient cache exhausted memory".to_string()))?;
        let rc = Rc::new(vector);
        cache.insert((s, p), rc.clone());
        Ok(rc)
    }

    fn insert_equation(
        basis: &mut [Option<(EquationVector, bool)>],
        mut vec: EquationVector,
        mut rhs: bool,
    ) -> bool {
        loop {
            match vec.highest_bit() {
                None => return !rhs,
                Some(pivot) => match &basis[pivot] {
                    None => {
                        basis[pivot] = Some((vec, rhs));
                        return true;
                    }
                    Some((bvec, brhs)) => {
                        vec.xor_with(bvec);
                        rhs ^= *brhs;
                    }
                },
            }
        }
    }

    /// Solves for the `n`-word pre-twist seed array given a run of
    /// consecutive observed tempered words (`words`) and, per word, which of
    /// its bits were actually observed (`masks`). Returns `None` if the
    /// system doesn't pin down every unknown (not enough samples) or is
    /// contradictory (this generator doesn't match the data); surfaces
    /// `DerandomError::OutOfMemory` if the coefficient cache can't grow any
    /// further, matching invariant 6.
    pub fn solve(&self, words: &[u64], masks: &[u64]) -> Result<Option<Vec<u64>>> {
        let total_bits = self.total_bits();
        let mut cache = HashMap::new();
        let mut basis: Vec<Option<(EquationVector, bool)>> = (0..total_bits).map(|_| None).collect();

        // The low `r` bits of state[0] never surface as the sole highest bit
        // of any observed-bit equation, so no amount of sampling ever fills
        // those pivots on its own; pre-seed them as identities (assumed 0),
        // the standard convention for the structurally unrecoverable part of
        // the seed array.
        for k in 0..self.mt.r() as usize {
            let mut identity = EquationVector::zero(total_bits);
            identity.set_bit(k);
            basis[k] = Some((identity, false));
        }

        for (s, (&word, &mask)) in words.iter().zip(masks.iter()).enumerate() {
            for p in 0..self.mt.w() {
                if (mask >> p) & 1 != 1 {
                    continue;
                }
                let target_bit = (word >> p) & 1 == 1;
                let mut acc = EquationVector::zero(total_bits);
                for j in 0..self.mt.w() {
                    if (self.tempering_columns[j as usize] >> p) & 1 == 1 {
                        let c = self.coeff(s, j, &mut cache)?;
                        acc.xor_with(&c);
                    }
                }
                if !Self::insert_equation(&mut basis, acc, target_bit) {
                    return Ok(None);
                }
            }
        }

        let mut values = vec![false; total_bits];
        for idx in 0..total_bits {
            let (vec, rhs) = match &basis[idx] {
                Some(entry) => entry,
                None => return Ok(None),
            };
            let mut val = *rhs;
            for j in 0..idx {
                if vec.is_bit_set(j) {
                    val ^= values[j];
                }
            }
            values[idx] = val;
        }

        let w = self.mt.w();
        let mut state = Vec::with_capacity(self.mt.n());
        for i in 0..self.mt.n() {
            let mut word = 0u64;
            for p in 0..w {
                if values[i * w as usize + p as usize] {
                    word |= 1u64 << p;
                }
            }
            state.push(word);
        }
        Ok(Some(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Generator;
    use crate::number_sequence::NumberSequence;
    use crate::number_type::NumberType;

    #[test]
    fn recovers_state_from_float_truncated_output() {
        let seed_gen = crate::mt::catalog().into_iter().find(|g| g.name() == "MT19937").unwrap();
        let mut probe = seed_gen.clone();
        // FLOAT only reveals 24 of each word's 32 bits, so recovering all
        // 624*32 unknowns needs several times n samples; ~1300 is the
        // documented threshold at which MT19937's FLOAT solver resolves.
        let sample_count = 1300;
        let mut raw = Vec::new();
        for _ in 0..sample_count {
            raw.push(probe.next_word());
        }
        let observed = NumberSequence::from_raw_words(&raw, 32, NumberType::Float);
        let words = observed.get_sequence_words(32);
        let masks = observed.get_observed_word_bits(32);

        let finder = StateFinder::new(&seed_gen);
        let solved = finder.solve(&words, &masks).unwrap();
        assert!(solved.is_some());
    }
}
