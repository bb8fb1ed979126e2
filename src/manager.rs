//! The catalog registry: holds every known generator, scores them against
//! observed output, and serves predictions from whichever one currently
//! matches.

use crate::error::{DerandomError, Result};
use crate::generator::Generator;
use crate::history::HistoryBuffer;
use crate::lcg;
use crate::mt;
use crate::number_sequence::NumberSequence;
use crate::number_type::NumberType;

/// Registry of every catalog generator (sixteen LCG variants, two Mersenne
/// Twister variants) plus the bounded history of reported values used to
/// re-score them as new output arrives.
pub struct RandomManager {
    generators: Vec<Box<dyn Generator>>,
    history: HistoryBuffer,
    number_type: NumberType,
    current_index: Option<usize>,
    /// Retrospective prediction for the most recently fed values, from
    /// whichever generator was selected just *before* this call to
    /// [`Self::detect_generator`] — kept around purely to color a
    /// collaborator's past-predictions display, even when detection ends up
    /// switching to a different generator this round.
    incoming_prediction: NumberSequence,
}

impl RandomManager {
    pub fn new(history_capacity: usize, number_type: NumberType) -> Self {
        let mut generators: Vec<Box<dyn Generator>> = Vec::new();
        for g in lcg::catalog() {
            generators.push(Box::new(g));
        }
        for g in mt::catalog() {
            generators.push(Box::new(g));
        }
        RandomManager {
            generators,
            history: HistoryBuffer::with_capacity(history_capacity),
            number_type,
            current_index: None,
            incoming_prediction: NumberSequence::empty(number_type),
        }
    }

    pub fn current_generator_name(&self) -> Option<&'static str> {
        self.current_index.map(|i| self.generators[i].name())
    }

    pub fn number_type(&self) -> NumberType {
        self.number_type
    }

    /// Drops all accumulated history and reseeds every catalog generator,
    /// reactivating all of them as candidates.
    pub fn reset(&mut self) {
        self.history.clear();
        self.current_index = None;
        self.incoming_prediction = NumberSequence::empty(self.number_type);
        for g in &mut self.generators {
            g.reset();
        }
    }

    /// Marks every candidate inactive without touching history; used when
    /// the collaborator explicitly gives up on detection.
    pub fn deactivate_all(&mut self) {
        for g in &mut self.generators {
            g.set_active(false);
        }
        self.current_index = None;
        self.incoming_prediction = NumberSequence::empty(self.number_type);
    }

    /// Reseeds only the currently detected generator, leaving the rest of
    /// the catalog (and history) untouched.
    pub fn reset_current_generator(&mut self) {
        if let Some(i) = self.current_index {
            self.generators[i].reset();
        }
    }

    pub fn set_history_capacity(&mut self, capacity: i64) -> Result<()> {
        self.history.set_capacity(capacity)
    }

    /// Runs the currently selected generator's `find_sequence` against
    /// `incoming` and stores the result as this round's retrospective
    /// prediction, for a collaborator to color past predictions with. A
    /// no-op (empty prediction) if there is no currently selected generator,
    /// or it is inactive.
    pub fn find_current_sequence(&mut self, incoming: &NumberSequence, history: &[u64]) -> Result<NumberSequence> {
        let prediction = match self.current_index {
            Some(i) if self.generators[i].is_active() => self.generators[i].find_sequence(incoming, history)?,
            _ => NumberSequence::empty(incoming.ty()),
        };
        self.incoming_prediction = prediction.clone();
        Ok(prediction)
    }

    /// The most recent retrospective prediction recorded by
    /// [`Self::find_current_sequence`] (including as a side effect of
    /// [`Self::detect_generator`]).
    pub fn incoming_prediction(&self) -> &NumberSequence {
        &self.incoming_prediction
    }

    /// Feeds newly reported values in, merges them into the bounded history,
    /// and scores every still-active catalog generator by how well its
    /// retrospective prediction (see [`Generator::find_sequence`]) matches
    /// the incoming values. The previously selected generator's prediction is
    /// always recorded into [`Self::incoming_prediction`] first (used to
    /// color a collaborator's display even when a different generator ends
    /// up selected); if that prediction matches the incoming run outright,
    /// the current generator is kept and no other generator is probed or
    /// mutated (detection stability, invariant 9). Otherwise every active
    /// candidate is scored by `NumberSequence::count_matches_with`, the
    /// highest score wins, and ties prefer whichever generator was already
    /// selected.
    pub fn detect_generator(&mut self, new_values: &[String]) -> Result<Option<usize>> {
        let parsed = NumberSequence::parse(new_values, self.number_type)?;
        self.number_type = parsed.ty();
        let prior_history = self.history.to_array();
        self.history.put(parsed.words());
        let incoming = NumberSequence::from_words(parsed.words().to_vec(), self.number_type);

        if incoming.is_empty() {
            return Ok(self.current_index);
        }

        let previous_current = self.current_index;
        let current_prediction = self.find_current_sequence(&incoming, &prior_history)?;

        if previous_current.is_some() && current_prediction == incoming {
            return Ok(self.current_index);
        }

        let mut best: Option<(usize, usize)> = None;
        for (i, g) in self.generators.iter_mut().enumerate() {
            if !g.is_active() {
                continue;
            }
            let score = if Some(i) == previous_current {
                incoming.count_matches_with(&current_prediction)
            } else {
                let prediction = g.find_sequence(&incoming, &prior_history)?;
                incoming.count_matches_with(&prediction)
            };
            let better = match best {
                None => true,
                Some((_, best_score)) => score > best_score || (score == best_score && previous_current == Some(i)),
            };
            if better {
                best = Some((i, score));
            }
        }
        self.current_index = best.map(|(i, _)| i);
        Ok(self.current_index)
    }

    /// Forward-only counterpart of [`Self::detect_generator`]: peeks the
    /// currently detected generator's next `count` outputs without advancing
    /// its state, touching history, or re-running detection.
    pub fn predict(&mut self, count: usize) -> Result<NumberSequence> {
        let idx = self
            .current_index
            .ok_or_else(|| DerandomError::InvalidArgument("no generator is currently detected".to_string()))?;
        Ok(self.generators[idx].peek_next_outputs(count, self.number_type))
    }

    /// Packed persistence format: `[current_index_or_-1, len0, gen0.state.., len1, gen1.state.., ...]`.
    pub fn save_state(&self) -> Vec<u64> {
        let mut out = Vec::with_capacity(1 + self.generators.len() * 8);
        out.push(self.current_index.map(|i| i as i64).unwrap_or(-1) as u64);
        for g in &self.generators {
            let v = g.state_vector();
            out.push(v.len() as u64);
            out.extend(v);
        }
        out
    }

    pub fn restore_state(&mut self, data: &[u64]) -> Result<()> {
        let mut iter = data.iter();
        let idx = *iter
            .next()
            .ok_or_else(|| DerandomError::InvalidArgument("empty state vector".to_string()))? as i64;
        self.current_index = if idx < 0 { None } else { Some(idx as usize) };

        for g in &mut self.generators {
            let len = *iter
                .next()
                .ok_or_else(|| DerandomError::InvalidArgument("truncated state vector".to_string()))?
                as usize;
            let chunk: Vec<u64> = iter.by_ref().take(len).copied().collect();
            if chunk.len() != len {
                return Err(DerandomError::InvalidArgument("truncated state vector".to_string()));
            }
            g.set_state_vector(&chunk)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Generator as _;

    #[test]
    fn fresh_manager_has_no_current_generator() {
        let manager = RandomManager::new(64, NumberType::Raw);
        assert!(manager.current_generator_name().is_none());
    }

    #[test]
    fn detects_minstd_from_its_own_output() {
        let mut manager = RandomManager::new(64, NumberType::UnsignedInteger);
        let mut lcg = lcg::catalog().into_iter().find(|g| g.name() == "MINSTD").unwrap();
        let values: Vec<String> = (0..8).map(|_| lcg.next_word().to_string()).collect();
        let found = manager.detect_generator(&values).unwrap();
        assert!(found.is_some());
        assert_eq!(manager.current_generator_name(), Some("MINSTD"));
    }

    #[test]
    fn predict_does_not_advance_state() {
        let mut manager = RandomManager::new(64, NumberType::UnsignedInteger);
        let mut lcg = lcg::catalog().into_iter().find(|g| g.name() == "MINSTD").unwrap();
        let values: Vec<String> = (0..8).map(|_| lcg.next_word().to_string()).collect();
        manager.detect_generator(&values).unwrap();

        let first = manager.predict(3).unwrap();
        let second = manager.predict(3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn detect_generator_stays_stable_and_records_incoming_prediction() {
        let mut manager = RandomManager::new(64, NumberType::UnsignedInteger);
        let mut lcg = lcg::catalog().into_iter().find(|g| g.name() == "MINSTD").unwrap();
        let first_batch: Vec<String> = (0..8).map(|_| lcg.next_word().to_string()).collect();
        manager.detect_generator(&first_batch).unwrap();

        let second_batch: Vec<String> = (0..4).map(|_| lcg.next_word().to_string()).collect();
        let expected = NumberSequence::parse(&second_batch, manager.number_type()).unwrap();
        manager.detect_generator(&second_batch).unwrap();

        assert_eq!(manager.current_generator_name(), Some("MINSTD"));
        assert_eq!(manager.incoming_prediction(), &expected);
    }

    #[test]
    fn save_and_restore_state_round_trips() {
        let mut manager = RandomManager::new(64, NumberType::UnsignedInteger);
        let mut lcg = lcg::catalog().into_iter().find(|g| g.name() == "MINSTD").unwrap();
        let values: Vec<String> = (0..8).map(|_| lcg.next_word().to_string()).collect();
        manager.detect_generator(&values).unwrap();
        let saved = manager.save_state();

        let mut other = RandomManager::new(64, NumberType::UnsignedInteger);
        other.restore_state(&saved).unwrap();
        assert_eq!(other.current_generator_name(), manager.current_generator_name());
    }
}
