//! Adaptive symbol model for the Oodle1 coder.
//!
//! Each decoding context owns one model: a symbol table, per-slot occurrence
//! counts and a cumulative weight table normalized to [`ONE`](AdaptiveModel::ONE).
//! Slot 0 is the escape slot, used to introduce symbols the model has not
//! normalized yet. The weight table is rebuilt on a schedule that ramps up
//! exponentially and then settles, and the counts are periodically decayed so
//! the model tracks non-stationary streams.

use super::range_coder::RangeDecoder;
use super::{DecompressError, Result};

/// Upper clamp on the occurrence mass that triggers decay.
const DECAY_CEILING: u32 = 15160;

/// Adaptive, escape-capable symbol model.
///
/// Slots `1..=highest_learned` hold symbols seen so far; slots above
/// `highest_normalized` have been learned since the last renormalization and
/// carry no normalized weight, so they are only reachable through the escape
/// slot. `weights[i+1] - weights[i]` is slot `i`'s span out of `ONE`.
#[derive(Clone)]
pub struct AdaptiveModel {
    used_symbol_count: u32,
    symbols: Vec<u8>,
    weights: Vec<u16>,
    occurrences: Vec<u16>,
    total_occurrence: u32,
    highest_learned: u32,
    highest_normalized: u32,
    next_renorm: u32,
    decay_threshold: u32,
    rapid_interval: u32,
    renorm_interval: u32,
}

impl AdaptiveModel {
    /// External probability denominator for every model-driven probe.
    pub const ONE: u32 = 0x4000;

    /// Build a model for `alphabet_size` possible symbol values, of which
    /// `unique_symbols` are expected to actually occur.
    ///
    /// `alphabet_size` must be at least 1; the escape slot starts with an
    /// occurrence mass of 4 and the whole span of `ONE`.
    pub fn new(alphabet_size: u32, unique_symbols: u32) -> Self {
        let len = alphabet_size as usize + 2;
        let mut weights = vec![Self::ONE as u16; len];
        weights[0] = 0;
        let mut occurrences = vec![0u16; len];
        occurrences[0] = 4;
        let decay_threshold = ((alphabet_size - 1) * 32).min(DECAY_CEILING).max(256);
        Self {
            used_symbol_count: unique_symbols,
            symbols: vec![0; len],
            weights,
            occurrences,
            total_occurrence: 4,
            highest_learned: 0,
            highest_normalized: 0,
            next_renorm: 8,
            decay_threshold,
            rapid_interval: 4,
            renorm_interval: ((alphabet_size - 1) * 2)
                .min(decay_threshold / 2 - 32)
                .max(128),
        }
    }

    /// Decode one symbol from the bitstream.
    ///
    /// `alphabet_size` bounds the raw read that introduces a brand-new
    /// symbol; callers may pass a narrower value than the model was built
    /// with while only part of the alphabet is reachable (the offset
    /// decoders do, as the window fills).
    pub fn decode(&mut self, bs: &mut RangeDecoder<'_>, alphabet_size: u32) -> Result<u32> {
        if self.total_occurrence >= self.next_renorm {
            if self.total_occurrence >= self.decay_threshold {
                self.decay();
            }
            self.renormalize();
        }

        let z = bs.peek(Self::ONE)?;
        let mut idx = 0usize;
        while idx <= self.highest_normalized as usize && u32::from(self.weights[idx + 1]) <= z {
            idx += 1;
        }
        let low = u32::from(self.weights[idx]);
        let span = u32::from(self.weights[idx + 1]) - low;
        bs.consume(low, span, Self::ONE);
        self.occurrences[idx] += 1;
        self.total_occurrence += 1;

        if idx != 0 {
            return Ok(u32::from(self.symbols[idx]));
        }

        // Escape slot. Symbols learned since the last renormalization carry
        // no normalized weight yet and are addressed directly; otherwise the
        // stream introduces a brand-new symbol.
        if self.highest_learned != self.highest_normalized {
            let b = bs.get(2)?;
            if b != 0 {
                let j = bs.get(self.highest_learned - self.highest_normalized)?;
                let pending = (self.highest_normalized + 1 + j) as usize;
                self.occurrences[pending] += 2;
                self.total_occurrence += 2;
                return Ok(u32::from(self.symbols[pending]));
            }
        }

        self.highest_learned += 1;
        let slot = self.highest_learned as usize;
        if slot + 1 >= self.symbols.len() {
            return Err(DecompressError::CorruptStream);
        }
        let symbol = bs.get(alphabet_size)?;
        self.symbols[slot] = symbol as u8;
        self.occurrences[slot] += 2;
        self.total_occurrence += 2;
        if self.highest_learned == self.used_symbol_count {
            // Alphabet fully learned: retire the escape slot.
            self.total_occurrence -= u32::from(self.occurrences[0]);
            self.occurrences[0] = 0;
        }
        Ok(symbol)
    }

    /// Rebuild the cumulative weight table from the occurrence counts and
    /// schedule the next rebuild.
    fn renormalize(&mut self) {
        let quanta = 0x20000 / self.total_occurrence;
        self.weights[0] = 0;
        let mut acc = u32::from(self.occurrences[0]) * quanta / 8;
        for idx in 1..=self.highest_learned as usize {
            self.weights[idx] = acc as u16;
            acc += u32::from(self.occurrences[idx]) * quanta / 8;
        }
        if self.rapid_interval * 2 < self.renorm_interval {
            self.rapid_interval *= 2;
            self.next_renorm = self.total_occurrence + self.rapid_interval;
        } else {
            self.next_renorm = self.total_occurrence + self.renorm_interval;
        }
        self.highest_normalized = self.highest_learned;
        for w in &mut self.weights[self.highest_learned as usize + 1..] {
            *w = Self::ONE as u16;
        }
    }

    /// Halve all occurrence counts, evicting slots that would round to zero
    /// and keeping the most probable symbol in the top slot.
    fn decay(&mut self) {
        self.occurrences[0] /= 2;
        self.total_occurrence = u32::from(self.occurrences[0]);
        let mut highest_weight = 0u16;
        let mut highest_index = 0usize;
        let mut idx = 1usize;
        while idx <= self.highest_learned as usize {
            // A slot at or below the eviction mass takes the current top
            // slot's contents; the replacement may itself need evicting,
            // hence the inner loop.
            while self.occurrences[idx] <= 1 {
                if idx >= self.highest_learned as usize {
                    self.occurrences[idx] = 0;
                    self.highest_learned -= 1;
                    break;
                }
                let top = self.highest_learned as usize;
                self.occurrences[idx] = self.occurrences[top];
                self.occurrences[top] = 0;
                self.symbols[idx] = self.symbols[top];
                self.highest_learned -= 1;
            }
            if self.occurrences[idx] == 0 {
                break;
            }
            self.occurrences[idx] /= 2;
            self.total_occurrence += u32::from(self.occurrences[idx]);
            if self.occurrences[idx] > highest_weight {
                highest_weight = self.occurrences[idx];
                highest_index = idx;
            }
            idx += 1;
        }
        if highest_weight > 0 && highest_index != self.highest_learned as usize {
            let top = self.highest_learned as usize;
            self.occurrences.swap(top, highest_index);
            self.symbols.swap(top, highest_index);
        }
        if self.highest_learned != self.used_symbol_count && self.occurrences[0] == 0 {
            // Keep the escape hatch alive until the alphabet is learned.
            self.occurrences[0] = 1;
            self.total_occurrence += 1;
        }
        for w in &mut self.weights[self.highest_learned as usize + 1..] {
            *w = Self::ONE as u16;
        }
    }
}

#[cfg(any(test, feature = "synth"))]
impl AdaptiveModel {
    /// Mirror of [`decode`](Self::decode) for synthesizing streams: updates
    /// the model exactly as decoding `symbol` would, and appends the
    /// corresponding range-coder intervals to `w`.
    pub(crate) fn encode(
        &mut self,
        w: &mut super::synth::StreamBuilder,
        symbol: u32,
        alphabet_size: u32,
    ) {
        if self.total_occurrence >= self.next_renorm {
            if self.total_occurrence >= self.decay_threshold {
                self.decay();
            }
            self.renormalize();
        }

        let normalized_slot = (1..=self.highest_normalized as usize).find(|&i| {
            u32::from(self.symbols[i]) == symbol && self.weights[i + 1] > self.weights[i]
        });
        if let Some(idx) = normalized_slot {
            let low = u32::from(self.weights[idx]);
            let span = u32::from(self.weights[idx + 1]) - low;
            w.push(low, span, Self::ONE);
            self.occurrences[idx] += 1;
            self.total_occurrence += 1;
            return;
        }

        let escape_span = u32::from(self.weights[1]);
        assert!(escape_span > 0, "symbol {} not encodable in this model", symbol);
        w.push(0, escape_span, Self::ONE);
        self.occurrences[0] += 1;
        self.total_occurrence += 1;

        if self.highest_learned != self.highest_normalized {
            let pending = (self.highest_normalized as usize + 1..=self.highest_learned as usize)
                .find(|&i| u32::from(self.symbols[i]) == symbol);
            if let Some(idx) = pending {
                w.put(1, 2);
                w.put(
                    idx as u32 - self.highest_normalized - 1,
                    self.highest_learned - self.highest_normalized,
                );
                self.occurrences[idx] += 2;
                self.total_occurrence += 2;
                return;
            }
            w.put(0, 2);
        }

        self.highest_learned += 1;
        let slot = self.highest_learned as usize;
        w.put(symbol, alphabet_size);
        self.symbols[slot] = symbol as u8;
        self.occurrences[slot] += 2;
        self.total_occurrence += 2;
        if self.highest_learned == self.used_symbol_count {
            self.total_occurrence -= u32::from(self.occurrences[0]);
            self.occurrences[0] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::synth::StreamBuilder;
    use super::*;

    fn check_invariants(m: &AdaptiveModel) {
        // Conservation.
        let sum: u32 = m.occurrences[..=m.highest_learned as usize]
            .iter()
            .map(|&o| u32::from(o))
            .sum();
        assert_eq!(sum, m.total_occurrence);
        // Weight monotonicity up to the normalized horizon, ONE above it.
        for i in 0..=m.highest_normalized as usize {
            assert!(m.weights[i] <= m.weights[i + 1]);
        }
        for &w in &m.weights[m.highest_normalized as usize + 1..] {
            assert_eq!(u32::from(w), AdaptiveModel::ONE);
        }
        assert!(m.highest_normalized <= m.highest_learned);
    }

    #[test]
    fn test_initial_state() {
        let m = AdaptiveModel::new(65, 12);
        assert_eq!(m.total_occurrence, 4);
        assert_eq!(m.occurrences[0], 4);
        assert_eq!(m.weights[0], 0);
        assert_eq!(u32::from(m.weights[1]), AdaptiveModel::ONE);
        assert_eq!(m.next_renorm, 8);
        assert_eq!(m.decay_threshold, 2048);
        assert_eq!(m.renorm_interval, 128);
        check_invariants(&m);
    }

    #[test]
    fn test_interval_clamps_small_alphabet() {
        // (2 - 1) * 32 clamps up to 256; the renorm interval's upper bound
        // (256 / 2 - 32 = 96) loses to its lower clamp of 128.
        let m = AdaptiveModel::new(2, 2);
        assert_eq!(m.decay_threshold, 256);
        assert_eq!(m.renorm_interval, 128);
    }

    #[test]
    fn test_interval_clamps_large_alphabet() {
        let m = AdaptiveModel::new(511, 300);
        assert_eq!(m.decay_threshold, (511 - 1) * 32);
        assert_eq!(m.renorm_interval, 1020);
    }

    #[test]
    fn test_first_symbol_retires_escape() {
        let mut w = StreamBuilder::new();
        let mut enc = AdaptiveModel::new(256, 1);
        enc.encode(&mut w, 0x42, 256);
        let data = w.finish();

        let mut bs = RangeDecoder::new(&data).unwrap();
        let mut m = AdaptiveModel::new(256, 1);
        assert_eq!(m.decode(&mut bs, 256).unwrap(), 0x42);
        assert_eq!(m.highest_learned, 1);
        assert_eq!(m.occurrences[0], 0);
        assert_eq!(m.symbols[1], 0x42);
        check_invariants(&m);
    }

    #[test]
    fn test_escape_then_pending_reuse() {
        // Second occurrence of a symbol before any renormalization goes
        // through the escape slot's pending branch, not a normalized slot.
        let mut w = StreamBuilder::new();
        let mut enc = AdaptiveModel::new(256, 4);
        enc.encode(&mut w, 5, 256);
        enc.encode(&mut w, 5, 256);
        let data = w.finish();

        let mut bs = RangeDecoder::new(&data).unwrap();
        let mut m = AdaptiveModel::new(256, 4);
        assert_eq!(m.decode(&mut bs, 256).unwrap(), 5);
        let after_first = m.occurrences[1];
        assert_eq!(after_first, 2);
        assert_eq!(m.decode(&mut bs, 256).unwrap(), 5);
        assert_eq!(m.occurrences[1], 4);
        assert_eq!(m.highest_learned, 1);
        check_invariants(&m);
    }

    #[test]
    fn test_mixed_symbols_roundtrip() {
        let symbols = [7u32, 3, 7, 7, 9, 3, 3, 7, 9, 9, 9, 7, 3, 7, 7, 7];
        let mut w = StreamBuilder::new();
        let mut enc = AdaptiveModel::new(16, 3);
        for &s in &symbols {
            enc.encode(&mut w, s, 16);
        }
        let data = w.finish();

        let mut bs = RangeDecoder::new(&data).unwrap();
        let mut m = AdaptiveModel::new(16, 3);
        for &s in &symbols {
            assert_eq!(m.decode(&mut bs, 16).unwrap(), s);
            check_invariants(&m);
        }
    }

    #[test]
    fn test_renormalization_roundtrip() {
        // Push well past the first few renorm thresholds (8, 12, 20, ...).
        let mut symbols = Vec::new();
        for i in 0..200u32 {
            symbols.push(match i % 5 {
                0 | 1 => 10,
                2 => 11,
                _ => 12,
            });
        }
        let mut w = StreamBuilder::new();
        let mut enc = AdaptiveModel::new(64, 3);
        for &s in &symbols {
            enc.encode(&mut w, s, 64);
        }
        let data = w.finish();

        let mut bs = RangeDecoder::new(&data).unwrap();
        let mut m = AdaptiveModel::new(64, 3);
        for &s in &symbols {
            assert_eq!(m.decode(&mut bs, 64).unwrap(), s);
        }
        assert!(m.highest_normalized > 0);
        check_invariants(&m);
    }

    #[test]
    fn test_decay_trigger_roundtrip() {
        // A 2-value stream over a small alphabet crosses the decay
        // threshold (256) long before 700 symbols; decoding must stay
        // bit-exact across the decay and the counts must have shrunk.
        let symbols: Vec<u32> = (0..700u32).map(|i| if i % 3 == 0 { 1 } else { 2 }).collect();
        let mut w = StreamBuilder::new();
        let mut enc = AdaptiveModel::new(4, 2);
        for &s in &symbols {
            enc.encode(&mut w, s, 4);
        }
        let data = w.finish();

        let mut bs = RangeDecoder::new(&data).unwrap();
        let mut m = AdaptiveModel::new(4, 2);
        for &s in &symbols {
            assert_eq!(m.decode(&mut bs, 4).unwrap(), s);
            check_invariants(&m);
        }
        // 700 increments with decay halvings in between cannot leave the
        // total anywhere near the raw count.
        assert!(m.total_occurrence < 700);
    }

    #[test]
    fn test_decay_evicts_and_promotes() {
        let mut m = AdaptiveModel::new(16, 10);
        m.highest_learned = 4;
        m.symbols[1] = 10;
        m.symbols[2] = 11;
        m.symbols[3] = 12;
        m.symbols[4] = 13;
        m.occurrences[0] = 6;
        m.occurrences[1] = 1; // evicted
        m.occurrences[2] = 40; // most probable, promoted to top
        m.occurrences[3] = 8;
        m.occurrences[4] = 9;
        m.total_occurrence = 6 + 1 + 40 + 8 + 9;

        m.decay();

        // Slot 1 took the old top (symbol 13), the table compacted to
        // three learned slots and the heaviest symbol sits on top.
        assert_eq!(m.highest_learned, 3);
        assert_eq!(m.symbols[m.highest_learned as usize], 11);
        assert_eq!(m.occurrences[m.highest_learned as usize], 20);
        assert_eq!(m.occurrences[0], 3);
        let sum: u32 = m.occurrences[..=3].iter().map(|&o| u32::from(o)).sum();
        assert_eq!(sum, m.total_occurrence);
    }

    #[test]
    fn test_decay_restores_escape() {
        let mut m = AdaptiveModel::new(16, 10);
        m.highest_learned = 1;
        m.symbols[1] = 7;
        m.occurrences[0] = 1;
        m.occurrences[1] = 9;
        m.total_occurrence = 10;

        m.decay();

        // occurrences[0] halves to zero but the alphabet is not fully
        // learned, so the escape mass is restored to 1.
        assert_eq!(m.occurrences[0], 1);
        assert_eq!(m.occurrences[1], 4);
        assert_eq!(m.total_occurrence, 5);
    }
}
