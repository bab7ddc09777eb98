//! Point buffer (spec §3): a bounded FIFO of float samples backing
//! aggregate rules, keyed by `"<deviceId>.<point>"`.
//!
//! Buffers are created lazily on first aggregate sample and persist
//! across poll ticks and rule reloads (spec §3 Lifecycles): reload
//! replaces the rule vectors but never touches the buffer map, so an
//! aggregate rule removed by reload leaves its buffer inert, not
//! deleted, until something references the same key again.

use std::collections::VecDeque;

use crate::types::AggregateMethod;

/// Bounded FIFO of recent numeric samples for one point. `window` is
/// fixed at construction from the owning aggregate rule; `push` drops
/// the oldest sample once `len() == window` (spec §3: "buffer length
/// never exceeds `window`").
#[derive(Debug, Clone)]
pub struct PointBuffer {
    window: usize,
    samples: VecDeque<f64>,
}

impl PointBuffer {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            samples: VecDeque::with_capacity(window.max(1)),
        }
    }

    /// Pushes onto the tail, dropping the head if length would exceed
    /// `window` (spec §4.7 step 2).
    pub fn push(&mut self, value: f64) {
        if self.samples.len() >= self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Computes `method` over the samples currently present. `None` when
    /// the buffer is empty; extensible to `min/max/sum` per spec §3's
    /// Point buffer note, though only `avg` is required.
    pub fn compute(&self, method: AggregateMethod) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        match method {
            AggregateMethod::Avg => Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64),
            AggregateMethod::Min => self.samples.iter().cloned().fold(None, |acc, v| {
                Some(acc.map_or(v, |a: f64| a.min(v)))
            }),
            AggregateMethod::Max => self.samples.iter().cloned().fold(None, |acc, v| {
                Some(acc.map_or(v, |a: f64| a.max(v)))
            }),
            AggregateMethod::Sum => Some(self.samples.iter().sum::<f64>()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_one_retains_only_latest_sample() {
        // spec §8 boundary behavior.
        let mut buf = PointBuffer::new(1);
        buf.push(1.0);
        buf.push(2.0);
        buf.push(3.0);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.compute(AggregateMethod::Avg), Some(3.0));
    }

    #[test]
    fn avg_scenario_from_spec() {
        // spec §8 scenario 3: window=3, values 10,20,30,40 -> avg 10,15,20,30.
        let mut buf = PointBuffer::new(3);
        let expect = [10.0, 15.0, 20.0, 30.0];
        for (v, want) in [10.0, 20.0, 30.0, 40.0].into_iter().zip(expect) {
            buf.push(v);
            assert_eq!(buf.compute(AggregateMethod::Avg), Some(want));
        }
    }

    #[test]
    fn empty_buffer_has_no_aggregate() {
        let buf = PointBuffer::new(3);
        assert_eq!(buf.compute(AggregateMethod::Avg), None);
    }
}
