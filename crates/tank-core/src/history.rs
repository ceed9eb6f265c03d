//! Bounded record of polling samples for data observation
//!
//! Every sample carries all of its series at once, so the volume, rate, level
//! and time series can never drift out of step.

use heapless::{Deque, Vec};
use thiserror_no_std::Error;

use crate::config::HISTORY_CAPACITY;
use crate::tank::TankState;

/// An observation window holds the kept samples plus its origin point
pub const OBSERVATION_POINTS: usize = HISTORY_CAPACITY + 1;

/// One completed polling cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Time since the previous sample, skipped cycles included
    pub elapsed_s: f32,
    pub volume_l: f32,
    pub level_cm: f32,
    /// Absent for the first sample of a session
    pub rate_l_per_s: Option<f32>,
    pub state: TankState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Volume,
    RateOfChange,
    Level,
}

impl Series {
    pub fn value(self, sample: &Sample) -> Option<f32> {
        match self {
            Series::Volume => Some(sample.volume_l),
            Series::RateOfChange => sample.rate_l_per_s,
            Series::Level => Some(sample.level_cm),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Series::Volume => "Water Volume against Time",
            Series::RateOfChange => "Rate of Change of Water Volume against Time",
            Series::Level => "Water Level against Time",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Series::Volume => "L",
            Series::RateOfChange => "L/s",
            Series::Level => "cm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub time_s: f32,
    pub value: f32,
}

pub type Observation = Vec<Point, OBSERVATION_POINTS>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("INSUFFICIENT DATA: Polling duration must exceed {needed_s}s")]
pub struct InsufficientData {
    pub needed_s: u32,
}

#[derive(Debug, Default)]
pub struct History {
    samples: Deque<Sample, HISTORY_CAPACITY>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Appends a sample, evicting the oldest once full
    pub fn push(&mut self, sample: Sample) {
        if self.samples.is_full() {
            self.samples.pop_front();
        }
        // Room was just made
        let _ = self.samples.push_back(sample);
    }

    /// Total polling time covered by the retained samples
    pub fn total_s(&self) -> f32 {
        self.samples.iter().map(|sample| sample.elapsed_s).sum()
    }

    /// dV/dt against the previous sample; `None` until there is one
    pub fn rate_for(&self, volume_l: f32, elapsed_s: f32) -> Option<f32> {
        if elapsed_s <= 0.0 {
            return None;
        }
        self.last()
            .map(|previous| (volume_l - previous.volume_l) / elapsed_s)
    }

    /// How long `state` has persisted, counting `current_cycle_s` of the
    /// cycle in progress. Zero when the state has just changed.
    pub fn state_held_s(&self, state: TankState, current_cycle_s: f32) -> f32 {
        let held: f32 = self
            .samples
            .iter()
            .rev()
            .take_while(|sample| sample.state == state)
            .map(|sample| sample.elapsed_s)
            .sum();
        match self.last() {
            Some(previous) if previous.state == state => held + current_cycle_s,
            _ => 0.0,
        }
    }

    /// The most recent `observation_s` seconds of one series, timed from 0.
    ///
    /// The last sample to fall out of the window supplies the value at t = 0,
    /// and the final point is pinned to the end of the window. Samples
    /// without a value for the series are left out.
    pub fn observe(&self, series: Series, observation_s: u32) -> Result<Observation, InsufficientData> {
        let window_s = observation_s as f32;
        let mut remaining_s = self.total_s();
        if remaining_s < window_s {
            return Err(InsufficientData {
                needed_s: observation_s,
            });
        }

        let mut kept = self.samples.iter().peekable();
        let mut origin = None;
        while remaining_s > window_s {
            match kept.next() {
                Some(dropped) => {
                    remaining_s -= dropped.elapsed_s;
                    origin = Some(dropped);
                }
                None => break,
            }
        }
        let origin = origin.or_else(|| kept.peek().copied());

        let mut points = Observation::new();
        if let Some(value) = origin.and_then(|sample| series.value(sample)) {
            let _ = points.push(Point { time_s: 0.0, value });
        }

        let mut time_s = 0.0;
        let mut last_time = None;
        for sample in kept {
            time_s += sample.elapsed_s;
            if let Some(value) = series.value(sample) {
                let _ = points.push(Point { time_s, value });
                last_time = Some(points.len() - 1);
            }
        }
        if let Some(index) = last_time {
            points[index].time_s = window_s;
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(elapsed_s: f32, volume_l: f32, state: TankState) -> Sample {
        Sample {
            elapsed_s,
            volume_l,
            level_cm: volume_l * 2.0,
            rate_l_per_s: Some(0.1),
            state,
        }
    }

    #[test]
    fn push_evicts_the_oldest_sample() {
        let mut history = History::new();
        for i in 0..HISTORY_CAPACITY + 3 {
            history.push(sample(1.0, i as f32, TankState::Normal));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.iter().next().unwrap().volume_l, 3.0);
        assert_eq!(history.last().unwrap().volume_l, (HISTORY_CAPACITY + 2) as f32);
    }

    #[test]
    fn rate_needs_a_previous_sample() {
        let mut history = History::new();
        assert_eq!(history.rate_for(5.0, 2.0), None);
        history.push(sample(2.0, 5.0, TankState::Normal));
        assert_eq!(history.rate_for(6.0, 2.0), Some(0.5));
        assert_eq!(history.rate_for(3.0, 0.5), Some(-4.0));
    }

    #[test]
    fn held_time_counts_trailing_samples_of_the_same_state() {
        let mut history = History::new();
        assert_eq!(history.state_held_s(TankState::NearFull, 1.5), 0.0);

        history.push(sample(2.0, 5.0, TankState::Normal));
        history.push(sample(2.0, 7.5, TankState::NearFull));
        assert_eq!(history.state_held_s(TankState::Overfull, 1.5), 0.0);
        assert_eq!(history.state_held_s(TankState::NearFull, 1.5), 3.5);

        history.push(sample(2.5, 8.0, TankState::NearFull));
        assert_eq!(history.state_held_s(TankState::NearFull, 1.0), 5.5);
    }

    #[test]
    fn short_history_is_insufficient() {
        let mut history = History::new();
        for _ in 0..4 {
            history.push(sample(2.5, 5.0, TankState::Normal));
        }
        assert_eq!(
            history.observe(Series::Volume, 20),
            Err(InsufficientData { needed_s: 20 })
        );
        assert_eq!(
            std::format!("{}", InsufficientData { needed_s: 20 }),
            "INSUFFICIENT DATA: Polling duration must exceed 20s"
        );
    }

    #[test]
    fn window_starts_at_last_dropped_sample() {
        let mut history = History::new();
        for i in 0..8 {
            history.push(sample(3.0, i as f32, TankState::Normal));
        }

        let points = history.observe(Series::Volume, 20).unwrap();
        let times: std::vec::Vec<f32> = points.iter().map(|p| p.time_s).collect();
        let values: std::vec::Vec<f32> = points.iter().map(|p| p.value).collect();
        assert_eq!(times, [0.0, 3.0, 6.0, 9.0, 12.0, 15.0, 20.0]);
        assert_eq!(values, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn rate_series_skips_samples_without_a_rate() {
        let mut history = History::new();
        let mut first = sample(5.0, 1.0, TankState::Low);
        first.rate_l_per_s = None;
        history.push(first);
        for _ in 0..4 {
            history.push(sample(5.0, 1.5, TankState::Low));
        }

        // 25 s recorded, the rate-less first sample becomes the origin
        let rates = history.observe(Series::RateOfChange, 20).unwrap();
        assert_eq!(rates.len(), 4);
        assert_eq!(rates[0].time_s, 5.0);
        assert_eq!(rates[3].time_s, 20.0);

        let levels = history.observe(Series::Level, 20).unwrap();
        assert_eq!(levels.len(), 5);
        assert_eq!(levels[0], Point { time_s: 0.0, value: 2.0 });
    }
}
