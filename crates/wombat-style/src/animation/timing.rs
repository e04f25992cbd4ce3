//! The Web Animations timing model.
//!
//! [Web Animations § 4.8 Core animation effect concepts](https://www.w3.org/TR/web-animations-1/#core-animation-effect-concepts)
//!
//! All times are milliseconds on the document timeline.

use serde::Serialize;
use wombat_css::{Easing, Keyword, StyleValue};

/// [§ 4.8.5 Fill modes](https://www.w3.org/TR/web-animations-1/#fill-behavior)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillMode {
    /// No effect outside the active interval.
    #[default]
    None,
    /// Hold the final value after the active interval.
    Forwards,
    /// Apply the initial value during the delay.
    Backwards,
    /// Both.
    Both,
}

impl FillMode {
    /// Read an `animation-fill-mode` item.
    #[must_use]
    pub fn from_value(value: &StyleValue) -> Self {
        match value.as_keyword() {
            Some(Keyword::Forwards) => Self::Forwards,
            Some(Keyword::Backwards) => Self::Backwards,
            Some(Keyword::Both) => Self::Both,
            _ => Self::None,
        }
    }

    const fn fills_backwards(self) -> bool {
        matches!(self, Self::Backwards | Self::Both)
    }

    const fn fills_forwards(self) -> bool {
        matches!(self, Self::Forwards | Self::Both)
    }
}

/// [§ 4.10.1 Direction control](https://www.w3.org/TR/web-animations-1/#direction-control)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackDirection {
    /// Every iteration runs forwards.
    #[default]
    Normal,
    /// Every iteration runs backwards.
    Reverse,
    /// Even iterations forwards, odd ones backwards.
    Alternate,
    /// Even iterations backwards, odd ones forwards.
    AlternateReverse,
}

impl PlaybackDirection {
    /// Read an `animation-direction` item.
    #[must_use]
    pub fn from_value(value: &StyleValue) -> Self {
        match value.as_keyword() {
            Some(Keyword::Reverse) => Self::Reverse,
            Some(Keyword::Alternate) => Self::Alternate,
            Some(Keyword::AlternateReverse) => Self::AlternateReverse,
            _ => Self::Normal,
        }
    }
}

/// [§ 4.8.3 Animation effect phases](https://www.w3.org/TR/web-animations-1/#animation-effect-phases-and-states)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationPhase {
    /// Before the active interval.
    Before,
    /// Inside the active interval.
    Active,
    /// After the active interval.
    After,
}

/// Timing properties of one animation effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    /// Start delay.
    pub delay: f64,
    /// Duration of one iteration.
    pub iteration_duration: f64,
    /// Number of iterations; may be infinite.
    pub iterations: f64,
    /// Playback direction.
    pub direction: PlaybackDirection,
    /// Fill mode.
    pub fill: FillMode,
    /// Easing applied to each iteration.
    pub easing: Easing,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            delay: 0.0,
            iteration_duration: 0.0,
            iterations: 1.0,
            direction: PlaybackDirection::Normal,
            fill: FillMode::None,
            easing: Easing::Linear,
        }
    }
}

/// The result of sampling a [`Timing`] at one local time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedTiming {
    /// Phase at the sampled time.
    pub phase: AnimationPhase,
    /// Eased progress through the current iteration, `None` when the
    /// effect has no effect at this time.
    pub progress: Option<f64>,
    /// Zero-based iteration index.
    pub current_iteration: f64,
    /// Whether the easing should treat the sample as preceding the
    /// interval, which matters for `jump-start` steps.
    pub before_flag: bool,
}

impl Timing {
    /// [§ 4.8.2 The active interval](https://www.w3.org/TR/web-animations-1/#active-duration)
    #[must_use]
    pub fn active_duration(&self) -> f64 {
        if self.iteration_duration == 0.0 || self.iterations == 0.0 {
            0.0
        } else {
            self.iteration_duration * self.iterations
        }
    }

    /// "The end time of an animation effect is the result of evaluating
    /// max(start delay + active duration + end delay, 0)."
    #[must_use]
    pub fn end_time(&self) -> f64 {
        (self.delay + self.active_duration()).max(0.0)
    }

    /// [§ 4.8.3](https://www.w3.org/TR/web-animations-1/#animation-effect-phases-and-states)
    #[must_use]
    pub fn phase(&self, local_time: f64) -> AnimationPhase {
        let end_time = self.end_time();
        let before_active = self.delay.min(end_time).max(0.0);
        let active_after = (self.delay + self.active_duration()).min(end_time).max(0.0);
        if local_time < before_active {
            AnimationPhase::Before
        } else if local_time >= active_after {
            AnimationPhase::After
        } else {
            AnimationPhase::Active
        }
    }

    /// [§ 4.8.3.1 Calculating the active time](https://www.w3.org/TR/web-animations-1/#calculating-the-active-time)
    fn active_time(&self, local_time: f64, phase: AnimationPhase) -> Option<f64> {
        match phase {
            AnimationPhase::Before => self.fill.fills_backwards().then(|| (local_time - self.delay).max(0.0)),
            AnimationPhase::Active => Some(local_time - self.delay),
            AnimationPhase::After => self
                .fill
                .fills_forwards()
                .then(|| (local_time - self.delay).min(self.active_duration()).max(0.0)),
        }
    }

    /// [§ 4.9 Core iteration concepts](https://www.w3.org/TR/web-animations-1/#core-iteration-concepts)
    /// and [§ 4.10 Direction control](https://www.w3.org/TR/web-animations-1/#direction-control)
    #[must_use]
    pub fn sample(&self, local_time: f64) -> ComputedTiming {
        let phase = self.phase(local_time);
        let Some(active_time) = self.active_time(local_time, phase) else {
            return ComputedTiming {
                phase,
                progress: None,
                current_iteration: 0.0,
                before_flag: phase == AnimationPhase::Before,
            };
        };

        let overall_progress = if self.iteration_duration == 0.0 {
            if phase == AnimationPhase::Before { 0.0 } else { self.iterations }
        } else {
            active_time / self.iteration_duration
        };

        let mut simple_progress = if overall_progress.is_infinite() { 0.0 } else { overall_progress % 1.0 };
        // "If all of the following conditions are true ... let the simple
        // iteration progress be 1.0": the interval ended on an iteration
        // boundary.
        if simple_progress == 0.0
            && phase != AnimationPhase::Before
            && (active_time - self.active_duration()).abs() < f64::EPSILON
            && self.iterations != 0.0
        {
            simple_progress = 1.0;
        }

        let current_iteration = if phase == AnimationPhase::After && self.iterations.is_infinite() {
            f64::INFINITY
        } else if simple_progress == 1.0 {
            (overall_progress.floor() - 1.0).max(0.0)
        } else {
            overall_progress.floor()
        };

        let forwards = match self.direction {
            PlaybackDirection::Normal => true,
            PlaybackDirection::Reverse => false,
            PlaybackDirection::Alternate | PlaybackDirection::AlternateReverse => {
                let even = current_iteration.is_infinite() || current_iteration % 2.0 == 0.0;
                even == (self.direction == PlaybackDirection::Alternate)
            }
        };
        let directed_progress = if forwards { simple_progress } else { 1.0 - simple_progress };

        // [§ 4.11 Time transformations](https://www.w3.org/TR/web-animations-1/#calculating-the-transformed-progress)
        let before_flag =
            (phase == AnimationPhase::Before && forwards) || (phase == AnimationPhase::After && !forwards);
        ComputedTiming {
            phase,
            progress: Some(self.easing.evaluate(directed_progress, before_flag)),
            current_iteration,
            before_flag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(duration: f64, iterations: f64) -> Timing {
        Timing {
            iteration_duration: duration,
            iterations,
            ..Timing::default()
        }
    }

    #[test]
    fn test_phases_around_delay() {
        let timing = Timing {
            delay: 100.0,
            ..timing(1000.0, 1.0)
        };
        assert_eq!(timing.phase(50.0), AnimationPhase::Before);
        assert_eq!(timing.phase(100.0), AnimationPhase::Active);
        assert_eq!(timing.phase(1100.0), AnimationPhase::After);
        assert_eq!(timing.sample(50.0).progress, None);
    }

    #[test]
    fn test_fill_modes() {
        let backwards = Timing {
            delay: 100.0,
            fill: FillMode::Backwards,
            ..timing(1000.0, 1.0)
        };
        assert_eq!(backwards.sample(0.0).progress, Some(0.0));
        assert_eq!(backwards.sample(2000.0).progress, None);

        let forwards = Timing {
            fill: FillMode::Forwards,
            ..timing(1000.0, 2.0)
        };
        assert_eq!(forwards.sample(5000.0).progress, Some(1.0));
        assert!((forwards.sample(5000.0).current_iteration - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_alternate_direction() {
        let timing = Timing {
            direction: PlaybackDirection::Alternate,
            ..timing(1000.0, 4.0)
        };
        let first = timing.sample(250.0).progress.unwrap();
        let second = timing.sample(1250.0).progress.unwrap();
        assert!((first - 0.25).abs() < 1e-9);
        assert!((second - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_reverse_direction() {
        let timing = Timing {
            direction: PlaybackDirection::Reverse,
            ..timing(1000.0, 1.0)
        };
        assert!((timing.sample(250.0).progress.unwrap() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_infinite_iterations_stay_active() {
        let timing = timing(1000.0, f64::INFINITY);
        assert_eq!(timing.phase(1e9), AnimationPhase::Active);
        assert!((timing.sample(1500.0).progress.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_jumps_to_end() {
        let timing = Timing {
            fill: FillMode::Both,
            ..timing(0.0, 1.0)
        };
        assert_eq!(timing.phase(0.0), AnimationPhase::After);
        assert_eq!(timing.sample(0.0).progress, Some(1.0));
    }
}
