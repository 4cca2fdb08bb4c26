//! Gain automation with ramped transitions.
//!
//! Gain stages must never jump instantly: an instantaneous change is heard as
//! a click. This module provides the two transition shapes the engine uses:
//!
//! - **Linear**: constant rate of change over a fixed duration
//!   ([`LinearSmoothedParam`]). Used for main output and reverb blend.
//! - **Exponential approach**: one-pole lowpass toward the target with a time
//!   constant ([`SmoothedParam`]). Used for ducking, where engage and release
//!   run with different constants.
//!
//! [`AutomatedParam`] combines both and always re-targets from the value it
//! currently holds, so a second ramp issued mid-flight continues smoothly from
//! wherever the first one left off.
//!
//! ## Usage
//!
//! ```rust
//! use sonance_core::AutomatedParam;
//!
//! let mut gain = AutomatedParam::new(1.0, 48000.0);
//! gain.linear_ramp_to(0.0, 0.1); // 100 ms fade out
//!
//! gain.advance_seconds(0.05);
//! assert!((gain.value() - 0.5).abs() < 0.01);
//!
//! gain.advance_seconds(0.05);
//! assert!(gain.is_settled());
//! ```

use libm::expf;

/// A parameter with exponential smoothing toward a target.
///
/// `smoothing_time_ms` is the time constant: after one time constant the value
/// has covered ~63.2% of the distance to the target.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Smoothing coefficient (1 = instant, ~0 = very slow)
    coeff: f32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Time constant in milliseconds
    smoothing_time_ms: f32,
}

impl SmoothedParam {
    /// Create a new smoothed parameter with initial value.
    ///
    /// Smoothing is disabled until a sample rate and time constant are set.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 48000.0,
            smoothing_time_ms: 0.0,
        }
    }

    /// Create a smoothed parameter with full configuration.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.smoothing_time_ms = smoothing_time_ms;
        param.recalculate_coeff();
        param
    }

    /// Set the target value (parameter will smooth towards this).
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Set target and immediately snap to it.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Update sample rate and recalculate the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Set the time constant in milliseconds.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_coeff();
    }

    /// Get the next smoothed value (advances by one sample).
    #[inline]
    pub fn advance(&mut self) -> f32 {
        // y[n] = y[n-1] + coeff * (target - y[n-1])
        let next = self.current + self.coeff * (self.target - self.current);
        // Once the step is below f32 resolution the filter stalls short of
        // the target; finish the approach there.
        if next == self.current || (self.target - next).abs() < 1e-6 {
            self.current = self.target;
        } else {
            self.current = next;
        }
        self.current
    }

    /// Get the current smoothed value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Get the target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Check if the parameter has reached its target (within epsilon).
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// Skip ahead to the target value immediately.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    /// `coeff = 1 - exp(-1 / (tau * sample_rate))`, or 1.0 (instant) when the
    /// time constant is zero.
    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples);
        }
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// A parameter with linear smoothing (constant rate of change).
///
/// Reaches the target exactly after the transition time.
#[derive(Debug, Clone)]
pub struct LinearSmoothedParam {
    /// Current value
    current: f32,
    /// Target value
    target: f32,
    /// Increment per sample (can be positive or negative)
    increment: f32,
    /// Samples remaining until target reached
    samples_remaining: u32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Transition time in milliseconds
    transition_time_ms: f32,
}

impl LinearSmoothedParam {
    /// Create a new linear smoothed parameter.
    pub fn new(initial: f32) -> Self {
        Self::with_config(initial, 48000.0, 100.0)
    }

    /// Create with full configuration.
    pub fn with_config(initial: f32, sample_rate: f32, transition_time_ms: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            samples_remaining: 0,
            sample_rate,
            transition_time_ms,
        }
    }

    /// Set the target value, starting a ramp from the current value.
    pub fn set_target(&mut self, target: f32) {
        if (target - self.target).abs() < 1e-9 {
            return;
        }

        self.target = target;

        let samples = (self.transition_time_ms / 1000.0 * self.sample_rate) as u32;
        if samples == 0 {
            self.current = target;
            self.increment = 0.0;
            self.samples_remaining = 0;
        } else {
            self.increment = (target - self.current) / samples as f32;
            self.samples_remaining = samples;
        }
    }

    /// Set value immediately.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    /// Update sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Set transition time in milliseconds.
    pub fn set_transition_time_ms(&mut self, time_ms: f32) {
        self.transition_time_ms = time_ms;
    }

    /// Get next smoothed value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.current += self.increment;
            self.samples_remaining -= 1;
            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }
        self.current
    }

    /// Get current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Get target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Check if transition is complete.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.samples_remaining == 0
    }

    /// Snap to target immediately.
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }
}

impl Default for LinearSmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Which transition shape is currently driving an [`AutomatedParam`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampShape {
    /// Linear ramp over a fixed duration (or a held value).
    Linear,
    /// Exponential approach with a time constant.
    Approach,
}

/// A gain-stage parameter that can be driven by either transition shape.
///
/// Every scheduling call starts from [`value()`](Self::value), the value the
/// stage holds right now, so superseding an in-flight ramp never jumps.
#[derive(Debug, Clone)]
pub struct AutomatedParam {
    linear: LinearSmoothedParam,
    approach: SmoothedParam,
    shape: RampShape,
    sample_rate: f32,
}

impl AutomatedParam {
    /// Create a parameter holding `initial`.
    pub fn new(initial: f32, sample_rate: f32) -> Self {
        Self {
            linear: LinearSmoothedParam::with_config(initial, sample_rate, 0.0),
            approach: SmoothedParam::with_config(initial, sample_rate, 0.0),
            shape: RampShape::Linear,
            sample_rate,
        }
    }

    /// Current (possibly in-flight) value.
    #[inline]
    pub fn value(&self) -> f32 {
        match self.shape {
            RampShape::Linear => self.linear.get(),
            RampShape::Approach => self.approach.get(),
        }
    }

    /// Value the parameter is heading toward.
    #[inline]
    pub fn target(&self) -> f32 {
        match self.shape {
            RampShape::Linear => self.linear.target(),
            RampShape::Approach => self.approach.target(),
        }
    }

    /// Shape of the most recently scheduled transition.
    pub fn shape(&self) -> RampShape {
        self.shape
    }

    /// Jump to `value` with no transition.
    pub fn set_value(&mut self, value: f32) {
        self.linear.set_immediate(value);
        self.approach.set_immediate(value);
        self.shape = RampShape::Linear;
    }

    /// Ramp linearly from the current value to `target` over `duration_secs`.
    pub fn linear_ramp_to(&mut self, target: f32, duration_secs: f32) {
        let current = self.value();
        self.linear.set_immediate(current);
        self.linear.set_transition_time_ms(duration_secs.max(0.0) * 1000.0);
        self.linear.set_target(target);
        self.shape = RampShape::Linear;
    }

    /// Approach `target` exponentially with the given time constant.
    pub fn set_target_at_time(&mut self, target: f32, time_constant_secs: f32) {
        let current = self.value();
        self.approach.set_immediate(current);
        self.approach
            .set_smoothing_time_ms(time_constant_secs.max(0.0) * 1000.0);
        self.approach.set_target(target);
        self.shape = RampShape::Approach;
    }

    /// Advance by `samples` samples.
    pub fn advance_samples(&mut self, samples: u64) {
        for _ in 0..samples {
            if self.is_settled() {
                break;
            }
            match self.shape {
                RampShape::Linear => {
                    self.linear.advance();
                }
                RampShape::Approach => {
                    self.approach.advance();
                }
            }
        }
    }

    /// Advance by a wall-clock duration.
    pub fn advance_seconds(&mut self, seconds: f32) {
        let samples = (seconds.max(0.0) * self.sample_rate).round() as u64;
        self.advance_samples(samples);
    }

    /// Whether the current transition has finished.
    pub fn is_settled(&self) -> bool {
        match self.shape {
            RampShape::Linear => self.linear.is_settled(),
            RampShape::Approach => self.approach.is_settled(),
        }
    }

    /// Finish the current transition immediately.
    pub fn snap_to_target(&mut self) {
        let target = self.target();
        self.set_value(target);
    }
}
