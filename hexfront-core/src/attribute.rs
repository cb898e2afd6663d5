//! Bounded numeric values with change notification
//!
//! A [`ClampedAttribute`] keeps `min <= current <= max` through every mutation.
//! Mutators return the [`ValueEvent`]s they produced, in order, so the owner can
//! forward them wherever they need to go. Nothing is reported while events are
//! disabled, which allows silent setup.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Smallest tolerance used by [`approx_eq`]
pub const CMP_EPSILON: f32 = 0.00001;

/// Approximate float equality with a tolerance relative to `a`
pub fn approx_eq(a: f32, b: f32) -> bool {
    if a == b {
        return true;
    }
    let tolerance = (CMP_EPSILON * a.abs()).max(CMP_EPSILON);
    (a - b).abs() < tolerance
}

/// A change reported by a [`ClampedAttribute`]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ValueEvent {
    MinChanged { previous: f32, new: f32 },
    MaxChanged { previous: f32, new: f32 },
    CurrentChanged { previous: f32, new: f32 },
    CurrentAtMin { previous: f32, new: f32 },
}

/// A bounded value: `current` always lies within `[min, max]`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClampedAttribute {
    min: f32,
    max: f32,
    current: f32,
    enabled: bool,
}

impl Default for ClampedAttribute {
    fn default() -> Self {
        Self {
            min: f32::MIN,
            max: f32::MAX,
            current: 0.0,
            enabled: false,
        }
    }
}

impl ClampedAttribute {
    /// Create a value with events disabled.
    ///
    /// `max` is raised to `min` if needed and `current` is clamped into range.
    pub fn new(min: f32, max: f32, current: f32) -> Self {
        let mut value = Self::default();
        value.set_max(max);
        value.set_min(min);
        value.set_current(current);
        value
    }

    /// Enable event reporting
    pub fn with_events(mut self) -> Self {
        self.enabled = true;
        self
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn events_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_events_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether `current` is approximately `min`
    pub fn is_at_min(&self) -> bool {
        approx_eq(self.current, self.min)
    }

    /// Whether `current` is approximately `max`
    pub fn is_at_max(&self) -> bool {
        approx_eq(self.current, self.max)
    }

    // ========================================================================
    // MUTATION
    // ========================================================================

    /// Set the lower bound.
    ///
    /// A floor above `max` drags `max` up with it. If the floor ends up above
    /// `current`, `current` is raised to it.
    pub fn set_min(&mut self, value: f32) -> Vec<ValueEvent> {
        let mut events = Vec::new();
        self.apply_min(value, &mut events);
        events
    }

    /// Set the upper bound.
    ///
    /// A ceiling below `min` drags `min` down with it. If the ceiling ends up
    /// below `current`, `current` is lowered to it.
    pub fn set_max(&mut self, value: f32) -> Vec<ValueEvent> {
        let mut events = Vec::new();
        self.apply_max(value, &mut events);
        events
    }

    /// Set `current`, clamped into `[min, max]`.
    ///
    /// Non-finite input is not filtered.
    pub fn set_current(&mut self, value: f32) -> Vec<ValueEvent> {
        let mut events = Vec::new();
        self.apply_current(value, &mut events);
        events
    }

    pub fn add_current(&mut self, difference: f32) -> Vec<ValueEvent> {
        self.set_current(self.current + difference)
    }

    pub fn multiply_current(&mut self, scale: f32) -> Vec<ValueEvent> {
        self.set_current(self.current * scale)
    }

    pub fn add_min(&mut self, difference: f32) -> Vec<ValueEvent> {
        self.set_min(self.min + difference)
    }

    pub fn multiply_min(&mut self, scale: f32) -> Vec<ValueEvent> {
        self.set_min(self.min * scale)
    }

    pub fn add_max(&mut self, difference: f32) -> Vec<ValueEvent> {
        self.set_max(self.max + difference)
    }

    pub fn multiply_max(&mut self, scale: f32) -> Vec<ValueEvent> {
        self.set_max(self.max * scale)
    }

    fn apply_min(&mut self, value: f32, events: &mut Vec<ValueEvent>) {
        if value > self.max {
            self.apply_max(value, events);
        }

        let previous = self.min;
        self.min = value.min(self.max);

        if self.enabled && !approx_eq(previous, self.min) {
            events.push(ValueEvent::MinChanged { previous, new: self.min });
        }

        if self.min > self.current {
            self.apply_current(self.min, events);
        }
    }

    fn apply_max(&mut self, value: f32, events: &mut Vec<ValueEvent>) {
        if value < self.min {
            self.apply_min(value, events);
        }

        let previous = self.max;
        self.max = value.max(self.min);

        if self.enabled && !approx_eq(previous, self.max) {
            events.push(ValueEvent::MaxChanged { previous, new: self.max });
        }

        if self.max < self.current {
            self.apply_current(self.max, events);
        }
    }

    fn apply_current(&mut self, value: f32, events: &mut Vec<ValueEvent>) {
        let previous = self.current;

        // Not f32::clamp: NaN passes through instead of panicking
        self.current = if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        };

        if self.enabled && !approx_eq(previous, self.current) {
            events.push(ValueEvent::CurrentChanged { previous, new: self.current });

            if approx_eq(self.current, self.min) {
                events.push(ValueEvent::CurrentAtMin { previous, new: self.current });
            }
        }
    }
}

// ============================================================================
// COMPARISONS (by `current`, with tolerance)
// ============================================================================

impl PartialEq for ClampedAttribute {
    fn eq(&self, other: &Self) -> bool {
        approx_eq(self.current, other.current)
    }
}

impl PartialEq<f32> for ClampedAttribute {
    fn eq(&self, other: &f32) -> bool {
        approx_eq(self.current, *other)
    }
}

impl PartialOrd for ClampedAttribute {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        compare(self.current, other.current)
    }
}

impl PartialOrd<f32> for ClampedAttribute {
    fn partial_cmp(&self, other: &f32) -> Option<Ordering> {
        compare(self.current, *other)
    }
}

fn compare(a: f32, b: f32) -> Option<Ordering> {
    if approx_eq(a, b) {
        Some(Ordering::Equal)
    } else {
        a.partial_cmp(&b)
    }
}
