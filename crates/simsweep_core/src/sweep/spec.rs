//! Declarative sweep description and its expansion into parameter sets.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::model::{NO_ERROR, Parameter, ParameterSet};

/// Upper bound on the number of values a single axis may expand to.
pub const MAX_AXIS_POINTS: usize = 100_000;

/// Upper bound on the number of grid points in one sweep.
pub const MAX_SWEEP_POINTS: usize = 1_000_000;

/// How an axis value maps onto a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BindingTransform {
    /// The axis value itself
    #[default]
    Direct,
    /// `base + value`
    Offset { base: f64 },
    /// `base * value`
    Scale { base: f64 },
}

impl BindingTransform {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            BindingTransform::Direct => value,
            BindingTransform::Offset { base } => base + value,
            BindingTransform::Scale { base } => base * value,
        }
    }
}

/// Writes an axis value into one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisBinding {
    pub parameter: String,
    #[serde(default)]
    pub transform: BindingTransform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl AxisBinding {
    pub fn direct(parameter: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            transform: BindingTransform::Direct,
            unit: None,
        }
    }

    pub fn offset(parameter: impl Into<String>, base: f64) -> Self {
        Self {
            transform: BindingTransform::Offset { base },
            ..Self::direct(parameter)
        }
    }

    pub fn scale(parameter: impl Into<String>, base: f64) -> Self {
        Self {
            transform: BindingTransform::Scale { base },
            ..Self::direct(parameter)
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    fn parameter_for(&self, value: f64) -> Parameter {
        Parameter {
            name: self.parameter.clone(),
            value: self.transform.apply(value),
            unit: self.unit.clone(),
        }
    }
}

/// One swept dimension.
///
/// Values are `start, start + step, ...` up to `max`. With `snap_first` and a
/// step larger than the start, the axis visits `start` once and then continues
/// from zero: `start, step, 2 * step, ...`. This lets a multiplier axis begin
/// at 1 while still stepping through whole multiples of its factor. Snapping
/// requires a positive start.
///
/// An axis without bindings drives the parameter named after the axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,
    pub start: f64,
    pub step: f64,
    pub max: f64,
    #[serde(default)]
    pub snap_first: bool,
    #[serde(default)]
    pub bindings: Vec<AxisBinding>,
}

impl Axis {
    pub fn new(name: impl Into<String>, start: f64, step: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            start,
            step,
            max,
            snap_first: false,
            bindings: Vec::new(),
        }
    }

    pub fn snap_first(mut self) -> Self {
        self.snap_first = true;
        self
    }

    pub fn bind(mut self, binding: AxisBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Whether the first value is visited once before snapping back to zero
    pub fn snaps(&self) -> bool {
        self.snap_first && self.step > self.start
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.start.is_finite() && self.step.is_finite() && self.max.is_finite()) {
            return Err(ConfigurationError::NonFiniteBound {
                axis: self.name.clone(),
            });
        }
        if self.step <= 0.0 {
            return Err(ConfigurationError::NonPositiveStep {
                axis: self.name.clone(),
                step: self.step,
            });
        }
        if self.snap_first && self.start <= 0.0 {
            return Err(ConfigurationError::SnapFromNonPositive {
                axis: self.name.clone(),
                start: self.start,
            });
        }
        if self.start > self.max {
            return Err(ConfigurationError::EmptyAxis {
                axis: self.name.clone(),
                start: self.start,
                max: self.max,
            });
        }
        let span = if self.snaps() { self.max } else { self.max - self.start };
        if span / self.step >= MAX_AXIS_POINTS as f64 {
            return Err(ConfigurationError::TooManyPoints {
                axis: self.name.clone(),
                limit: MAX_AXIS_POINTS,
            });
        }
        Ok(())
    }

    /// Expand into concrete values. Call [`Axis::validate`] first.
    pub fn values(&self) -> Vec<f64> {
        // Tolerate accumulated rounding at the upper bound.
        let limit = self.max + 1e-9 * self.max.abs().max(1.0);
        let mut values = Vec::new();

        let (origin, first) = if self.snaps() {
            values.push(self.start);
            (0.0, 1u32)
        } else {
            (self.start, 0u32)
        };

        for k in first.. {
            let value = origin + f64::from(k) * self.step;
            if value > limit || values.len() > MAX_AXIS_POINTS {
                break;
            }
            values.push(value);
        }
        values
    }

    /// Parameters this axis writes for `value`
    pub fn parameters_for(&self, value: f64) -> Vec<Parameter> {
        if self.bindings.is_empty() {
            return vec![Parameter::new(self.name.clone(), value)];
        }
        self.bindings
            .iter()
            .map(|binding| binding.parameter_for(value))
            .collect()
    }

    /// Names of the parameters this axis writes
    pub fn parameter_names(&self) -> Vec<&str> {
        if self.bindings.is_empty() {
            return vec![self.name.as_str()];
        }
        self.bindings.iter().map(|b| b.parameter.as_str()).collect()
    }
}

fn default_comment() -> String {
    NO_ERROR.to_string()
}

/// Complete sweep description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSpec {
    /// Applied to every point before axis values
    #[serde(default)]
    pub fixed: Vec<Parameter>,
    /// Outermost axis first; the last axis varies fastest
    #[serde(default)]
    pub axes: Vec<Axis>,
    /// Step-count stopping criterion applied once before the first run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u64>,
    /// Written to the comment column of every row
    #[serde(default = "default_comment")]
    pub comment: String,
}

impl Default for SweepSpec {
    fn default() -> Self {
        Self {
            fixed: Vec::new(),
            axes: Vec::new(),
            max_steps: None,
            comment: default_comment(),
        }
    }
}

impl SweepSpec {
    pub fn fixed(mut self, param: Parameter) -> Self {
        self.fixed.push(param);
        self
    }

    pub fn axis(mut self, axis: Axis) -> Self {
        self.axes.push(axis);
        self
    }

    pub fn max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut seen = HashSet::new();
        for axis in &self.axes {
            if !seen.insert(axis.name.as_str()) {
                return Err(ConfigurationError::DuplicateAxis(axis.name.clone()));
            }
            axis.validate()?;
        }
        self.grid_size()?;
        Ok(())
    }

    /// Number of grid points, refused past [`MAX_SWEEP_POINTS`].
    /// Axes must already be valid.
    fn grid_size(&self) -> Result<usize, ConfigurationError> {
        let too_many = ConfigurationError::TooManyRuns {
            limit: MAX_SWEEP_POINTS,
        };
        self.axes.iter().try_fold(1usize, |total, axis| {
            total
                .checked_mul(axis.values().len())
                .filter(|&n| n <= MAX_SWEEP_POINTS)
                .ok_or_else(|| too_many.clone())
        })
    }

    /// Every parameter name the sweep writes, fixed parameters first
    pub fn parameter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fixed.iter().map(|p| p.name.as_str()).collect();
        for axis in &self.axes {
            for name in axis.parameter_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Validate and expand axis values
    pub fn plan(&self) -> Result<SweepPlan<'_>, ConfigurationError> {
        self.validate()?;
        Ok(SweepPlan {
            spec: self,
            values: self.axes.iter().map(Axis::values).collect(),
        })
    }
}

/// A validated sweep with expanded axis values.
#[derive(Debug, Clone)]
pub struct SweepPlan<'a> {
    spec: &'a SweepSpec,
    values: Vec<Vec<f64>>,
}

impl<'a> SweepPlan<'a> {
    /// Values of each axis, outermost first
    pub fn axis_values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Number of points per axis
    pub fn shape(&self) -> Vec<usize> {
        self.values.iter().map(Vec::len).collect()
    }

    pub fn total_points(&self) -> usize {
        self.values.iter().map(Vec::len).product()
    }

    /// Parameter set for the point at `indices` (one index per axis)
    pub fn point_at(&self, indices: &[usize]) -> Option<ParameterSet> {
        if indices.len() != self.values.len() {
            return None;
        }
        let mut params: ParameterSet = self.spec.fixed.iter().cloned().collect();
        for ((axis, values), &idx) in self.spec.axes.iter().zip(&self.values).zip(indices) {
            let value = *values.get(idx)?;
            for param in axis.parameters_for(value) {
                params.set(param);
            }
        }
        Some(params)
    }

    /// Fresh iterator over every point in grid order
    pub fn points(&self) -> SweepPoints<'_> {
        SweepPoints {
            plan: self,
            current: vec![0; self.values.len()],
            done: self.total_points() == 0,
        }
    }
}

/// One grid point ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub indices: Vec<usize>,
    pub params: ParameterSet,
}

/// Iterator over sweep points, last axis varying fastest
pub struct SweepPoints<'p> {
    plan: &'p SweepPlan<'p>,
    current: Vec<usize>,
    done: bool,
}

impl Iterator for SweepPoints<'_> {
    type Item = SweepPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let indices = self.current.clone();
        let params = self.plan.point_at(&indices)?;

        // Odometer increment; a sweep with no axes yields exactly one point.
        self.done = true;
        for i in (0..self.current.len()).rev() {
            self.current[i] += 1;
            if self.current[i] < self.plan.values[i].len() {
                self.done = false;
                break;
            }
            self.current[i] = 0;
        }

        Some(SweepPoint { indices, params })
    }
}
