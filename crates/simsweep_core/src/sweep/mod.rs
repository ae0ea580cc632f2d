//! Parameter sweeps over ranged, coupled axes.
//!
//! A [`SweepSpec`] declares fixed parameters and a list of axes, outermost
//! first. Each axis walks `start..=max` by `step` and writes its value into one
//! or more parameters through [`AxisBinding`]s, so a single axis can drive
//! several coupled inputs:
//!
//! ```ignore
//! let length = Axis::new("length", 0.0, 2.0, 4.0)
//!     .bind(AxisBinding::offset("Back Offset", 9.0))
//!     .bind(AxisBinding::offset("Front Offset", 4.0));
//! let frontal = Axis::new("frontal", 1.0, 1.5, 3.0)
//!     .snap_first()
//!     .bind(AxisBinding::scale("Side Offset", 2.0))
//!     .bind(AxisBinding::scale("Top Offset", 3.0));
//! let spec = SweepSpec::default().axis(length).axis(frontal);
//! ```
//!
//! [`SweepController`] expands a [`SweepSpec`] and drives one run per point.

mod controller;
mod spec;

pub use controller::{SweepController, SweepState, SweepSummary};
pub use spec::{
    Axis, AxisBinding, BindingTransform, MAX_AXIS_POINTS, MAX_SWEEP_POINTS, SweepPlan, SweepPoint,
    SweepPoints, SweepSpec,
};
