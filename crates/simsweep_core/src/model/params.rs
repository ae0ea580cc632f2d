use serde::{Deserialize, Serialize};

/// A named scalar simulation input.
///
/// The unit is metadata handed to the engine; only the raw value is logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Ordered parameter values for a single run.
///
/// Insertion order is preserved. Setting an existing name replaces its value in
/// place, keeping the previous unit when the new parameter carries none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: Vec<Parameter>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, param: Parameter) {
        match self.params.iter_mut().find(|p| p.name == param.name) {
            Some(existing) => {
                existing.value = param.value;
                if param.unit.is_some() {
                    existing.unit = param.unit;
                }
            }
            None => self.params.push(param),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(|p| p.value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// One-line human readable form, e.g. `Back Offset=6 m, Side Scale=1`.
    pub fn describe(&self) -> String {
        self.params
            .iter()
            .map(|p| match &p.unit {
                Some(unit) => format!("{}={} {}", p.name, format_value(p.value), unit),
                None => format!("{}={}", p.name, format_value(p.value)),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<Parameter> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for param in iter {
            set.set(param);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

/// Render a value the way it is written to the results log.
///
/// Whole numbers print without a fractional part (`6`, not `6.0`).
pub fn format_value(value: f64) -> String {
    format!("{value}")
}
