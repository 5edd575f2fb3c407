//! Gaussian field sources.

use super::flux::{cross, Vec3};
use crate::arrays::{Direction, FieldType};
use crate::geometry::Point;
use crate::model::{Material, Model};
use crate::{Error, Result};

/// How a source enters the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Injection {
    /// Added to the state once, before the first step.
    #[default]
    Initial,
    /// Travels in along +x through absorbing boundary faces for the whole run.
    Boundary,
}

/// Gaussian profile along the principal (x) axis of the model.
///
/// `evaluate(p) = coefficient * exp(-20 * (spread * (x - (center + delay)) / width)^2)`,
/// where `center` and `width` are the midpoint and extent of the model's
/// bounding box along x, captured when the source is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    spread: f64,
    coefficient: f64,
    delay: f64,
    direction: Direction,
    field_type: FieldType,
    injection: Injection,
    center: f64,
    width: f64,
}

impl Source {
    /// Unit-amplitude pulse centred in the domain.
    pub fn gaussian(
        model: &Model,
        spread: f64,
        direction: Direction,
        field_type: FieldType,
    ) -> Result<Self> {
        if !(spread.is_finite() && spread > 0.0) {
            return Err(Error::Config(format!(
                "source spread must be positive (got {spread})"
            )));
        }
        let bbox = model.bounding_box();
        let width = bbox.extent(0);
        if width <= 0.0 {
            return Err(Error::Config("model has zero extent along x".into()));
        }
        Ok(Self {
            spread,
            coefficient: 1.0,
            delay: 0.0,
            direction,
            field_type,
            injection: Injection::Initial,
            center: bbox.center(0),
            width,
        })
    }

    /// Scale the profile.
    pub fn with_coefficient(mut self, coefficient: f64) -> Self {
        self.coefficient = coefficient;
        self
    }

    /// Shift the pulse centre by `delay` along x.
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    /// Choose how the source enters the simulation.
    pub fn with_injection(mut self, injection: Injection) -> Self {
        self.injection = injection;
        self
    }

    /// Spread factor.
    pub fn spread(&self) -> f64 {
        self.spread
    }

    /// Amplitude.
    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Offset of the pulse centre from the domain midpoint.
    pub fn delay(&self) -> f64 {
        self.delay
    }

    /// Field component direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Field the source writes into.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Injection mode.
    pub fn injection(&self) -> Injection {
        self.injection
    }

    /// Profile value at a position; only the x coordinate matters.
    #[inline]
    pub fn evaluate(&self, position: &Point) -> f64 {
        self.profile(position[0])
    }

    #[inline]
    fn profile(&self, x: f64) -> f64 {
        let arg = self.spread * (x - (self.center + self.delay)) / self.width;
        self.coefficient * (-20.0 * arg * arg).exp()
    }

    /// Plane-wave field `(E, H)` at `position` and `time` in `material`.
    ///
    /// The profile moves along +x at the local wave speed; the companion
    /// field follows from the impedance.
    pub fn incident(&self, position: &Point, time: f64, material: &Material) -> (Vec3, Vec3) {
        let s = self.profile(position[0] - material.wave_speed() * time);
        let d = self.direction.unit();
        let x = Direction::X.unit();
        let z = material.impedance();
        match self.field_type {
            FieldType::E => (d.map(|v| v * s), cross(&x, &d).map(|v| v * s / z)),
            FieldType::H => (cross(&d, &x).map(|v| v * s * z), d.map(|v| v * s)),
        }
    }
}

/// Ordered collection of sources.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    sources: Vec<Source>,
}

impl Sources {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source.
    pub fn add_source(&mut self, source: Source) -> &mut Self {
        self.sources.push(source);
        self
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Source> {
        self.sources.iter()
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether there are no sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl FromIterator<Source> for Sources {
    fn from_iter<T: IntoIterator<Item = Source>>(iter: T) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Sources {
    type Item = &'a Source;
    type IntoIter = std::slice::Iter<'a, Source>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}
