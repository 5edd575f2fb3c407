//! Point probes recording field time series.

use crate::arrays::{Direction, FieldType};
use crate::geometry::Point;
use crate::model::Model;
use crate::{Error, Result};
use nalgebra::DMatrix;

/// One recorded sample: the time and the value at each probe point.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSample {
    /// Simulated time of the sample
    pub time: f64,
    /// One value per probe point, in column order
    pub values: Vec<f64>,
}

/// A set of points sampling one field component.
#[derive(Debug, Clone)]
pub struct Probe {
    field_type: FieldType,
    direction: Direction,
    points: DMatrix<f64>,
    samples: Vec<ProbeSample>,
}

impl Probe {
    /// Probe with one point per column of `points` (`dim` rows).
    pub fn new(field_type: FieldType, direction: Direction, points: DMatrix<f64>) -> Self {
        Self {
            field_type,
            direction,
            points,
            samples: Vec::new(),
        }
    }

    /// Probe at a single 1-D coordinate.
    pub fn at(field_type: FieldType, direction: Direction, x: f64) -> Self {
        Self::new(field_type, direction, DMatrix::from_element(1, 1, x))
    }

    /// Sampled field.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Sampled component direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Point coordinates, one column per point.
    pub fn points(&self) -> &DMatrix<f64> {
        &self.points
    }

    /// Recorded series, oldest first.
    pub fn samples(&self) -> &[ProbeSample] {
        &self.samples
    }

    /// Sample whose time is closest to `time`.
    pub fn closest_sample(&self, time: f64) -> Option<&ProbeSample> {
        self.samples
            .iter()
            .min_by(|a, b| (a.time - time).abs().total_cmp(&(b.time - time).abs()))
    }

    pub(crate) fn push(&mut self, sample: ProbeSample) {
        self.samples.push(sample);
    }

    /// Resolve every point to its element and reference coordinates.
    pub(crate) fn locate(&self, model: &Model) -> Result<Vec<(usize, Point)>> {
        let dim = model.dim();
        if self.points.nrows() != dim {
            return Err(Error::Sampling(format!(
                "probe points have {} rows but the mesh is {dim}-D",
                self.points.nrows()
            )));
        }
        self.points
            .column_iter()
            .enumerate()
            .map(|(i, column)| {
                let mut point = [0.0; 3];
                for k in 0..dim {
                    point[k] = column[k];
                }
                model.locate(&point).ok_or_else(|| {
                    Error::Sampling(format!(
                        "probe point {i} at {:?} lies outside the mesh",
                        &point[..dim]
                    ))
                })
            })
            .collect()
    }
}

/// Ordered collection of probes.
#[derive(Debug, Clone, Default)]
pub struct Probes {
    probes: Vec<Probe>,
}

impl Probes {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a probe.
    pub fn add_probe(&mut self, probe: Probe) -> &mut Self {
        self.probes.push(probe);
        self
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Probe> {
        self.probes.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Probe> {
        self.probes.iter_mut()
    }

    /// Probe by insertion index.
    pub fn get(&self, index: usize) -> Option<&Probe> {
        self.probes.get(index)
    }

    /// Number of probes.
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    /// Whether there are no probes.
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

impl FromIterator<Probe> for Probes {
    fn from_iter<T: IntoIterator<Item = Probe>>(iter: T) -> Self {
        Self {
            probes: iter.into_iter().collect(),
        }
    }
}
