//! Observer hooks for solver runs.
//!
//! Observers see the state at the start of a run, at every sampling step and
//! at the end. They never mutate fields; export, live plotting or custom
//! stopping criteria all hang off these hooks.
//!
//! # Run cycle
//!
//! 1. `on_start` - after sources are applied, before the first step
//! 2. steps; every `visualization_stride` steps `on_sample` then `check_termination`
//! 3. `on_finish` - once, after the last step or an early stop

use crate::arrays::{Direction, FieldState, FieldType};
use crate::model::Model;
use crate::Result;
use nalgebra::DVector;

/// Read-only view of the solver state handed to observers.
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'s> {
    /// Steps taken so far
    pub step: u64,
    /// Simulated time
    pub time: f64,
    state: &'s FieldState,
    model: &'s Model,
}

impl<'s> FieldView<'s> {
    pub(crate) fn new(step: u64, time: f64, state: &'s FieldState, model: &'s Model) -> Self {
        Self {
            step,
            time,
            state,
            model,
        }
    }

    /// The full coefficient arena.
    pub fn state(&self) -> &'s FieldState {
        self.state
    }

    /// The model being simulated.
    pub fn model(&self) -> &'s Model {
        self.model
    }

    /// Snapshot of one component; inactive directions are rejected.
    pub fn component(&self, field: FieldType, direction: Direction) -> Result<DVector<f64>> {
        self.state
            .active_component(field, direction, self.model.dim())
    }
}

/// Hooks into a solver run.
///
/// Every hook has a default no-op body, so observers only implement what
/// they need.
pub trait Observer {
    /// Name for logging.
    fn name(&self) -> &str;

    /// Called once before the first step.
    fn on_start(&mut self, _view: &FieldView<'_>) -> Result<()> {
        Ok(())
    }

    /// Called every `visualization_stride` steps.
    fn on_sample(&mut self, _view: &FieldView<'_>) -> Result<()> {
        Ok(())
    }

    /// Called once after the last step.
    fn on_finish(&mut self, _view: &FieldView<'_>) -> Result<()> {
        Ok(())
    }

    /// Checked after every sample. Return `Some(reason)` to stop the run.
    fn check_termination(&self) -> Option<String> {
        None
    }
}

impl Observer for () {
    fn name(&self) -> &str {
        "none"
    }
}

/// One stored snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    /// Step index
    pub step: u64,
    /// Simulated time
    pub time: f64,
    /// One vector per recorded component, in registration order
    pub values: Vec<DVector<f64>>,
}

/// Observer keeping in-memory snapshots of selected components.
#[derive(Debug, Clone, Default)]
pub struct FieldRecorder {
    components: Vec<(FieldType, Direction)>,
    frames: Vec<RecordedFrame>,
    max_frames: Option<usize>,
}

impl FieldRecorder {
    /// Recorder for the given components.
    pub fn new(components: impl IntoIterator<Item = (FieldType, Direction)>) -> Self {
        Self {
            components: components.into_iter().collect(),
            frames: Vec::new(),
            max_frames: None,
        }
    }

    /// Stop the run once `max_frames` snapshots are stored.
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// Stored snapshots, oldest first.
    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    fn record(&mut self, view: &FieldView<'_>) -> Result<()> {
        let values = self
            .components
            .iter()
            .map(|&(field, direction)| view.component(field, direction))
            .collect::<Result<Vec<_>>>()?;
        self.frames.push(RecordedFrame {
            step: view.step,
            time: view.time,
            values,
        });
        Ok(())
    }
}

impl Observer for FieldRecorder {
    fn name(&self) -> &str {
        "field-recorder"
    }

    fn on_start(&mut self, view: &FieldView<'_>) -> Result<()> {
        self.record(view)
    }

    fn on_sample(&mut self, view: &FieldView<'_>) -> Result<()> {
        self.record(view)
    }

    fn on_finish(&mut self, view: &FieldView<'_>) -> Result<()> {
        // Skip a duplicate when the run ends on a sampling step.
        if self.frames.last().map(|f| f.step) != Some(view.step) {
            self.record(view)?;
        }
        Ok(())
    }

    fn check_termination(&self) -> Option<String> {
        match self.max_frames {
            Some(max) if self.frames.len() >= max => {
                Some(format!("recorded {} frames", self.frames.len()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mesh;
    use crate::model::Material;

    #[test]
    fn test_default_hooks() {
        let model = Model::new(Mesh::cartesian_1d(2, 1.0).unwrap(), [(1, Material::vacuum())]).unwrap();
        let state = FieldState::zeros(2, 4);
        let view = FieldView::new(0, 0.0, &state, &model);

        let mut observer = ();
        assert_eq!(observer.name(), "none");
        observer.on_start(&view).unwrap();
        observer.on_sample(&view).unwrap();
        observer.on_finish(&view).unwrap();
        assert_eq!(observer.check_termination(), None);
    }

    #[test]
    fn test_recorder_frames() {
        let model = Model::new(Mesh::cartesian_1d(2, 1.0).unwrap(), [(1, Material::vacuum())]).unwrap();
        let mut state = FieldState::zeros(2, 4);
        state.element_component_mut(1, FieldType::E, Direction::Y)[0] = 2.0;

        let mut recorder =
            FieldRecorder::new([(FieldType::E, Direction::Y), (FieldType::H, Direction::Z)])
                .with_max_frames(2);
        recorder.on_start(&FieldView::new(0, 0.0, &state, &model)).unwrap();
        assert_eq!(recorder.check_termination(), None);
        recorder.on_sample(&FieldView::new(10, 0.1, &state, &model)).unwrap();
        recorder.on_finish(&FieldView::new(10, 0.1, &state, &model)).unwrap();

        assert_eq!(recorder.frames().len(), 2);
        assert_eq!(recorder.frames()[1].values[0][4], 2.0);
        assert!(recorder.check_termination().is_some());
    }

    #[test]
    fn test_recorder_rejects_inactive_component() {
        let model = Model::new(Mesh::cartesian_1d(2, 1.0).unwrap(), [(1, Material::vacuum())]).unwrap();
        let state = FieldState::zeros(2, 4);
        let mut recorder = FieldRecorder::new([(FieldType::E, Direction::X)]);
        assert!(recorder.on_start(&FieldView::new(0, 0.0, &state, &model)).is_err());
    }
}
