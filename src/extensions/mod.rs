//! Run observers.

mod observer;

pub use observer::{FieldRecorder, FieldView, Observer, RecordedFrame};
