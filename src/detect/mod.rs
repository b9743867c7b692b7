mod detector;
mod ensemble;
mod neural;
mod people;
mod stub;

pub use detector::{
    BBox, ClassifierTuning, Detector, DetectorKind, InferenceModel, ModelOutput, RawDetection,
    RegionClassifier,
};
pub use ensemble::{default_stage_labels, stage_tuning, EnsembleDetector, EnsembleStage};
pub use neural::NeuralDetector;
pub use people::PeopleDetector;
pub use stub::{StubClassifier, StubModel};
