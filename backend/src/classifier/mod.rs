pub mod random;

pub use random::RandomClassifier;

use image::DynamicImage;
use shared::DiseaseClass;

#[derive(Debug, Clone, Copy)]
pub struct Classification {
    pub label: DiseaseClass,
    pub confidence: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Capability interface for the screening model. The upload pipeline only
/// sees this trait, so the placeholder below can be replaced with a real
/// model without touching any handler code.
pub trait Classifier: Send + Sync {
    fn classify(&self, image: &DynamicImage) -> Result<Classification, ClassifierError>;
}
