use image::DynamicImage;
use rand::Rng;

use shared::DiseaseClass;

use super::{Classification, Classifier, ClassifierError};

/// Stand-in classifier used while no trained model is wired in: a uniform
/// label with a confidence drawn from [0.70, 0.95).
pub struct RandomClassifier;

impl Classifier for RandomClassifier {
    fn classify(&self, _image: &DynamicImage) -> Result<Classification, ClassifierError> {
        let mut rng = rand::rng();
        let label = DiseaseClass::ALL[rng.random_range(0..DiseaseClass::ALL.len())];
        let confidence = rng.random_range(0.70..0.95);
        Ok(Classification { label, confidence })
    }
}
