use crate::label::Diagnosis;
use crate::math::tensor::Tensor;

/// One dataset split: parallel vectors of preprocessed images and labels.
#[derive(Debug, Clone, Default)]
pub struct Split {
    pub images: Vec<Tensor>,
    pub labels: Vec<Diagnosis>,
}

impl Split {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn push(&mut self, image: Tensor, label: Diagnosis) {
        self.images.push(image);
        self.labels.push(label);
    }

    /// `(normal, pneumonia)` sample counts.
    pub fn label_counts(&self) -> (usize, usize) {
        let pneumonia = self.labels.iter().filter(|&&l| l == Diagnosis::Pneumonia).count();
        (self.labels.len() - pneumonia, pneumonia)
    }

    pub fn inputs(&self) -> &[Tensor] {
        &self.images
    }

    /// Training targets (0.0 / 1.0), one single-element vector per sample.
    pub fn targets(&self) -> Vec<Vec<f64>> {
        self.labels.iter().map(|l| vec![l.target()]).collect()
    }
}

/// The three splits of the chest X-ray dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub train: Split,
    pub test: Split,
    pub val: Split,
}
