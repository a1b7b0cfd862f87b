use serde::{Serialize, Deserialize};

/// Probability above which a prediction is reported as pneumonia.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// The two classes, with the numeric value the model is trained against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diagnosis {
    Normal = 0,
    Pneumonia = 1,
}

impl Diagnosis {
    pub const ALL: [Diagnosis; 2] = [Diagnosis::Normal, Diagnosis::Pneumonia];

    /// Dataset sub-directory holding samples of this class.
    pub fn folder_name(&self) -> &'static str {
        match self {
            Diagnosis::Normal => "NORMAL",
            Diagnosis::Pneumonia => "PNEUMONIA",
        }
    }

    /// Label returned by the prediction endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnosis::Normal => "Normal",
            Diagnosis::Pneumonia => "Pneumonia",
        }
    }

    /// Training target for the sigmoid output.
    pub fn target(&self) -> f64 {
        *self as u8 as f64
    }

    /// Thresholds a pneumonia probability: strictly above 0.5 is pneumonia.
    pub fn from_probability(p: f64) -> Diagnosis {
        if p > DECISION_THRESHOLD { Diagnosis::Pneumonia } else { Diagnosis::Normal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strict() {
        assert_eq!(Diagnosis::from_probability(0.5), Diagnosis::Normal);
        assert_eq!(Diagnosis::from_probability(0.500001), Diagnosis::Pneumonia);
        assert_eq!(Diagnosis::from_probability(0.0), Diagnosis::Normal);
        assert_eq!(Diagnosis::from_probability(1.0), Diagnosis::Pneumonia);
    }

    #[test]
    fn targets_follow_folder_convention() {
        assert_eq!(Diagnosis::Normal.target(), 0.0);
        assert_eq!(Diagnosis::Pneumonia.target(), 1.0);
        assert_eq!(Diagnosis::Pneumonia.folder_name(), "PNEUMONIA");
    }
}
