use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationFunction {
    ReLU,
    Sigmoid,
    Identity,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Sigmoid => sigmoid(x),
            ActivationFunction::Identity => x,
        }
    }

    /// Derivative with respect to the pre-activation `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Sigmoid => {
                let fx = sigmoid(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::Identity => 1.0,
        }
    }
}

/// Logistic function, split on sign so large |x| never overflows `exp`.
fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_bounded_for_extreme_inputs() {
        let s = ActivationFunction::Sigmoid;
        assert_eq!(s.function(0.0), 0.5);
        assert!(s.function(1000.0) <= 1.0);
        assert!(s.function(-1000.0) >= 0.0);
        assert!(!s.function(-1000.0).is_nan());
    }

    #[test]
    fn relu_derivative_is_step() {
        let r = ActivationFunction::ReLU;
        assert_eq!(r.function(-2.0), 0.0);
        assert_eq!(r.function(3.0), 3.0);
        assert_eq!(r.derivative(-2.0), 0.0);
        assert_eq!(r.derivative(3.0), 1.0);
    }
}
