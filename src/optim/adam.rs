use crate::layers::Param;

/// Adam optimizer with the usual defaults (β1 = 0.9, β2 = 0.999, ε = 1e-7).
///
/// Moment buffers are allocated lazily, one per parameter buffer, in the
/// order `step` receives them. The network must therefore always hand its
/// parameters over in the same order.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    t: u64,
    moments: Vec<(Vec<f64>, Vec<f64>)>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            t: 0,
            moments: Vec::new(),
        }
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> u64 {
        self.t
    }

    /// Applies one update to every buffer in `params`, using `grads * grad_scale`
    /// as the gradient, then zeroes the gradients.
    pub fn step(&mut self, params: Vec<Param<'_>>, grad_scale: f64) {
        self.t += 1;
        let t = self.t as i32;
        let lr_t = self.learning_rate * (1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t));

        for (i, param) in params.into_iter().enumerate() {
            if self.moments.len() <= i {
                self.moments.push((vec![0.0; param.values.len()], vec![0.0; param.values.len()]));
            }
            let (m, v) = &mut self.moments[i];
            for (((w, g), m), v) in param.values.iter_mut()
                .zip(param.grads.iter_mut())
                .zip(m.iter_mut())
                .zip(v.iter_mut())
            {
                let grad = *g * grad_scale;
                *m = self.beta1 * *m + (1.0 - self.beta1) * grad;
                *v = self.beta2 * *v + (1.0 - self.beta2) * grad * grad;
                *w -= lr_t * *m / (v.sqrt() + self.epsilon);
                *g = 0.0;
            }
        }
    }
}
