use rand::Rng;

/// Glorot (Xavier) uniform initialization: samples `n` values from
/// U(-limit, limit) with `limit = sqrt(6 / (fan_in + fan_out))`.
///
/// For a convolution, `fan_in = k * k * in_channels` and
/// `fan_out = k * k * out_channels`.
pub fn glorot_uniform<R: Rng + ?Sized>(n: usize, fan_in: usize, fan_out: usize, rng: &mut R) -> Vec<f64> {
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    (0..n).map(|_| rng.gen_range(-limit..limit)).collect()
}
