use std::time::Instant;

use log::{debug, info};
use rand::seq::SliceRandom;

use crate::error::{Result, XrayError};
use crate::label::DECISION_THRESHOLD;
use crate::loss::bce::BceLoss;
use crate::math::tensor::Tensor;
use crate::network::network::Network;
use crate::optim::adam::Adam;
use crate::train::epoch_stats::{EpochStats, Evaluation};
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Trains `network` with mini-batch Adam on binary cross-entropy and returns
/// one `EpochStats` per epoch.
///
/// # Arguments
/// - `network`: modified in place
/// - `train_inputs`: training samples, each shaped like `network.input_shape`
/// - `train_labels`: targets, one `[0.0]` / `[1.0]` vector per sample
/// - `validation`: optional `(inputs, labels)` evaluated after every epoch
/// - `config`: epochs, batch size, learning rate, seed
///
/// Sample order is reshuffled every epoch. There is no early stopping and no
/// checkpointing: the network holds whatever the last epoch produced.
pub fn train_loop(
    network: &mut Network,
    train_inputs: &[Tensor],
    train_labels: &[Vec<f64>],
    validation: Option<(&[Tensor], &[Vec<f64>])>,
    config: &TrainConfig,
) -> Result<Vec<EpochStats>> {
    if train_inputs.is_empty() {
        return Err(XrayError::EmptyDataset("no training samples".to_string()));
    }
    if train_inputs.len() != train_labels.len() {
        return Err(XrayError::ShapeMismatch {
            what: "training labels",
            got: train_labels.len(),
            expected: train_inputs.len(),
        });
    }
    if config.batch_size == 0 {
        return Err(XrayError::InvalidTraining("batch_size must be at least 1".to_string()));
    }
    let validation = validation.filter(|(inputs, _)| !inputs.is_empty());

    let mut rng = config.rng();
    let mut optimizer = Adam::new(config.learning_rate);
    let mut history = Vec::with_capacity(config.epochs);

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        let (train_loss, train_accuracy) = run_one_epoch(
            network,
            train_inputs,
            train_labels,
            &mut optimizer,
            config.batch_size,
            &mut rng,
        )?;

        let (val_loss, val_accuracy) = match validation {
            Some((inputs, labels)) => {
                let eval = evaluate(network, inputs, labels)?;
                (Some(eval.loss), Some(eval.accuracy))
            }
            None => (None, None),
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            train_accuracy,
            val_loss,
            val_accuracy,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        log_epoch(&stats);
        history.push(stats);
    }

    Ok(history)
}

/// Mean BCE loss and accuracy over a labelled set, in inference mode
/// (dropout off, no gradients).
pub fn evaluate(network: &Network, inputs: &[Tensor], labels: &[Vec<f64>]) -> Result<Evaluation> {
    let n = inputs.len();
    if labels.len() != n {
        return Err(XrayError::ShapeMismatch {
            what: "evaluation labels",
            got: labels.len(),
            expected: n,
        });
    }
    if n == 0 {
        return Ok(Evaluation { loss: 0.0, accuracy: 0.0 });
    }
    let mut total_loss = 0.0;
    let mut correct = 0;
    for (input, label) in inputs.iter().zip(labels.iter()) {
        let output = network.predict(input)?;
        total_loss += BceLoss::loss(&output, label);
        if is_correct(&output, label) {
            correct += 1;
        }
    }
    Ok(Evaluation {
        loss: total_loss / n as f64,
        accuracy: correct as f64 / n as f64,
    })
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Runs one full epoch of mini-batch Adam over the training data.
/// Returns the mean loss and accuracy over all samples.
fn run_one_epoch<R: rand::Rng>(
    network: &mut Network,
    inputs: &[Tensor],
    labels: &[Vec<f64>],
    optimizer: &mut Adam,
    batch_size: usize,
    rng: &mut R,
) -> Result<(f64, f64)> {
    let n = inputs.len();
    let mut total_loss = 0.0;
    let mut correct = 0;

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    for (batch_no, batch) in indices.chunks(batch_size).enumerate() {
        for &idx in batch {
            let expected = &labels[idx];
            let output = network.forward_train(&inputs[idx], rng)?;

            total_loss += BceLoss::loss(&output, expected);
            if is_correct(&output, expected) {
                correct += 1;
            }

            network.backward(BceLoss::derivative(&output, expected));
        }

        // Gradients were summed over the batch; average them in the update.
        optimizer.step(network.params_mut(), 1.0 / batch.len() as f64);

        if batch_no % 20 == 0 {
            debug!("batch {} / {}", batch_no + 1, n.div_ceil(batch_size));
        }
    }

    Ok((total_loss / n as f64, correct as f64 / n as f64))
}

/// Single-output classification check at the 0.5 decision threshold.
fn is_correct(output: &[f64], expected: &[f64]) -> bool {
    match (output.first(), expected.first()) {
        (Some(&p), Some(&y)) => (p > DECISION_THRESHOLD) == (y > DECISION_THRESHOLD),
        _ => false,
    }
}

fn log_epoch(s: &EpochStats) {
    match (s.val_loss, s.val_accuracy) {
        (Some(vl), Some(va)) => info!(
            "epoch {}/{} - {}ms - loss: {:.4} - accuracy: {:.4} - val_loss: {:.4} - val_accuracy: {:.4}",
            s.epoch, s.total_epochs, s.elapsed_ms, s.train_loss, s.train_accuracy, vl, va
        ),
        _ => info!(
            "epoch {}/{} - {}ms - loss: {:.4} - accuracy: {:.4}",
            s.epoch, s.total_epochs, s.elapsed_ms, s.train_loss, s.train_accuracy
        ),
    }
}
