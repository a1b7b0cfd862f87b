//! Trains the chest X-ray CNN and writes the model artifact.
//!
//! Run with:
//!   cargo run --release --bin xray-train
//!
//! Paths and hyperparameters come from `xray.toml` and `XRAY__*`
//! environment variables, e.g. `XRAY__TRAINING__EPOCHS=3`.

use anyhow::{Context, Result};
use log::{info, warn};

use xray_classifier::{evaluate, load_dataset, train_loop, AppConfig, NetworkSpec, TrainConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let train_config = TrainConfig::from(&config.training);

    let dataset = load_dataset(&config.dataset.root)
        .with_context(|| format!("failed to load dataset from {}", config.dataset.root.display()))?;
    for (name, split) in [("train", &dataset.train), ("val", &dataset.val), ("test", &dataset.test)] {
        let (normal, pneumonia) = split.label_counts();
        info!("{name}: {} samples ({normal} normal, {pneumonia} pneumonia)", split.len());
    }

    let spec = NetworkSpec::xray_cnn();
    let mut network = spec.build(&mut train_config.rng())?;
    info!("built {} with {} trainable parameters", spec.name, network.parameter_count());

    let train_targets = dataset.train.targets();
    let val_targets = dataset.val.targets();
    let validation = if dataset.val.is_empty() {
        warn!("validation split is empty, training without validation");
        None
    } else {
        Some((dataset.val.inputs(), val_targets.as_slice()))
    };

    train_loop(
        &mut network,
        dataset.train.inputs(),
        &train_targets,
        validation,
        &train_config,
    )
    .context("training failed")?;

    if dataset.test.is_empty() {
        warn!("test split is empty, skipping final evaluation");
    } else {
        let eval = evaluate(&network, dataset.test.inputs(), &dataset.test.targets())?;
        info!("test loss: {:.4} - test accuracy: {:.4}", eval.loss, eval.accuracy);
    }

    network
        .save_json(&config.model.path)
        .with_context(|| format!("failed to save model to {}", config.model.path.display()))?;
    info!("model saved to {}", config.model.path.display());

    Ok(())
}
