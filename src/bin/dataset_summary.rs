//! Loads every dataset split and prints sample counts and label balance.
//!
//!   cargo run --release --bin dataset-summary

use anyhow::{Context, Result};

use xray_classifier::dataset::{load_split, SPLIT_NAMES};
use xray_classifier::AppConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let root = &config.dataset.root;

    println!("dataset: {}", root.display());
    println!("{:<6} {:>8} {:>8} {:>10} {:>11}", "split", "total", "normal", "pneumonia", "% pneumonia");
    for name in SPLIT_NAMES {
        let split = load_split(&root.join(name))
            .with_context(|| format!("failed to load split '{name}'"))?;
        let (normal, pneumonia) = split.label_counts();
        let share = if split.is_empty() {
            0.0
        } else {
            100.0 * pneumonia as f64 / split.len() as f64
        };
        println!("{:<6} {:>8} {:>8} {:>10} {:>10.1}%", name, split.len(), normal, pneumonia, share);
    }

    Ok(())
}
