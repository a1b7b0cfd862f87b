use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::dataset::split::{Dataset, Split};
use crate::error::Result;
use crate::label::Diagnosis;
use crate::preprocess::{load_grayscale, IMAGE_SIZE};

/// Split directories expected under the dataset root.
pub const SPLIT_NAMES: [&str; 3] = ["train", "test", "val"];

/// Loads `train/`, `test/` and `val/` under `root`.
pub fn load_dataset(root: &Path) -> Result<Dataset> {
    info!("loading dataset from {}", root.display());
    Ok(Dataset {
        train: load_split(&root.join("train"))?,
        test: load_split(&root.join("test"))?,
        val: load_split(&root.join("val"))?,
    })
}

/// Loads one split at the model's input resolution.
pub fn load_split(dir: &Path) -> Result<Split> {
    load_split_sized(dir, IMAGE_SIZE)
}

/// Loads `dir/NORMAL` and `dir/PNEUMONIA`, resizing every image to
/// `size × size`.
///
/// Files that fail to decode are logged and skipped. A missing label
/// directory is logged and contributes no samples. Any other I/O error
/// while listing a directory is returned.
pub fn load_split_sized(dir: &Path, size: u32) -> Result<Split> {
    let mut split = Split::default();

    for label in Diagnosis::ALL {
        let label_dir = dir.join(label.folder_name());
        let files = match list_files(&label_dir) {
            Ok(files) => files,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("{} not found, no {} samples loaded", label_dir.display(), label.as_str());
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        info!("loading {} ({} files)", label_dir.display(), files.len());
        let mut loaded = 0;
        for path in &files {
            match load_grayscale(path, size) {
                Ok(image) => {
                    split.push(image, label);
                    loaded += 1;
                }
                Err(e) => warn!("error loading {}: {}", path.display(), e),
            }
        }
        debug!("{}: kept {} of {} files", label_dir.display(), loaded, files.len());
    }

    Ok(split)
}

/// Regular files (or links to them) directly inside `dir`, sorted by name.
fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        // `is_file` follows symlinks, so linked images are loaded too.
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
