pub mod loader;
pub mod split;

pub use loader::{load_dataset, load_split, load_split_sized, SPLIT_NAMES};
pub use split::{Dataset, Split};
