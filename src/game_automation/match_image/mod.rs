//! Image matching for Android game automation
//!
//! Structural similarity between equally shaped images, subimage localization
//! of templates inside screenshots, and the screen regions used to crop them.

pub mod locator;
pub mod region;
pub mod similarity;


// Re-export main types and functions
pub use locator::{NccLocator, SubimageLocator};
pub use region::Region;
pub use similarity::{SSIM_WINDOW, SimilarityEngine, shape, structural_similarity};
