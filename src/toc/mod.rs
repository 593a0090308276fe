pub mod classify;
pub mod outline;
pub mod pages;
pub mod segment;
#[cfg(test)]
mod tests;

pub use classify::{PatternCatalog, apply_indentation, depth_jumps};
pub use outline::OutlineTree;
pub use pages::{apply_none_page, apply_page_offset};
pub use segment::segment_images;
