pub mod pattern;
pub mod preview;

pub use pattern::length_bounds;
pub use preview::{preview, PREVIEW_LEN};
