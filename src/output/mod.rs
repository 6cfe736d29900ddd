mod artifact;
mod cutout;
mod overlay;

pub use artifact::ImageArtifact;
pub use cutout::{apply_mask_alpha, extract, ExtractOptions, MismatchPolicy};
pub use overlay::{OverlayRenderer, OverlayStyle};
