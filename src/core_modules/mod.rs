pub mod blob_detector;
pub mod color_mask;
pub mod frame;
pub mod side_assigner;
pub mod smoother;
pub mod utils;
