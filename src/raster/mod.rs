/// Visual-to-frame rasterization.
pub mod frame;
