pub mod analysis;
pub mod bands;
pub mod decode;
pub mod signal;
pub mod threshold;
pub mod transform;
pub mod window;
