pub mod calibrator;
pub mod sensitivity;
