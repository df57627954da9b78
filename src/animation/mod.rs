pub mod ease;
pub mod modulator;
