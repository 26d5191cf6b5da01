//! Constants used throughout the codec

pub mod discriminators;
pub mod pda;
