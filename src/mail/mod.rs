pub mod decoders;
pub mod eml;
