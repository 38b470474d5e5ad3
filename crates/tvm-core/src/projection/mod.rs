pub mod compound;
pub mod retirement;
