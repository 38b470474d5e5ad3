pub mod bonds;
pub mod duration;
