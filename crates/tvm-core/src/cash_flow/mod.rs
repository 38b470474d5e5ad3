pub mod irr;
pub mod solver;
