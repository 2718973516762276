//! Bit-vector solving engines: eager bit-blasting and propagation-based
//! local search.

pub mod bitblast;
pub mod prop;
pub mod solver;

pub use bitblast::AigBitblaster;
pub use prop::PropSolver;
pub use solver::BitblastSolver;
