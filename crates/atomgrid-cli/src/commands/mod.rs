pub mod gradcheck;
pub mod gradient;
pub mod grid;
