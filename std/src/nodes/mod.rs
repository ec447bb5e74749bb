pub mod flow;
pub mod logic;
pub mod math;
