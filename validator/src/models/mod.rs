pub mod simulator;
pub mod state;
