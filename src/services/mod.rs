pub mod distribution;
pub mod health;
