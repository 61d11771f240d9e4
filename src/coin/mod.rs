pub mod bitcoin;
pub mod coin_trait;
pub mod market;
