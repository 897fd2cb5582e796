pub mod achievements;
pub mod collision;
pub mod compute;
pub mod config;
pub mod entities;
pub mod random;
