pub mod fixture;
pub mod serve;
