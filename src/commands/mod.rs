pub mod convert;
pub mod render;
pub mod serve;
