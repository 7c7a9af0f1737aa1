pub mod binary;
pub mod time;
