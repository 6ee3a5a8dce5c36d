pub mod losses;
pub mod ranking;
