pub mod tenant;
pub mod trace;
