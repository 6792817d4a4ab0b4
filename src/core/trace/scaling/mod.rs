pub mod helpers;
pub mod interface;
pub mod no_delay;
