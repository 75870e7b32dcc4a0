pub mod config;
pub mod error;
pub mod legend;
pub mod providers;
pub mod radar;
pub mod render;
pub mod timer;
pub mod warnings;
