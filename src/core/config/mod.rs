pub mod data;
pub mod io;
pub mod printing;

pub use data::{path_display, Config, GenerationSettings};
pub use io::ConfigError;

#[cfg(test)]
mod tests;
