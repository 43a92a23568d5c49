// Standard library modules provided by this crate
pub mod string;
