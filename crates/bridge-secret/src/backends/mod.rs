pub mod hashicorp;
pub mod memory;
