pub mod frame;
pub mod phys;
pub mod process;
pub mod swap;
