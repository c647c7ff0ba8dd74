pub mod enums;
pub mod filters;
pub mod patient;
pub mod report;
pub mod tcm;

pub use filters::*;
pub use patient::*;
pub use report::*;
pub use tcm::*;
