pub mod quiz;
pub mod result;
pub mod student;
pub mod task;

pub use quiz::*;
pub use result::*;
pub use student::*;
pub use task::*;
