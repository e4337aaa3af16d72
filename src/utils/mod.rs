pub mod files;
pub mod keyboards;
pub mod validation;
