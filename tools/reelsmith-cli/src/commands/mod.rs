pub mod check;
pub mod info;
pub mod render;
pub mod validate;
