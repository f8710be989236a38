pub mod delete;
pub mod extract;
pub mod html;
