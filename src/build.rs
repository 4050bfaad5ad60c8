pub mod aggregate;
pub mod article;
pub mod attrs;
mod builder;
mod directive;
mod escape;
mod inline;
mod links;
mod render;
pub mod section;

pub use builder::{Builder, TOC_FILE_NAME, is_generated_file};
