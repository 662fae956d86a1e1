pub mod compare;
pub mod normalize;
pub mod validate_pages;
