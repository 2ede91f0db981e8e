pub mod recommendation;
pub mod resume;
