pub mod builder;
pub mod level;

pub use builder::{build_tree, find_node, flatten};
pub use level::HeadingLevel;
