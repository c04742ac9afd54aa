//! Frame and call tree node model shared by every pipeline stage.

pub mod frame;
pub mod node;

pub use frame::{image_base_name, Frame};
pub use node::{CallTrees, Node};
