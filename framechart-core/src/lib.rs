pub mod adapter;
pub mod interpreter;
pub mod value;
pub mod view;

pub use framechart_common::arrow;
pub use framechart_common::error;
