pub mod hist;
pub mod pretty;
