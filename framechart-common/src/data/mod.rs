pub mod coordinates;
pub mod table;
