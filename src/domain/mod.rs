pub mod collision;
pub mod entity;
pub mod grid;
pub mod tile;
