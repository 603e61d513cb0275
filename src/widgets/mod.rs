pub mod controls;
pub mod debug;
pub mod grid;
pub mod legend;
pub mod plot;
