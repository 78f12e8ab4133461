pub mod act;
pub mod goal;
pub mod state;
