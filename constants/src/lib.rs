pub mod placement;
pub mod session;
