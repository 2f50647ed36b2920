pub mod handlers;
pub mod shaper;
