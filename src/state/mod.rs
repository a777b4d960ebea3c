pub mod bounds;
pub mod gesture;
pub mod render;

pub use bounds::ObjectBounds;
pub use gesture::{GestureState, VelocitySample};
pub use render::{Phase, RenderState};
