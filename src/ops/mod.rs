pub mod adjustments;
pub mod ai;
pub mod text;
pub mod transform;
