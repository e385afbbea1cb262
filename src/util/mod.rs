pub use num_traits::Zero;

pub mod indexing;
pub use indexing::*;

pub use nalgebra::{matrix, vector};

/// Logical cell index `(i, j)`. Signed so neighbors past the domain
/// edge can be represented.
pub type Coord = nalgebra::Vector2<i32>;

/// Position in the continuous (pitch-angle, momentum) plane.
pub type Point = nalgebra::Vector2<f64>;

/// 2x2 diffusion tensor in (pitch-angle, momentum) components.
pub type Tensor = nalgebra::Matrix2<f64>;
