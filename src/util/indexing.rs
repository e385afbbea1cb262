use crate::util::*;

/// Number of cells in a grid with the given exclusive bounds.
pub fn cell_buffer_size(exclusive_bounds: &Coord) -> usize {
    let mut accumulator = 1;
    for d in exclusive_bounds {
        accumulator *= *d as usize;
    }
    accumulator
}

/// Map a logical coordinate to its linear index.
/// The first dimension runs fastest, matching nalgebra's column-major
/// storage of an `nx x ny` matrix.
pub fn coord_to_linear(coord: &Coord, exclusive_bounds: &Coord) -> usize {
    debug_assert!(coord[0] >= 0 && coord[1] >= 0);
    debug_assert!(coord[0] < exclusive_bounds[0]);
    debug_assert!(coord[1] < exclusive_bounds[1]);
    coord[1] as usize * exclusive_bounds[0] as usize + coord[0] as usize
}

pub fn linear_to_coord(linear_index: usize, exclusive_bounds: &Coord) -> Coord {
    let nx = exclusive_bounds[0] as usize;
    vector![(linear_index % nx) as i32, (linear_index / nx) as i32]
}
