//! Structured (pitch-angle, momentum) mesh.
//!
//! Cells are indexed `(i, j)` with `i` along pitch angle and `j` along
//! momentum. Each cell knows its four directional neighbors and the
//! geometric edge it shares with each of them. Edges are oriented so
//! the same physical edge seen from the opposite cell has its endpoints
//! swapped, which the flux computation relies on.

use crate::error::MeshError;
use crate::util::*;

/// The four neighbor directions, in the order connectivity is built.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Direction {
    /// `(i - 1, j)`
    IMinus = 0,
    /// `(i, j + 1)`
    JPlus = 1,
    /// `(i + 1, j)`
    IPlus = 2,
    /// `(i, j - 1)`
    JMinus = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::IMinus,
        Direction::JPlus,
        Direction::IPlus,
        Direction::JMinus,
    ];

    /// If cell K sees L in direction `d`, L sees K in `d.reverse()`.
    pub fn reverse(self) -> Direction {
        match self {
            Direction::IMinus => Direction::IPlus,
            Direction::JPlus => Direction::JMinus,
            Direction::IPlus => Direction::IMinus,
            Direction::JMinus => Direction::JPlus,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn offset(self) -> Coord {
        match self {
            Direction::IMinus => vector![-1, 0],
            Direction::JPlus => vector![0, 1],
            Direction::IPlus => vector![1, 0],
            Direction::JMinus => vector![0, -1],
        }
    }
}

/// Edge between two cells, as two endpoints in the continuous plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Edge {
    pub a: Point,
    pub b: Point,
}

impl Edge {
    pub fn length(&self) -> f64 {
        (self.b - self.a).norm()
    }

    /// Same edge seen from the other side.
    pub fn swapped(&self) -> Edge {
        Edge {
            a: self.b,
            b: self.a,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Neighbor {
    /// Logical index of the neighbor, may lie outside the grid.
    pub coord: Coord,
    pub edge: Edge,
}

/// Grid extents and geometry, derived externally from domain bounds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MeshSpec {
    pub nx: usize,
    pub ny: usize,
    pub x_origin: f64,
    pub y_origin: f64,
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    nx: usize,
    ny: usize,
    dx: f64,
    dy: f64,

    // corresponds to i - 1/2, j - 1/2 of cell (0, 0)
    x_origin: f64,
    y_origin: f64,

    x: Vec<f64>,
    y: Vec<f64>,

    // indexed by 4 * ind2to1(i, j) + direction
    neighbors: Vec<Neighbor>,
}

impl Mesh {
    pub fn new(spec: MeshSpec) -> Result<Self, MeshError> {
        let MeshSpec {
            nx,
            ny,
            x_origin,
            y_origin,
            dx,
            dy,
        } = spec;
        if nx == 0 || ny == 0 {
            return Err(MeshError::EmptyGrid { nx, ny });
        }
        if !(dx.is_finite() && dy.is_finite() && dx > 0.0 && dy > 0.0) {
            return Err(MeshError::BadCellSize { dx, dy });
        }

        let x = (0..nx)
            .map(|i| x_origin + dx / 2.0 + i as f64 * dx)
            .collect();
        let y = (0..ny)
            .map(|j| y_origin + dy / 2.0 + j as f64 * dy)
            .collect();

        let mut mesh = Mesh {
            nx,
            ny,
            dx,
            dy,
            x_origin,
            y_origin,
            x,
            y,
            neighbors: Vec::with_capacity(4 * nx * ny),
        };
        mesh.build_connectivity();
        log::debug!(
            "mesh {} x {}, dx = {:e}, dy = {:e}, origin = ({}, {})",
            nx,
            ny,
            dx,
            dy,
            x_origin,
            y_origin
        );
        Ok(mesh)
    }

    /// Walk the four directions starting at the cell's lower-left corner.
    /// Each edge starts where the previous one ended, so the boundary of
    /// every cell is traversed clockwise and shared edges come out reversed.
    fn build_connectivity(&mut self) {
        self.neighbors.clear();
        for j in 0..self.ny {
            for i in 0..self.nx {
                let coord = vector![i as i32, j as i32];
                let mut b = self.vertex(i, j);
                let mut a = b + vector![0.0, self.dy];
                for d in Direction::ALL {
                    if d != Direction::IMinus {
                        b = a;
                        a = b + match d {
                            Direction::JPlus => vector![self.dx, 0.0],
                            Direction::IPlus => vector![0.0, -self.dy],
                            _ => vector![-self.dx, 0.0],
                        };
                    }
                    self.neighbors.push(Neighbor {
                        coord: coord + d.offset(),
                        edge: Edge { a, b },
                    });
                }
            }
        }
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn dy(&self) -> f64 {
        self.dy
    }

    pub fn n_cells(&self) -> usize {
        cell_buffer_size(&self.exclusive_bounds())
    }

    pub fn exclusive_bounds(&self) -> Coord {
        vector![self.nx as i32, self.ny as i32]
    }

    /// Pitch angle of cell centers in column `i`.
    pub fn x(&self, i: usize) -> f64 {
        self.x[i]
    }

    /// Momentum of cell centers in row `j`.
    pub fn y(&self, j: usize) -> f64 {
        self.y[j]
    }

    pub fn xs(&self) -> &[f64] {
        &self.x
    }

    pub fn ys(&self) -> &[f64] {
        &self.y
    }

    pub fn center(&self, i: usize, j: usize) -> Point {
        vector![self.x[i], self.y[j]]
    }

    pub fn vertex_x(&self, i: usize) -> f64 {
        self.x_origin + i as f64 * self.dx
    }

    pub fn vertex_y(&self, j: usize) -> f64 {
        self.y_origin + j as f64 * self.dy
    }

    /// Position of vertex `(i, j)`, `0 <= i <= nx`, `0 <= j <= ny`.
    pub fn vertex(&self, i: usize, j: usize) -> Point {
        vector![self.vertex_x(i), self.vertex_y(j)]
    }

    pub fn area(&self) -> f64 {
        self.dx * self.dy
    }

    pub fn contains(&self, coord: &Coord) -> bool {
        coord[0] >= 0
            && coord[1] >= 0
            && (coord[0] as usize) < self.nx
            && (coord[1] as usize) < self.ny
    }

    /// Linear degree of freedom index, column-major.
    pub fn ind2to1(&self, i: usize, j: usize) -> usize {
        coord_to_linear(&vector![i as i32, j as i32], &self.exclusive_bounds())
    }

    pub fn ind1to2(&self, index: usize) -> (usize, usize) {
        let c = linear_to_coord(index, &self.exclusive_bounds());
        (c[0] as usize, c[1] as usize)
    }

    pub fn neighbor(&self, i: usize, j: usize, d: Direction) -> &Neighbor {
        &self.neighbors[4 * self.ind2to1(i, j) + d.index()]
    }

    pub fn edge(&self, i: usize, j: usize, d: Direction) -> &Edge {
        &self.neighbor(i, j, d).edge
    }

    /// Vertex index holding a point, found by rounding relative
    /// to the origin. Only meaningful for points on grid vertices.
    pub fn vertex_index(&self, point: &Point) -> (usize, usize) {
        let i = ((point[0] - self.x_origin) / self.dx).round();
        let j = ((point[1] - self.y_origin) / self.dy).round();
        debug_assert!(i >= 0.0 && i <= self.nx as f64, "{:?}", point);
        debug_assert!(j >= 0.0 && j <= self.ny as f64, "{:?}", point);
        (i as usize, j as usize)
    }
}
