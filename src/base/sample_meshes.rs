use gemlab::mesh::{Cell, Mesh, Point};
use gemlab::shapes::GeoKind;

/// Holds sample meshes (to be converted into grids)
pub struct SampleMeshes {}

impl SampleMeshes {
    #[rustfmt::skip]
    pub fn two_qua4() -> Mesh {
        //      y
        //      ^
        // 1.0  3-------4-------5
        //      |       |       |    [#] indicates id
        //      |  [0]  |  [1]  |    (#) indicates attribute
        //      |  (1)  |  (1)  |
        //      |       |       |
        // 0.0  0-------1-------2 -> x
        //     0.0     1.0     2.0
        Mesh {
            ndim: 2,
            points: vec![
                Point { id: 0, marker: 0, coords: vec![0.0, 0.0] },
                Point { id: 1, marker: 0, coords: vec![1.0, 0.0] },
                Point { id: 2, marker: 0, coords: vec![2.0, 0.0] },
                Point { id: 3, marker: 0, coords: vec![0.0, 1.0] },
                Point { id: 4, marker: 0, coords: vec![1.0, 1.0] },
                Point { id: 5, marker: 0, coords: vec![2.0, 1.0] },
            ],
            cells: vec![
                Cell { id: 0, attribute: 1, kind: GeoKind::Qua4, points: vec![0, 1, 4, 3] },
                Cell { id: 1, attribute: 1, kind: GeoKind::Qua4, points: vec![1, 2, 5, 4] },
            ],
        }
    }

    #[rustfmt::skip]
    pub fn one_hex8() -> Mesh {
        //       4--------------7  1.0
        //      /.             /|
        //     / .            / |    [#] indicates id
        //    /  .           /  |    (#) indicates attribute
        //   /   .          /   |
        //  5--------------6    |          z
        //  |    .         |    |          ↑
        //  |    0---------|----3  0.0     o → y
        //  |   /  [0]     |   /          ↙
        //  |  /   (1)     |  /          x
        //  | /            | /
        //  |/             |/
        //  1--------------2   1.0
        // 0.0            1.0
        Mesh {
            ndim: 3,
            points: vec![
                Point { id: 0, marker: 0, coords: vec![0.0, 0.0, 0.0] },
                Point { id: 1, marker: 0, coords: vec![1.0, 0.0, 0.0] },
                Point { id: 2, marker: 0, coords: vec![1.0, 1.0, 0.0] },
                Point { id: 3, marker: 0, coords: vec![0.0, 1.0, 0.0] },
                Point { id: 4, marker: 0, coords: vec![0.0, 0.0, 1.0] },
                Point { id: 5, marker: 0, coords: vec![1.0, 0.0, 1.0] },
                Point { id: 6, marker: 0, coords: vec![1.0, 1.0, 1.0] },
                Point { id: 7, marker: 0, coords: vec![0.0, 1.0, 1.0] },
            ],
            cells: vec![
                Cell { id: 0, attribute: 1, kind: GeoKind::Hex8, points: vec![0,1,2,3, 4,5,6,7] },
            ],
        }
    }

    #[rustfmt::skip]
    pub fn one_tet4() -> Mesh {
        //          z
        //          |
        //          3
        //         /|`.
        //        / |  `.
        //       /  0----`2-- y
        //      / ,'  ,-'
        //     /,' ,-'
        //     1'-'
        //    /
        //   x
        Mesh {
            ndim: 3,
            points: vec![
                Point { id: 0, marker: 0, coords: vec![0.0, 0.0, 0.0] },
                Point { id: 1, marker: 0, coords: vec![1.0, 0.0, 0.0] },
                Point { id: 2, marker: 0, coords: vec![0.0, 1.0, 0.0] },
                Point { id: 3, marker: 0, coords: vec![0.0, 0.0, 1.0] },
            ],
            cells: vec![
                Cell { id: 0, attribute: 1, kind: GeoKind::Tet4, points: vec![0, 1, 2, 3] },
            ],
        }
    }

    /// Returns a structured mesh of nx × ny rectangles covering [0,lx] × [0,ly]
    ///
    /// The points are numbered row by row: `p = i + j·(nx+1)`.
    pub fn cartesian_2d(nx: usize, ny: usize, lx: f64, ly: f64) -> Mesh {
        let points = grid_points_2d(nx, ny, lx, ly, |_, _| (0.0, 0.0));
        let mut cells = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let p = |a: usize, b: usize| a + b * (nx + 1);
                cells.push(Cell {
                    id: cells.len(),
                    attribute: 1,
                    kind: GeoKind::Qua4,
                    points: vec![p(i, j), p(i + 1, j), p(i + 1, j + 1), p(i, j + 1)],
                });
            }
        }
        Mesh { ndim: 2, points, cells }
    }

    /// Returns a structured mesh of quadrilaterals with the interior points perturbed
    ///
    /// Each interior point is moved by at most `amplitude` times the cell size along each
    /// direction. The perturbation is deterministic. Use amplitude ≤ 0.25 to keep the cells convex.
    pub fn perturbed_2d(nx: usize, ny: usize, lx: f64, ly: f64, amplitude: f64) -> Mesh {
        let dx = lx / (nx as f64);
        let dy = ly / (ny as f64);
        let points = grid_points_2d(nx, ny, lx, ly, |i, j| {
            if i == 0 || j == 0 || i == nx || j == ny {
                (0.0, 0.0)
            } else {
                let (a, b) = (i as f64, j as f64);
                (
                    amplitude * dx * f64::sin(1.0 + 3.1 * a + 7.3 * b),
                    amplitude * dy * f64::cos(2.0 + 5.7 * a + 1.9 * b),
                )
            }
        });
        let mut mesh = SampleMeshes::cartesian_2d(nx, ny, lx, ly);
        mesh.points = points;
        mesh
    }

    /// Returns a structured mesh of triangles obtained by splitting each rectangle along its diagonal
    ///
    /// ```text
    /// 2-----3
    /// | [1]/|
    /// |  /  |
    /// |/ [0]|
    /// 0-----1
    /// ```
    pub fn triangles_2d(nx: usize, ny: usize, lx: f64, ly: f64) -> Mesh {
        let points = grid_points_2d(nx, ny, lx, ly, |_, _| (0.0, 0.0));
        let mut cells = Vec::with_capacity(2 * nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let p = |a: usize, b: usize| a + b * (nx + 1);
                let (p0, p1, p2, p3) = (p(i, j), p(i + 1, j), p(i, j + 1), p(i + 1, j + 1));
                for tri in [[p0, p1, p3], [p0, p3, p2]] {
                    cells.push(Cell {
                        id: cells.len(),
                        attribute: 1,
                        kind: GeoKind::Tri3,
                        points: tri.to_vec(),
                    });
                }
            }
        }
        Mesh { ndim: 2, points, cells }
    }

    /// Returns a structured mesh of nx × ny × nz hexahedra covering [0,lx] × [0,ly] × [0,lz]
    pub fn cartesian_3d(nx: usize, ny: usize, nz: usize, lx: f64, ly: f64, lz: f64) -> Mesh {
        let points = grid_points_3d(nx, ny, nz, lx, ly, lz);
        let mut cells = Vec::with_capacity(nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let v = hex_vertices(nx, ny, i, j, k);
                    cells.push(Cell {
                        id: cells.len(),
                        attribute: 1,
                        kind: GeoKind::Hex8,
                        points: v.to_vec(),
                    });
                }
            }
        }
        Mesh { ndim: 3, points, cells }
    }

    /// Returns a structured mesh of tetrahedra obtained by splitting each hexahedron into six
    ///
    /// All tetrahedra of a hexahedron share the diagonal from its first to its seventh vertex;
    /// thus, the splitting is conforming across neighboring hexahedra.
    pub fn tetrahedra_3d(nx: usize, ny: usize, nz: usize, lx: f64, ly: f64, lz: f64) -> Mesh {
        const SPLIT: [[usize; 4]; 6] = [
            [0, 1, 2, 6],
            [0, 1, 5, 6],
            [0, 3, 2, 6],
            [0, 3, 7, 6],
            [0, 4, 5, 6],
            [0, 4, 7, 6],
        ];
        let points = grid_points_3d(nx, ny, nz, lx, ly, lz);
        let mut cells = Vec::with_capacity(6 * nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let v = hex_vertices(nx, ny, i, j, k);
                    for tet in &SPLIT {
                        cells.push(Cell {
                            id: cells.len(),
                            attribute: 1,
                            kind: GeoKind::Tet4,
                            points: tet.iter().map(|m| v[*m]).collect(),
                        });
                    }
                }
            }
        }
        Mesh { ndim: 3, points, cells }
    }
}

/// Generates the points of a structured 2D mesh with an optional shift of each point
fn grid_points_2d<F>(nx: usize, ny: usize, lx: f64, ly: f64, shift: F) -> Vec<Point>
where
    F: Fn(usize, usize) -> (f64, f64),
{
    let dx = lx / (nx as f64);
    let dy = ly / (ny as f64);
    let mut points = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..(ny + 1) {
        for i in 0..(nx + 1) {
            let (sx, sy) = shift(i, j);
            points.push(Point {
                id: points.len(),
                marker: 0,
                coords: vec![(i as f64) * dx + sx, (j as f64) * dy + sy],
            });
        }
    }
    points
}

/// Generates the points of a structured 3D mesh
fn grid_points_3d(nx: usize, ny: usize, nz: usize, lx: f64, ly: f64, lz: f64) -> Vec<Point> {
    let (dx, dy, dz) = (lx / (nx as f64), ly / (ny as f64), lz / (nz as f64));
    let mut points = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
    for k in 0..(nz + 1) {
        for j in 0..(ny + 1) {
            for i in 0..(nx + 1) {
                points.push(Point {
                    id: points.len(),
                    marker: 0,
                    coords: vec![(i as f64) * dx, (j as f64) * dy, (k as f64) * dz],
                });
            }
        }
    }
    points
}

/// Returns the eight vertices of hexahedron (i,j,k) in the Hex8 local numbering
fn hex_vertices(nx: usize, ny: usize, i: usize, j: usize, k: usize) -> [usize; 8] {
    let p = |a: usize, b: usize, c: usize| a + b * (nx + 1) + c * (nx + 1) * (ny + 1);
    [
        p(i, j, k),
        p(i + 1, j, k),
        p(i + 1, j + 1, k),
        p(i, j + 1, k),
        p(i, j, k + 1),
        p(i + 1, j, k + 1),
        p(i + 1, j + 1, k + 1),
        p(i, j + 1, k + 1),
    ]
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
