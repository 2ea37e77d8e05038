use crate::StrError;
use gemlab::mesh::Mesh;
use gemlab::shapes::GeoKind;
use std::collections::HashMap;

/// Local faces of a Tet4 cell (the vertices of each face are in cyclic order)
const TET4_FACES: [[usize; 3]; 4] = [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];

/// Local faces of a Hex8 cell (the vertices of each face are in cyclic order)
const HEX8_FACES: [[usize; 4]; 6] = [
    [0, 4, 7, 3],
    [1, 2, 6, 5],
    [0, 1, 5, 4],
    [2, 3, 7, 6],
    [0, 3, 2, 1],
    [4, 5, 6, 7],
];

/// Holds the finite volume grid: connectivity and geometry of cells, faces, and nodes
///
/// A face is a polygon in 3D and a segment in 2D. Each face is shared by one
/// (boundary face) or two (interior face) cells. The face normal is not normalized
/// (its magnitude equals the face area) and points out of the first cell listed
/// in `face_cells`; thus, the normals of boundary faces point out of the domain.
///
/// The grid is built from a [gemlab] mesh with Tri3 or Qua4 cells (2D) or Tet4 or
/// Hex8 cells (3D). The mesh points become the grid nodes.
pub struct Grid {
    /// Space dimension (2 or 3)
    pub ndim: usize,

    /// Number of cells
    pub num_cells: usize,

    /// Number of faces
    pub num_faces: usize,

    /// Number of nodes
    pub num_nodes: usize,

    /// Holds the coordinates of all nodes
    ///
    /// (num_nodes, ndim)
    pub node_coords: Vec<Vec<f64>>,

    /// Holds the nodes of each cell
    pub cell_nodes: Vec<Vec<usize>>,

    /// Holds the faces of each cell and the corresponding orientation sign
    ///
    /// The sign is +1 if the face normal points out of the cell and -1 otherwise.
    pub cell_faces: Vec<Vec<(usize, f64)>>,

    /// Holds the cells adjacent to each face (one or two)
    pub face_cells: Vec<Vec<usize>>,

    /// Holds the nodes of each face (in cyclic order)
    pub face_nodes: Vec<Vec<usize>>,

    /// Holds the face normal vectors (magnitude = face area)
    ///
    /// (num_faces, ndim)
    pub face_normals: Vec<Vec<f64>>,

    /// Holds the face areas (lengths in 2D)
    pub face_areas: Vec<f64>,

    /// Holds the coordinates of the face centers
    ///
    /// (num_faces, ndim)
    pub face_centers: Vec<Vec<f64>>,

    /// Holds the coordinates of the cell centers
    ///
    /// (num_cells, ndim)
    pub cell_centers: Vec<Vec<f64>>,

    /// Holds the cell volumes (areas in 2D)
    pub cell_volumes: Vec<f64>,

    /// Indicates that all cells are simplices (Tri3 or Tet4)
    pub simplex: bool,
}

impl Grid {
    /// Allocates a new instance from a mesh
    pub fn from_mesh(mesh: &Mesh) -> Result<Self, StrError> {
        let ndim = mesh.ndim;
        if ndim != 2 && ndim != 3 {
            return Err("ndim must be 2 or 3");
        }
        if mesh.cells.len() == 0 {
            return Err("the mesh must have at least one cell");
        }
        let num_nodes = mesh.points.len();
        let num_cells = mesh.cells.len();
        let node_coords: Vec<Vec<f64>> = mesh.points.iter().map(|p| p.coords.clone()).collect();
        if node_coords.iter().any(|x| x.len() != ndim) {
            return Err("the number of point coordinates must equal ndim");
        }

        // connectivity
        let mut face_map: HashMap<Vec<usize>, usize> = HashMap::new();
        let mut face_nodes: Vec<Vec<usize>> = Vec::new();
        let mut face_cells: Vec<Vec<usize>> = Vec::new();
        let mut cell_faces: Vec<Vec<(usize, f64)>> = vec![Vec::new(); num_cells];
        let mut cell_nodes = Vec::with_capacity(num_cells);
        let mut simplex = true;
        for (c, cell) in mesh.cells.iter().enumerate() {
            if cell.points.iter().any(|p| *p >= num_nodes) {
                return Err("cell connectivity refers to a non-existent point");
            }
            let local_faces = local_faces(ndim, cell.kind, &cell.points)?;
            if cell.kind != GeoKind::Tri3 && cell.kind != GeoKind::Tet4 {
                simplex = false;
            }
            for verts in local_faces {
                let mut key = verts.clone();
                key.sort();
                let f = *face_map.entry(key).or_insert_with(|| {
                    face_nodes.push(verts);
                    face_cells.push(Vec::new());
                    face_nodes.len() - 1
                });
                if face_cells[f].contains(&c) {
                    return Err("cell has a repeated face");
                }
                if face_cells[f].len() == 2 {
                    return Err("face is shared by more than two cells");
                }
                face_cells[f].push(c);
                cell_faces[c].push((f, 1.0));
            }
            cell_nodes.push(cell.points.clone());
        }
        let num_faces = face_nodes.len();

        // face geometry
        let mut face_normals = Vec::with_capacity(num_faces);
        let mut face_areas = Vec::with_capacity(num_faces);
        let mut face_centers = Vec::with_capacity(num_faces);
        for nodes in &face_nodes {
            let (normal, area, center) = face_geometry(ndim, &node_coords, nodes);
            if area <= 0.0 {
                return Err("face has zero area");
            }
            face_normals.push(normal);
            face_areas.push(area);
            face_centers.push(center);
        }

        // cell geometry
        let mut cell_centers = Vec::with_capacity(num_cells);
        let mut cell_volumes = Vec::with_capacity(num_cells);
        for c in 0..num_cells {
            let (center, volume) = if ndim == 2 {
                polygon_geometry(&node_coords, &cell_nodes[c])
            } else {
                polyhedron_geometry(&node_coords, &cell_nodes[c], &cell_faces[c], &face_normals, &face_centers)
            };
            if volume <= 0.0 {
                return Err("cell has zero volume");
            }
            cell_centers.push(center);
            cell_volumes.push(volume);
        }

        // orientation: normals point out of the first cell
        for f in 0..num_faces {
            let owner = face_cells[f][0];
            let dot: f64 = (0..ndim)
                .map(|i| face_normals[f][i] * (face_centers[f][i] - cell_centers[owner][i]))
                .sum();
            if dot < 0.0 {
                face_normals[f].iter_mut().for_each(|v| *v = -*v);
            }
        }
        for c in 0..num_cells {
            for (f, sign) in cell_faces[c].iter_mut() {
                *sign = if face_cells[*f][0] == c { 1.0 } else { -1.0 };
            }
        }

        Ok(Grid {
            ndim,
            num_cells,
            num_faces,
            num_nodes,
            node_coords,
            cell_nodes,
            cell_faces,
            face_cells,
            face_nodes,
            face_normals,
            face_areas,
            face_centers,
            cell_centers,
            cell_volumes,
            simplex,
        })
    }

    /// Returns whether a face is on the boundary or not
    #[inline]
    pub fn is_boundary_face(&self, face: usize) -> bool {
        self.face_cells[face].len() == 1
    }

    /// Returns all boundary faces (sorted)
    pub fn boundary_faces(&self) -> Vec<usize> {
        (0..self.num_faces).filter(|f| self.is_boundary_face(*f)).collect()
    }

    /// Returns the boundary faces with centers satisfying a condition
    ///
    /// # Examples
    ///
    /// ```
    /// use mpsa::base::{Grid, SampleMeshes};
    /// use mpsa::StrError;
    ///
    /// fn main() -> Result<(), StrError> {
    ///     let mesh = SampleMeshes::two_qua4();
    ///     let grid = Grid::from_mesh(&mesh)?;
    ///     let left = grid.search_boundary_faces(|x| x[0] == 0.0);
    ///     assert_eq!(left.len(), 1);
    ///     Ok(())
    /// }
    /// ```
    pub fn search_boundary_faces<F>(&self, filter: F) -> Vec<usize>
    where
        F: Fn(&[f64]) -> bool,
    {
        (0..self.num_faces)
            .filter(|f| self.is_boundary_face(*f) && filter(&self.face_centers[*f]))
            .collect()
    }

    /// Returns the orientation sign of a face with respect to a cell
    ///
    /// Returns None if the face does not belong to the cell.
    pub fn face_sign(&self, cell: usize, face: usize) -> Option<f64> {
        self.cell_faces[cell]
            .iter()
            .find(|(f, _)| *f == face)
            .map(|(_, sign)| *sign)
    }

    /// Returns the cells incident to each node
    pub fn node_cells(&self) -> Vec<Vec<usize>> {
        let mut res = vec![Vec::new(); self.num_nodes];
        for (c, nodes) in self.cell_nodes.iter().enumerate() {
            for n in nodes {
                res[*n].push(c);
            }
        }
        res
    }

    /// Returns the cells sharing at least one node with a face (sorted)
    pub fn cells_around_face(&self, face: usize, node_cells: &[Vec<usize>]) -> Vec<usize> {
        let mut cells: Vec<usize> = self.face_nodes[face]
            .iter()
            .flat_map(|n| node_cells[*n].iter().copied())
            .collect();
        cells.sort();
        cells.dedup();
        cells
    }
}

/// Returns the (global) nodes of the local faces of a cell
fn local_faces(ndim: usize, kind: GeoKind, points: &[usize]) -> Result<Vec<Vec<usize>>, StrError> {
    match (ndim, kind) {
        (2, GeoKind::Tri3) | (2, GeoKind::Qua4) => {
            let n = points.len();
            Ok((0..n).map(|i| vec![points[i], points[(i + 1) % n]]).collect())
        }
        (3, GeoKind::Tet4) => Ok(TET4_FACES
            .iter()
            .map(|face| face.iter().map(|m| points[*m]).collect())
            .collect()),
        (3, GeoKind::Hex8) => Ok(HEX8_FACES
            .iter()
            .map(|face| face.iter().map(|m| points[*m]).collect())
            .collect()),
        _ => Err("cell kind is not supported; use Tri3 or Qua4 in 2D and Tet4 or Hex8 in 3D"),
    }
}

/// Computes the (non-normalized) normal vector, area, and center of a face
fn face_geometry(ndim: usize, coords: &[Vec<f64>], nodes: &[usize]) -> (Vec<f64>, f64, Vec<f64>) {
    if ndim == 2 {
        let a = &coords[nodes[0]];
        let b = &coords[nodes[1]];
        let normal = vec![b[1] - a[1], a[0] - b[0]];
        let area = f64::sqrt(normal[0] * normal[0] + normal[1] * normal[1]);
        let center = vec![(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0];
        return (normal, area, center);
    }
    // triangle fan around the vertex average
    let nn = nodes.len();
    let mut xm = vec![0.0; 3];
    for n in nodes {
        for i in 0..3 {
            xm[i] += coords[*n][i] / (nn as f64);
        }
    }
    let mut normal = vec![0.0; 3];
    let mut center = vec![0.0; 3];
    let mut sum_area = 0.0;
    for k in 0..nn {
        let p = &coords[nodes[k]];
        let q = &coords[nodes[(k + 1) % nn]];
        let u = [p[0] - xm[0], p[1] - xm[1], p[2] - xm[2]];
        let v = [q[0] - xm[0], q[1] - xm[1], q[2] - xm[2]];
        let w = [
            (u[1] * v[2] - u[2] * v[1]) / 2.0,
            (u[2] * v[0] - u[0] * v[2]) / 2.0,
            (u[0] * v[1] - u[1] * v[0]) / 2.0,
        ];
        let tri_area = f64::sqrt(w[0] * w[0] + w[1] * w[1] + w[2] * w[2]);
        for i in 0..3 {
            normal[i] += w[i];
            center[i] += tri_area * (xm[i] + p[i] + q[i]) / 3.0;
        }
        sum_area += tri_area;
    }
    let area = f64::sqrt(normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]);
    if sum_area > 0.0 {
        center.iter_mut().for_each(|v| *v /= sum_area);
    }
    (normal, area, center)
}

/// Computes the centroid and area of a polygon (shoelace formula)
fn polygon_geometry(coords: &[Vec<f64>], nodes: &[usize]) -> (Vec<f64>, f64) {
    let nn = nodes.len();
    let mut area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for k in 0..nn {
        let p = &coords[nodes[k]];
        let q = &coords[nodes[(k + 1) % nn]];
        let cross = p[0] * q[1] - q[0] * p[1];
        area += cross / 2.0;
        cx += (p[0] + q[0]) * cross;
        cy += (p[1] + q[1]) * cross;
    }
    if area == 0.0 {
        return (vec![0.0, 0.0], 0.0);
    }
    (vec![cx / (6.0 * area), cy / (6.0 * area)], f64::abs(area))
}

/// Computes the centroid and volume of a polyhedron by splitting it into pyramids
///
/// The pyramids have the face polygons as bases and the vertex average as apex.
fn polyhedron_geometry(
    coords: &[Vec<f64>],
    nodes: &[usize],
    faces: &[(usize, f64)],
    face_normals: &[Vec<f64>],
    face_centers: &[Vec<f64>],
) -> (Vec<f64>, f64) {
    let nn = nodes.len();
    let mut xm = vec![0.0; 3];
    for n in nodes {
        for i in 0..3 {
            xm[i] += coords[*n][i] / (nn as f64);
        }
    }
    let mut volume = 0.0;
    let mut center = vec![0.0; 3];
    for (f, _) in faces {
        let xf = &face_centers[*f];
        let nf = &face_normals[*f];
        let height: f64 = (0..3).map(|i| nf[i] * (xf[i] - xm[i])).sum();
        let vol = f64::abs(height) / 3.0;
        for i in 0..3 {
            center[i] += vol * (xm[i] + 0.75 * (xf[i] - xm[i]));
        }
        volume += vol;
    }
    if volume > 0.0 {
        center.iter_mut().for_each(|v| *v /= volume);
    }
    (center, volume)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
