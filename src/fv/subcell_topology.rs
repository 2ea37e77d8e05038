use crate::base::Grid;
use crate::StrError;
use std::collections::HashMap;

/// Holds a connected group of sub-cells around a node
///
/// The local system of a cluster is solved independently of the other clusters.
#[derive(Clone, Debug)]
pub struct Cluster {
    /// The node shared by all sub-cells of the cluster
    pub node: usize,

    /// Sub-cells of the cluster (sorted)
    pub subcells: Vec<usize>,

    /// Sub-faces of the cluster (sorted)
    pub subfaces: Vec<usize>,
}

/// Holds the sub-cell and sub-face topology of a grid
///
/// A sub-cell is the part of a cell attached to one of its nodes and a sub-face is the part
/// of a face attached to one of its nodes. Thus, sub-cells are identified by (cell, node)
/// pairs and sub-faces by (face, node) pairs.
///
/// ```text
///   n───────f───────n
///   │   s   ┆   s   │     s: sub-cell
///   │       q       │     q: sub-face
///   f┄┄┄┄┄┄┄n┄┄┄┄┄┄┄f     n: node
///   │       ┆       │     f: face
///   │   s   ┆   s   │
///   n───────f───────n
/// ```
pub struct SubcellTopology {
    /// Space dimension
    pub ndim: usize,

    /// Holds the cell of each sub-cell
    pub subcell_cell: Vec<usize>,

    /// Holds the node of each sub-cell
    pub subcell_node: Vec<usize>,

    /// Holds the face of each sub-face
    pub subface_face: Vec<usize>,

    /// Holds the node of each sub-face
    pub subface_node: Vec<usize>,

    /// Holds the sub-cells of each sub-face (in the same order as the cells of the face)
    pub subface_subcells: Vec<Vec<usize>>,

    /// Holds the sub-faces of each sub-cell
    pub subcell_subfaces: Vec<Vec<usize>>,

    /// Holds the sub-cells of each cell
    pub cell_subcells: Vec<Vec<usize>>,

    /// Holds the sub-faces of each face
    pub face_subfaces: Vec<Vec<usize>>,

    /// Holds all clusters, ordered by node
    pub clusters: Vec<Cluster>,

    /// Holds the clusters of each node
    pub node_clusters: Vec<Vec<usize>>,
}

impl SubcellTopology {
    /// Allocates a new instance
    pub fn new(grid: &Grid) -> Result<Self, StrError> {
        let ndim = grid.ndim;
        let mut subcell_map: HashMap<(usize, usize), usize> = HashMap::new();
        let mut subcell_cell = Vec::new();
        let mut subcell_node = Vec::new();
        let mut subface_face = Vec::new();
        let mut subface_node = Vec::new();
        let mut subface_subcells = Vec::new();
        let mut face_subfaces = vec![Vec::new(); grid.num_faces];

        // register sub-faces and their sub-cells, face by face
        for f in 0..grid.num_faces {
            let ncell = grid.face_cells[f].len();
            if ncell < 1 || ncell > 2 {
                return Err("face must be adjacent to one or two cells");
            }
            for n in &grid.face_nodes[f] {
                let mut subcells = Vec::with_capacity(ncell);
                for c in &grid.face_cells[f] {
                    let s = *subcell_map.entry((*c, *n)).or_insert_with(|| {
                        subcell_cell.push(*c);
                        subcell_node.push(*n);
                        subcell_cell.len() - 1
                    });
                    subcells.push(s);
                }
                face_subfaces[f].push(subface_face.len());
                subface_face.push(f);
                subface_node.push(*n);
                subface_subcells.push(subcells);
            }
        }

        // sub-cell to sub-faces
        let nsubcell = subcell_cell.len();
        let mut subcell_subfaces = vec![Vec::new(); nsubcell];
        for (q, subcells) in subface_subcells.iter().enumerate() {
            for s in subcells {
                subcell_subfaces[*s].push(q);
            }
        }
        if subcell_subfaces.iter().any(|list| list.len() != ndim) {
            return Err("sub-cell must have exactly ndim sub-faces");
        }
        let mut cell_subcells = vec![Vec::new(); grid.num_cells];
        for s in 0..nsubcell {
            cell_subcells[subcell_cell[s]].push(s);
        }

        // connected components of the sub-cells around each node
        let mut parent: Vec<usize> = (0..nsubcell).collect();
        for subcells in &subface_subcells {
            if subcells.len() == 2 {
                let a = find_root(&mut parent, subcells[0]);
                let b = find_root(&mut parent, subcells[1]);
                if a != b {
                    parent[usize::max(a, b)] = usize::min(a, b);
                }
            }
        }
        let mut node_subcells = vec![Vec::new(); grid.num_nodes];
        for s in 0..nsubcell {
            node_subcells[subcell_node[s]].push(s);
        }
        let mut clusters = Vec::new();
        let mut node_clusters = vec![Vec::new(); grid.num_nodes];
        let mut subcell_cluster = vec![0; nsubcell];
        for node in 0..grid.num_nodes {
            let mut root_to_cluster: HashMap<usize, usize> = HashMap::new();
            for s in &node_subcells[node] {
                let root = find_root(&mut parent, *s);
                let k = *root_to_cluster.entry(root).or_insert_with(|| {
                    clusters.push(Cluster {
                        node,
                        subcells: Vec::new(),
                        subfaces: Vec::new(),
                    });
                    node_clusters[node].push(clusters.len() - 1);
                    clusters.len() - 1
                });
                clusters[k].subcells.push(*s);
                subcell_cluster[*s] = k;
            }
        }
        for (q, subcells) in subface_subcells.iter().enumerate() {
            clusters[subcell_cluster[subcells[0]]].subfaces.push(q);
        }

        Ok(SubcellTopology {
            ndim,
            subcell_cell,
            subcell_node,
            subface_face,
            subface_node,
            subface_subcells,
            subcell_subfaces,
            cell_subcells,
            face_subfaces,
            clusters,
            node_clusters,
        })
    }

    /// Returns the number of sub-cells
    #[inline]
    pub fn num_subcells(&self) -> usize {
        self.subcell_cell.len()
    }

    /// Returns the number of sub-faces
    #[inline]
    pub fn num_subfaces(&self) -> usize {
        self.subface_face.len()
    }
}

/// Finds the root of a disjoint-set element (with path halving)
fn find_root(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::SubcellTopology;
    use crate::base::{Grid, SampleMeshes};

    #[test]
    fn new_captures_errors() {
        let mesh = SampleMeshes::two_qua4();
        let mut grid = Grid::from_mesh(&mesh).unwrap();
        grid.face_cells[0].clear(); // never do this!
        assert_eq!(
            SubcellTopology::new(&grid).err(),
            Some("face must be adjacent to one or two cells")
        );

        let mut grid = Grid::from_mesh(&mesh).unwrap();
        grid.face_nodes[0].push(5); // never do this!
        assert_eq!(
            SubcellTopology::new(&grid).err(),
            Some("sub-cell must have exactly ndim sub-faces")
        );
    }

    #[test]
    fn new_works_2d() {
        //  3-------4-------5
        //  |       |       |
        //  |  [0]  |  [1]  |
        //  |       |       |
        //  0-------1-------2
        let mesh = SampleMeshes::two_qua4();
        let grid = Grid::from_mesh(&mesh).unwrap();
        let topo = SubcellTopology::new(&grid).unwrap();
        assert_eq!(topo.num_subcells(), 8);
        assert_eq!(topo.num_subfaces(), 14);
        for s in 0..8 {
            assert_eq!(topo.subcell_subfaces[s].len(), 2);
        }
        for c in 0..2 {
            assert_eq!(topo.cell_subcells[c].len(), 4);
        }

        // the interior face has two sub-faces, each with two sub-cells
        assert_eq!(topo.face_subfaces[1].len(), 2);
        for q in &topo.face_subfaces[1] {
            let subcells = &topo.subface_subcells[*q];
            assert_eq!(subcells.len(), 2);
            assert_eq!(topo.subcell_cell[subcells[0]], 0);
            assert_eq!(topo.subcell_cell[subcells[1]], 1);
        }

        // one cluster per node
        assert_eq!(topo.clusters.len(), 6);
        let nodes: Vec<_> = topo.clusters.iter().map(|c| c.node).collect();
        assert_eq!(nodes, &[0, 1, 2, 3, 4, 5]);
        let sizes: Vec<_> = topo.clusters.iter().map(|c| c.subcells.len()).collect();
        assert_eq!(sizes, &[1, 2, 1, 1, 2, 1]);
        let nsubface: Vec<_> = topo.clusters.iter().map(|c| c.subfaces.len()).collect();
        assert_eq!(nsubface, &[2, 3, 2, 2, 3, 2]);
        assert_eq!(topo.node_clusters[4], &[4]);
    }

    #[test]
    fn new_works_3d() {
        let mesh = SampleMeshes::cartesian_3d(2, 2, 2, 1.0, 1.0, 1.0);
        let grid = Grid::from_mesh(&mesh).unwrap();
        let topo = SubcellTopology::new(&grid).unwrap();
        assert_eq!(topo.num_subcells(), 64);
        assert_eq!(topo.num_subfaces(), 36 * 4);
        assert_eq!(topo.clusters.len(), 27);
        // the central node is shared by all cells
        let center = topo.clusters.iter().find(|c| c.node == 13).unwrap();
        assert_eq!(center.subcells.len(), 8);
        assert_eq!(center.subfaces.len(), 12);

        let mesh = SampleMeshes::tetrahedra_3d(1, 1, 1, 1.0, 1.0, 1.0);
        let grid = Grid::from_mesh(&mesh).unwrap();
        let topo = SubcellTopology::new(&grid).unwrap();
        assert_eq!(topo.num_subcells(), 24);
        assert_eq!(topo.clusters.len(), 8);
        let corner = topo.clusters.iter().find(|c| c.node == 0).unwrap();
        assert_eq!(corner.subcells.len(), 6);
    }
}
