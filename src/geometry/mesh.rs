use super::{BoundingBox, Point};
use crate::{Error, Result};
use std::collections::HashMap;

/// Integer tag selecting the material of an element.
pub type Attribute = u32;

/// One tensor-product element.
#[derive(Debug, Clone, PartialEq)]
struct Element {
    /// Corner vertex ids in lexicographic order (`2^dim` entries)
    vertices: Vec<usize>,
    /// Material tag
    attribute: Attribute,
}

/// Conforming mesh of axis-aligned tensor-product elements.
#[derive(Debug, Clone)]
pub struct Mesh {
    dim: usize,
    vertices: Vec<Point>,
    elements: Vec<Element>,
}

impl Mesh {
    /// Uniform Cartesian mesh of the box `[0, sizes[k]]` split into `counts[k]` cells per axis.
    ///
    /// Elements are numbered lexicographically (x fastest) and carry attribute 1.
    pub fn cartesian(counts: &[usize], sizes: &[f64]) -> Result<Self> {
        let dim = counts.len();
        if !(1..=3).contains(&dim) || sizes.len() != dim {
            return Err(Error::Mesh(format!(
                "cartesian mesh needs 1 to 3 axes with one size each (got {} counts, {} sizes)",
                counts.len(),
                sizes.len()
            )));
        }
        if counts.iter().any(|&n| n == 0) {
            return Err(Error::Mesh("cell counts must be positive".into()));
        }
        if sizes.iter().any(|&s| !(s.is_finite() && s > 0.0)) {
            return Err(Error::Mesh("domain sizes must be positive and finite".into()));
        }

        let mut n = [1usize; 3];
        let mut h = [0.0; 3];
        for k in 0..dim {
            n[k] = counts[k];
            h[k] = sizes[k] / counts[k] as f64;
        }
        let stride = [1, n[0] + 1, (n[0] + 1) * (n[1] + 1)];
        let lattice = [n[0] + 1, if dim > 1 { n[1] + 1 } else { 1 }, if dim > 2 { n[2] + 1 } else { 1 }];

        let mut vertices = Vec::with_capacity(lattice.iter().product());
        for k in 0..lattice[2] {
            for j in 0..lattice[1] {
                for i in 0..lattice[0] {
                    vertices.push([i as f64 * h[0], j as f64 * h[1], k as f64 * h[2]]);
                }
            }
        }

        let cells = [n[0], if dim > 1 { n[1] } else { 1 }, if dim > 2 { n[2] } else { 1 }];
        let corners = 1usize << dim;
        let mut elements = Vec::with_capacity(cells.iter().product());
        for k in 0..cells[2] {
            for j in 0..cells[1] {
                for i in 0..cells[0] {
                    let base = [i, j, k];
                    let vertices = (0..corners)
                        .map(|c| {
                            (0..dim)
                                .map(|a| (base[a] + ((c >> a) & 1)) * stride[a])
                                .sum::<usize>()
                        })
                        .collect();
                    elements.push(Element {
                        vertices,
                        attribute: 1,
                    });
                }
            }
        }

        Ok(Self {
            dim,
            vertices,
            elements,
        })
    }

    /// Uniform 1-D mesh of `[0, length]` with `n` segments.
    pub fn cartesian_1d(n: usize, length: f64) -> Result<Self> {
        Self::cartesian(&[n], &[length])
    }

    /// Uniform 2-D mesh of `[0, sx] x [0, sy]`.
    pub fn cartesian_2d(nx: usize, ny: usize, sx: f64, sy: f64) -> Result<Self> {
        Self::cartesian(&[nx, ny], &[sx, sy])
    }

    /// Uniform 3-D mesh of `[0, sx] x [0, sy] x [0, sz]`.
    pub fn cartesian_3d(nx: usize, ny: usize, nz: usize, sx: f64, sy: f64, sz: f64) -> Result<Self> {
        Self::cartesian(&[nx, ny, nz], &[sx, sy, sz])
    }

    /// Build a mesh from raw vertices and `(corner ids, attribute)` pairs.
    ///
    /// Every element must be a non-degenerate axis-aligned box whose corners
    /// are listed in lexicographic order.
    pub fn from_parts(
        dim: usize,
        vertices: Vec<Point>,
        elements: Vec<(Vec<usize>, Attribute)>,
    ) -> Result<Self> {
        if !(1..=3).contains(&dim) {
            return Err(Error::Mesh(format!("unsupported dimension {dim}")));
        }
        let corners = 1usize << dim;
        let elements = elements
            .into_iter()
            .enumerate()
            .map(|(e, (ids, attribute))| {
                if ids.len() != corners {
                    return Err(Error::Mesh(format!(
                        "element {e} has {} vertices, expected {corners}",
                        ids.len()
                    )));
                }
                if let Some(&bad) = ids.iter().find(|&&v| v >= vertices.len()) {
                    return Err(Error::Mesh(format!("element {e} references missing vertex {bad}")));
                }
                Ok(Element {
                    vertices: ids,
                    attribute,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mesh = Self {
            dim,
            vertices,
            elements,
        };
        for e in 0..mesh.elements.len() {
            mesh.check_box(e)?;
        }
        Ok(mesh)
    }

    /// Verify element `e` is an axis-aligned box in lexicographic corner order.
    fn check_box(&self, e: usize) -> Result<()> {
        let (min, max) = self.element_bounds(e);
        for k in 0..self.dim {
            if !(max[k] - min[k] > 0.0) {
                return Err(Error::Mesh(format!("element {e} is degenerate along axis {k}")));
            }
        }
        for (c, &v) in self.elements[e].vertices.iter().enumerate() {
            let p = self.vertices[v];
            for k in 0..self.dim {
                let expected = if (c >> k) & 1 == 1 { max[k] } else { min[k] };
                let tol = 1e-12 * (max[k] - min[k]).abs().max(expected.abs()).max(1.0);
                if (p[k] - expected).abs() > tol {
                    return Err(Error::Mesh(format!(
                        "element {e} is not an axis-aligned box with lexicographic corners"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Spatial dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of elements.
    #[inline]
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Vertex coordinates.
    #[inline]
    pub fn vertex(&self, v: usize) -> Point {
        self.vertices[v]
    }

    /// Corner vertex ids of an element.
    #[inline]
    pub fn element_vertices(&self, e: usize) -> &[usize] {
        &self.elements[e].vertices
    }

    /// Attribute of an element.
    #[inline]
    pub fn attribute(&self, e: usize) -> Attribute {
        self.elements[e].attribute
    }

    /// Set the attribute of an element.
    pub fn set_attribute(&mut self, e: usize, attribute: Attribute) -> Result<()> {
        let num_elements = self.elements.len();
        let element = self.elements.get_mut(e).ok_or_else(|| {
            Error::Mesh(format!("element {e} out of range ({num_elements} elements)"))
        })?;
        element.attribute = attribute;
        Ok(())
    }

    /// Iterate over the attributes of all elements.
    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.elements.iter().map(|el| el.attribute)
    }

    /// Minimum and maximum corner of an element.
    #[inline]
    pub fn element_bounds(&self, e: usize) -> (Point, Point) {
        let ids = &self.elements[e].vertices;
        (self.vertices[ids[0]], self.vertices[ids[ids.len() - 1]])
    }

    /// Bounding box of all vertices.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for k in 0..self.dim {
            min[k] = f64::INFINITY;
            max[k] = f64::NEG_INFINITY;
        }
        for p in &self.vertices {
            for k in 0..self.dim {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
        BoundingBox {
            dim: self.dim,
            min,
            max,
        }
    }

    /// Find the element containing `point` and the point's reference coordinates in `[-1, 1]`.
    ///
    /// Points on a shared face resolve to the lowest-numbered element.
    /// Non-finite coordinates are never located.
    pub fn locate(&self, point: &[f64]) -> Option<(usize, Point)> {
        if point.len() < self.dim || !point[..self.dim].iter().all(|x| x.is_finite()) {
            return None;
        }
        (0..self.elements.len()).find_map(|e| {
            let (min, max) = self.element_bounds(e);
            let mut reference = [0.0; 3];
            for k in 0..self.dim {
                let h = max[k] - min[k];
                let tol = 1e-10 * h.max(1.0);
                if point[k] < min[k] - tol || point[k] > max[k] + tol {
                    return None;
                }
                reference[k] = (2.0 * (point[k] - min[k]) / h - 1.0).clamp(-1.0, 1.0);
            }
            Some((e, reference))
        })
    }

    /// Split every element into `2^dim` children.
    ///
    /// Child 0 keeps the parent's index; the remaining children are appended
    /// after all existing elements in parent order. All children inherit the
    /// parent attribute. Refining a two-element 1-D mesh therefore keeps the
    /// left-half descendants on even indices and the right-half ones on odd
    /// indices.
    pub fn uniform_refinement(&mut self) {
        let dim = self.dim;
        let corners = 1usize << dim;
        let lattice_len = 3usize.pow(dim as u32);
        let num_parents = self.elements.len();

        let mut shared: HashMap<Vec<usize>, usize> = HashMap::new();
        let mut appended = Vec::with_capacity(num_parents * (corners - 1));

        for e in 0..num_parents {
            let parent = self.elements[e].vertices.clone();

            // Refined 3^dim lattice: digit a_k in {0, 1, 2} per axis, 1 meaning midpoint.
            let lattice: Vec<usize> = (0..lattice_len)
                .map(|a| {
                    let mut key: Vec<usize> = (0..corners)
                        .filter(|&c| {
                            (0..dim).all(|k| match (a / 3usize.pow(k as u32)) % 3 {
                                0 => (c >> k) & 1 == 0,
                                2 => (c >> k) & 1 == 1,
                                _ => true,
                            })
                        })
                        .map(|c| parent[c])
                        .collect();
                    if key.len() == 1 {
                        return key[0];
                    }
                    key.sort_unstable();
                    let vertices = &mut self.vertices;
                    *shared.entry(key).or_insert_with_key(|key| {
                        let mut p = [0.0; 3];
                        for &v in key {
                            for k in 0..3 {
                                p[k] += vertices[v][k];
                            }
                        }
                        let n = key.len() as f64;
                        p.iter_mut().for_each(|x| *x /= n);
                        vertices.push(p);
                        vertices.len() - 1
                    })
                })
                .collect();

            let attribute = self.elements[e].attribute;
            for child in 0..corners {
                let vertices: Vec<usize> = (0..corners)
                    .map(|c| {
                        let index: usize = (0..dim)
                            .map(|k| (((child >> k) & 1) + ((c >> k) & 1)) * 3usize.pow(k as u32))
                            .sum();
                        lattice[index]
                    })
                    .collect();
                if child == 0 {
                    self.elements[e].vertices = vertices;
                } else {
                    appended.push(Element {
                        vertices,
                        attribute,
                    });
                }
            }
        }

        self.elements.extend(appended);
    }

    /// Apply [`Mesh::uniform_refinement`] `times` times.
    pub fn refine(&mut self, times: usize) {
        for _ in 0..times {
            self.uniform_refinement();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cartesian_1d() {
        let mesh = Mesh::cartesian_1d(4, 2.0).unwrap();
        assert_eq!(mesh.dim(), 1);
        assert_eq!(mesh.num_elements(), 4);
        assert_eq!(mesh.num_vertices(), 5);
        let (min, max) = mesh.element_bounds(2);
        assert_eq!(min[0], 1.0);
        assert_eq!(max[0], 1.5);
        assert!(mesh.attributes().all(|a| a == 1));
    }

    #[test]
    fn test_cartesian_3d_corner_order() {
        let mesh = Mesh::cartesian_3d(2, 3, 4, 1.0, 1.0, 1.0).unwrap();
        assert_eq!(mesh.num_elements(), 24);
        assert_eq!(mesh.num_vertices(), 3 * 4 * 5);
        for e in 0..mesh.num_elements() {
            mesh.check_box(e).unwrap();
        }
        let bbox = mesh.bounding_box();
        assert_eq!(bbox.min, [0.0, 0.0, 0.0]);
        assert_eq!(bbox.max, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_invalid_cartesian() {
        assert!(matches!(Mesh::cartesian_1d(0, 1.0), Err(Error::Mesh(_))));
        assert!(matches!(Mesh::cartesian_1d(3, -1.0), Err(Error::Mesh(_))));
        assert!(matches!(Mesh::cartesian(&[1, 1, 1, 1], &[1.0; 4]), Err(Error::Mesh(_))));
    }

    #[test]
    fn test_from_parts_rejects_twisted_element() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
        let ok = Mesh::from_parts(2, vertices.clone(), vec![(vec![0, 1, 2, 3], 1)]);
        assert!(ok.is_ok());

        let twisted = Mesh::from_parts(2, vertices.clone(), vec![(vec![0, 1, 3, 2], 1)]);
        assert!(matches!(twisted, Err(Error::Mesh(_))));

        let missing = Mesh::from_parts(2, vertices, vec![(vec![0, 1, 2, 9], 1)]);
        assert!(matches!(missing, Err(Error::Mesh(_))));
    }

    #[test]
    fn test_refinement_1d_geometry() {
        let mut mesh = Mesh::cartesian_1d(2, 1.0).unwrap();
        mesh.set_attribute(1, 2).unwrap();
        mesh.uniform_refinement();

        assert_eq!(mesh.num_elements(), 4);
        assert_eq!(mesh.num_vertices(), 5);
        let bounds: Vec<(f64, f64)> = (0..4)
            .map(|e| {
                let (min, max) = mesh.element_bounds(e);
                (min[0], max[0])
            })
            .collect();
        assert_eq!(bounds, vec![(0.0, 0.25), (0.5, 0.75), (0.25, 0.5), (0.75, 1.0)]);
        assert_eq!(mesh.attributes().collect::<Vec<_>>(), vec![1, 2, 1, 2]);
    }

    #[test]
    fn test_refinement_shares_midpoints() {
        let mut mesh = Mesh::cartesian_2d(2, 2, 1.0, 1.0).unwrap();
        mesh.uniform_refinement();
        assert_eq!(mesh.num_elements(), 16);
        // A 4x4 grid has 25 vertices; duplicated midpoints would inflate this.
        assert_eq!(mesh.num_vertices(), 25);
        for e in 0..mesh.num_elements() {
            mesh.check_box(e).unwrap();
        }

        let mut cube = Mesh::cartesian_3d(1, 1, 1, 1.0, 1.0, 1.0).unwrap();
        cube.refine(2);
        assert_eq!(cube.num_elements(), 64);
        assert_eq!(cube.num_vertices(), 125);
    }

    #[test]
    fn test_locate() {
        let mesh = Mesh::cartesian_2d(4, 2, 2.0, 1.0).unwrap();
        let (e, r) = mesh.locate(&[0.75, 0.25, 0.0]).unwrap();
        assert_eq!(e, 1);
        assert!((r[0] - 0.0).abs() < 1e-12);
        assert!((r[1] - 0.0).abs() < 1e-12);
        assert!(mesh.locate(&[2.5, 0.5, 0.0]).is_none());
        assert!(mesh.locate(&[f64::NAN, 0.5, 0.0]).is_none());
        assert!(mesh.locate(&[0.5, f64::INFINITY, 0.0]).is_none());
        assert!(mesh.locate(&[0.5]).is_none());
    }

    #[test]
    fn test_set_attribute_out_of_range() {
        let mut mesh = Mesh::cartesian_1d(2, 1.0).unwrap();
        assert!(mesh.set_attribute(5, 3).is_err());
    }
}
