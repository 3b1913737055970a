//! # Geometry Backend
//!
//! The narrow interface through which solving and composition touch meshes.
//!
//! Scene entities only hold `GeometryHandle`s. Everything the core needs from
//! real geometry is a bounding box, a tagged face extraction, a join and a
//! delete. `ProxyGeometry` implements the interface with axis-aligned boxes.

use std::collections::BTreeMap;

use hearth_domain::{Subpart, Tag, TagSet};
use serde::{Deserialize, Serialize};

/// Opaque handle to a mesh owned by a geometry backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GeometryHandle(pub u64);

/// Axis-aligned bounding box in world units (metres).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: [f64; 3],
    /// Maximum corner.
    pub max: [f64; 3],
}

impl BoundingBox {
    /// Creates a box from two corners.
    #[must_use]
    pub const fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// Creates a box of `size` whose bottom face is centred on `base`.
    #[must_use]
    pub fn from_base(base: [f64; 3], size: [f64; 3]) -> Self {
        Self {
            min: [base[0] - size[0] / 2.0, base[1] - size[1] / 2.0, base[2]],
            max: [base[0] + size[0] / 2.0, base[1] + size[1] / 2.0, base[2] + size[2]],
        }
    }

    /// Edge lengths.
    #[must_use]
    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Footprint area.
    #[must_use]
    pub fn area_xy(&self) -> f64 {
        let [x, y, _] = self.size();
        x * y
    }

    /// Footprint perimeter.
    #[must_use]
    pub fn perimeter_xy(&self) -> f64 {
        let [x, y, _] = self.size();
        2.0 * (x + y)
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }

    /// Length of the space diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        let [x, y, z] = self.size();
        (x * x + y * y + z * z).sqrt()
    }

    /// Smallest box containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: [
                self.min[0].min(other.min[0]),
                self.min[1].min(other.min[1]),
                self.min[2].min(other.min[2]),
            ],
            max: [
                self.max[0].max(other.max[0]),
                self.max[1].max(other.max[1]),
                self.max[2].max(other.max[2]),
            ],
        }
    }

    /// Smallest box containing every box of the iterator.
    pub fn union_all<'a>(boxes: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
        boxes.into_iter().fold(None, |acc, b| match acc {
            None => Some(*b),
            Some(a) => Some(a.union(b)),
        })
    }
}

/// Operations the core needs from a mesh engine.
pub trait GeometryBackend {
    /// Bounding box of a live mesh.
    fn bounds(&self, handle: GeometryHandle) -> Option<BoundingBox>;

    /// Display name of a live mesh.
    fn name(&self, handle: GeometryHandle) -> Option<&str>;

    /// Creates a box-shaped mesh.
    fn spawn_box(&mut self, name: &str, bbox: BoundingBox) -> GeometryHandle;

    /// Copies the faces of `handle` carrying `tags` into a new mesh.
    fn extract_tagged_faces(&mut self, handle: GeometryHandle, tags: &TagSet) -> Option<GeometryHandle>;

    /// Joins meshes into one new mesh.
    fn join(&mut self, handles: &[GeometryHandle]) -> Option<GeometryHandle>;

    /// Deletes a mesh. Returns false if it was not live.
    fn delete(&mut self, handle: GeometryHandle) -> bool;

    /// Shows or hides a mesh in renders.
    fn set_hidden(&mut self, _handle: GeometryHandle, _hidden: bool) {}
}

#[derive(Clone, Debug)]
struct ProxyMesh {
    name: String,
    bbox: BoundingBox,
    hidden: bool,
}

/// Box-only geometry backend used headless and in tests.
#[derive(Clone, Debug, Default)]
pub struct ProxyGeometry {
    meshes: BTreeMap<GeometryHandle, ProxyMesh>,
    next_id: u64,
}

/// Thickness of extracted face slabs.
const FACE_THICKNESS: f64 = 0.01;

impl ProxyGeometry {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live meshes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Returns true if no mesh is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Returns true if the mesh is hidden.
    #[must_use]
    pub fn is_hidden(&self, handle: GeometryHandle) -> bool {
        self.meshes.get(&handle).is_some_and(|m| m.hidden)
    }

    fn insert(&mut self, name: String, bbox: BoundingBox) -> GeometryHandle {
        let handle = GeometryHandle(self.next_id);
        self.next_id += 1;
        self.meshes.insert(
            handle,
            ProxyMesh {
                name,
                bbox,
                hidden: false,
            },
        );
        handle
    }
}

impl GeometryBackend for ProxyGeometry {
    fn bounds(&self, handle: GeometryHandle) -> Option<BoundingBox> {
        self.meshes.get(&handle).map(|m| m.bbox)
    }

    fn name(&self, handle: GeometryHandle) -> Option<&str> {
        self.meshes.get(&handle).map(|m| m.name.as_str())
    }

    fn spawn_box(&mut self, name: &str, bbox: BoundingBox) -> GeometryHandle {
        self.insert(name.to_string(), bbox)
    }

    fn extract_tagged_faces(&mut self, handle: GeometryHandle, tags: &TagSet) -> Option<GeometryHandle> {
        let mesh = self.meshes.get(&handle)?;
        let b = mesh.bbox;
        let has = |part: Subpart| tags.contains(&Tag::Subpart(part));

        // A box has a floor slab, a ceiling slab and four wall slabs; walls
        // are approximated by the whole shell.
        let slab = if has(Subpart::SupportSurface) || has(Subpart::Floor) || has(Subpart::Bottom) {
            BoundingBox::new(b.min, [b.max[0], b.max[1], b.min[2] + FACE_THICKNESS])
        } else if has(Subpart::Ceiling) || has(Subpart::Top) {
            BoundingBox::new([b.min[0], b.min[1], b.max[2] - FACE_THICKNESS], b.max)
        } else if has(Subpart::Wall) || has(Subpart::Side) || tags.is_empty() {
            b
        } else {
            return None;
        };
        let name = format!("{}.faces", mesh.name);
        Some(self.insert(name, slab))
    }

    fn join(&mut self, handles: &[GeometryHandle]) -> Option<GeometryHandle> {
        let boxes: Vec<BoundingBox> = handles.iter().filter_map(|h| self.bounds(*h)).collect();
        let bbox = BoundingBox::union_all(&boxes)?;
        Some(self.insert("joined".to_string(), bbox))
    }

    fn delete(&mut self, handle: GeometryHandle) -> bool {
        self.meshes.remove(&handle).is_some()
    }

    fn set_hidden(&mut self, handle: GeometryHandle, hidden: bool) {
        if let Some(mesh) = self.meshes.get_mut(&handle) {
            mesh.hidden = hidden;
        }
    }
}
