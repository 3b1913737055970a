//! # Collaborators
//!
//! Everything the composition driver delegates: terrain, lighting, cameras,
//! asset population and room decoration. Every method has a no-op default,
//! so an implementation only overrides what it provides.
//!
//! `HeadlessCollaborators` works on proxy boxes alone and records each call,
//! which is enough for the binary's coarse task and for tests.

use std::collections::BTreeMap;
use std::fmt;

use hearth_domain::{Semantics, Tag};
use hearth_pipeline::BoxError;
use hearth_state::{BoundingBox, GeometryBackend, GeometryHandle, SceneState};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::camera::CameraPose;

/// Room construction elements decorated after solving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoomElement {
    /// Door frames and leaves.
    Doors,
    /// Window frames and glazing.
    Windows,
    /// Staircases.
    Stairs,
    /// Skirting along the floor.
    SkirtingFloor,
    /// Skirting along the ceiling.
    SkirtingCeiling,
    /// Wall surfaces.
    Walls,
    /// Pillars.
    Pillars,
    /// Floor surfaces.
    Floors,
    /// Ceiling surfaces.
    Ceilings,
}

impl RoomElement {
    /// Stage name this element is decorated in.
    #[must_use]
    pub const fn stage(self) -> &'static str {
        match self {
            Self::Doors => "room_doors",
            Self::Windows => "room_windows",
            Self::Stairs => "room_stairs",
            Self::SkirtingFloor => "skirting_floor",
            Self::SkirtingCeiling => "skirting_ceiling",
            Self::Walls => "room_walls",
            Self::Pillars => "room_pillars",
            Self::Floors => "room_floors",
            Self::Ceilings => "room_ceilings",
        }
    }

    /// Skirting boards are cosmetic and drawn against their stage chance.
    #[must_use]
    pub const fn is_optional(self) -> bool {
        matches!(self, Self::SkirtingFloor | Self::SkirtingCeiling)
    }
}

impl fmt::Display for RoomElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stage())
    }
}

/// Work the composition driver hands to external systems.
#[allow(unused_variables)]
pub trait Collaborators {
    /// Builds the terrain. Returns its mesh, if any.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn terrain(
        &mut self,
        geo: &mut dyn GeometryBackend,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<GeometryHandle>, BoxError> {
        Ok(None)
    }

    /// Sets up sky and sun lighting.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn sky_lighting(&mut self, geo: &mut dyn GeometryBackend, rng: &mut ChaCha8Rng) -> Result<(), BoxError> {
        Ok(())
    }

    /// Creates the camera rig.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn spawn_cameras(&mut self, geo: &mut dyn GeometryBackend) -> Result<Vec<GeometryHandle>, BoxError> {
        Ok(Vec::new())
    }

    /// Places cameras over the walkable `floor` inside `bbox`.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn pose_cameras(
        &mut self,
        geo: &mut dyn GeometryBackend,
        cameras: &[GeometryHandle],
        floor: Option<GeometryHandle>,
        bbox: Option<BoundingBox>,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Animates posed cameras, optionally tracking `follow`.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn animate_cameras(
        &mut self,
        geo: &mut dyn GeometryBackend,
        cameras: &[GeometryHandle],
        bbox: Option<BoundingBox>,
        follow: Option<GeometryHandle>,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Replaces placeholders with assets. With `filter`, only entities
    /// carrying that tag; `final_pass` marks the last population. Returns
    /// the number of entities populated.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn populate_placeholders(
        &mut self,
        state: &SceneState,
        geo: &mut dyn GeometryBackend,
        filter: Option<Semantics>,
        final_pass: bool,
        rng: &mut ChaCha8Rng,
    ) -> Result<usize, BoxError> {
        Ok(0)
    }

    /// Decorates one kind of room element.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn decorate_room(
        &mut self,
        geo: &mut dyn GeometryBackend,
        element: RoomElement,
        handles: &[GeometryHandle],
        rng: &mut ChaCha8Rng,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Turns interior lights off.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn lights_off(&mut self, geo: &mut dyn GeometryBackend, rng: &mut ChaCha8Rng) -> Result<(), BoxError> {
        Ok(())
    }

    /// Places an overhead camera above `bbox`.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn overhead_camera(
        &mut self,
        geo: &mut dyn GeometryBackend,
        camera: Option<GeometryHandle>,
        bbox: BoundingBox,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Surrounds the house with nature on `terrain`. Returns the vertical
    /// offset that puts the house on the ground.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn nature_backdrop(
        &mut self,
        geo: &mut dyn GeometryBackend,
        terrain: GeometryHandle,
        house_bbox: BoundingBox,
        rng: &mut ChaCha8Rng,
    ) -> Result<f64, BoxError> {
        Ok(0.0)
    }

    /// Switches `camera` to a top view.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn topview(
        &mut self,
        geo: &mut dyn GeometryBackend,
        camera: Option<GeometryHandle>,
        pose: CameraPose,
        alpha_walls: f64,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Receives configuration keys the driver does not recognise.
    fn passthrough(&mut self, extra: &BTreeMap<String, toml::Value>) {}
}

/// Proxy-box collaborators for headless runs.
#[derive(Clone, Debug, Default)]
pub struct HeadlessCollaborators {
    /// Calls received, in order.
    pub calls: Vec<String>,
    /// Poses handed to cameras.
    pub poses: Vec<CameraPose>,
    /// Passthrough configuration received.
    pub extra: BTreeMap<String, toml::Value>,
    /// Box handed to the overhead camera, if any.
    pub overhead_bbox: Option<BoundingBox>,
    terrain_top: f64,
}

/// Terrain extent around the origin, metres.
const TERRAIN_EXTENT: f64 = 100.0;

/// Camera proxy size, metres.
const CAMERA_SIZE: f64 = 0.2;

/// Eye height of posed cameras, metres.
const EYE_HEIGHT: f64 = 1.5;

impl HeadlessCollaborators {
    /// Creates a collaborator set with an empty call log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `name` was called.
    #[must_use]
    pub fn called(&self, name: &str) -> bool {
        self.calls.iter().any(|c| c == name)
    }

    fn log(&mut self, name: &str) {
        debug!(call = name, "headless collaborator");
        self.calls.push(name.to_string());
    }
}

impl Collaborators for HeadlessCollaborators {
    fn terrain(
        &mut self,
        geo: &mut dyn GeometryBackend,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<GeometryHandle>, BoxError> {
        self.log("terrain");
        self.terrain_top = rng.gen_range(0.0..0.5);
        let ground = BoundingBox::new(
            [-TERRAIN_EXTENT, -TERRAIN_EXTENT, self.terrain_top - 1.0],
            [TERRAIN_EXTENT, TERRAIN_EXTENT, self.terrain_top],
        );
        Ok(Some(geo.spawn_box("terrain", ground)))
    }

    fn sky_lighting(&mut self, _geo: &mut dyn GeometryBackend, _rng: &mut ChaCha8Rng) -> Result<(), BoxError> {
        self.log("sky_lighting");
        Ok(())
    }

    fn spawn_cameras(&mut self, geo: &mut dyn GeometryBackend) -> Result<Vec<GeometryHandle>, BoxError> {
        self.log("spawn_cameras");
        let bbox = BoundingBox::new([0.0; 3], [CAMERA_SIZE; 3]);
        Ok(vec![geo.spawn_box("camera_0", bbox)])
    }

    fn pose_cameras(
        &mut self,
        geo: &mut dyn GeometryBackend,
        cameras: &[GeometryHandle],
        floor: Option<GeometryHandle>,
        bbox: Option<BoundingBox>,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), BoxError> {
        self.log("pose_cameras");
        let area = floor
            .and_then(|h| geo.bounds(h))
            .or(bbox)
            .ok_or("no floor to pose cameras on")?;
        for _ in cameras {
            let x = rng.gen_range(area.min[0]..=area.max[0]);
            let y = rng.gen_range(area.min[1]..=area.max[1]);
            self.poses.push(CameraPose {
                location: [x, y, area.min[2] + EYE_HEIGHT],
                rotation_deg: [90.0, 0.0, rng.gen_range(0.0..360.0)],
            });
        }
        Ok(())
    }

    fn animate_cameras(
        &mut self,
        geo: &mut dyn GeometryBackend,
        _cameras: &[GeometryHandle],
        _bbox: Option<BoundingBox>,
        follow: Option<GeometryHandle>,
        _rng: &mut ChaCha8Rng,
    ) -> Result<(), BoxError> {
        self.log("animate_cameras");
        if let Some(target) = follow.and_then(|h| geo.bounds(h)) {
            let c = target.center();
            for pose in &mut self.poses {
                let dx = c[0] - pose.location[0];
                let dy = c[1] - pose.location[1];
                pose.rotation_deg[2] = (-dx).atan2(dy).to_degrees();
            }
        }
        Ok(())
    }

    fn populate_placeholders(
        &mut self,
        state: &SceneState,
        _geo: &mut dyn GeometryBackend,
        filter: Option<Semantics>,
        final_pass: bool,
        _rng: &mut ChaCha8Rng,
    ) -> Result<usize, BoxError> {
        self.log(if final_pass { "populate_assets" } else { "populate_placeholders" });
        let object = Tag::Semantics(Semantics::Object);
        let n = state
            .iter()
            .filter(|(_, spec)| spec.tags.contains(&object))
            .filter(|(_, spec)| filter.map_or(true, |kind| spec.has_tag(kind)))
            .count();
        Ok(n)
    }

    fn decorate_room(
        &mut self,
        _geo: &mut dyn GeometryBackend,
        element: RoomElement,
        _handles: &[GeometryHandle],
        _rng: &mut ChaCha8Rng,
    ) -> Result<(), BoxError> {
        self.log(element.stage());
        Ok(())
    }

    fn lights_off(&mut self, _geo: &mut dyn GeometryBackend, _rng: &mut ChaCha8Rng) -> Result<(), BoxError> {
        self.log("lights_off");
        Ok(())
    }

    fn overhead_camera(
        &mut self,
        _geo: &mut dyn GeometryBackend,
        _camera: Option<GeometryHandle>,
        bbox: BoundingBox,
    ) -> Result<(), BoxError> {
        self.log("overhead_camera");
        self.overhead_bbox = Some(bbox);
        let c = bbox.center();
        self.poses.push(CameraPose {
            location: [c[0], c[1], bbox.max[2] + bbox.size()[0].max(bbox.size()[1])],
            rotation_deg: [0.0; 3],
        });
        Ok(())
    }

    fn nature_backdrop(
        &mut self,
        geo: &mut dyn GeometryBackend,
        terrain: GeometryHandle,
        house_bbox: BoundingBox,
        _rng: &mut ChaCha8Rng,
    ) -> Result<f64, BoxError> {
        self.log("nature_backdrop");
        let ground = geo.bounds(terrain).ok_or("terrain mesh is gone")?;
        Ok(ground.max[2] - house_bbox.min[2])
    }

    fn topview(
        &mut self,
        _geo: &mut dyn GeometryBackend,
        _camera: Option<GeometryHandle>,
        pose: CameraPose,
        _alpha_walls: f64,
    ) -> Result<(), BoxError> {
        self.log("topview");
        self.poses.push(pose);
        Ok(())
    }

    fn passthrough(&mut self, extra: &BTreeMap<String, toml::Value>) {
        self.extra.clone_from(extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_state::ProxyGeometry;
    use rand::SeedableRng;

    #[test]
    fn test_defaults_do_nothing() {
        struct Bare;
        impl Collaborators for Bare {}

        let mut geo = ProxyGeometry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut bare = Bare;
        assert!(bare.terrain(&mut geo, &mut rng).unwrap().is_none());
        assert!(bare.spawn_cameras(&mut geo).unwrap().is_empty());
        assert!(geo.is_empty());
    }

    #[test]
    fn test_backdrop_lifts_house_onto_terrain() {
        let mut geo = ProxyGeometry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut c = HeadlessCollaborators::new();
        let terrain = c.terrain(&mut geo, &mut rng).unwrap().unwrap();
        let house = BoundingBox::new([0.0, 0.0, 0.0], [10.0, 5.0, 2.8]);
        let offset = c.nature_backdrop(&mut geo, terrain, house, &mut rng).unwrap();
        let top = geo.bounds(terrain).unwrap().max[2];
        assert!((house.min[2] + offset - top).abs() < 1e-9);
        assert!(c.called("terrain") && c.called("nature_backdrop"));
    }

    #[test]
    fn test_pose_without_floor_fails() {
        let mut geo = ProxyGeometry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut c = HeadlessCollaborators::new();
        let cams = c.spawn_cameras(&mut geo).unwrap();
        assert!(c.pose_cameras(&mut geo, &cams, None, None, &mut rng).is_err());
        let floor = geo.spawn_box("floor", BoundingBox::new([0.0; 3], [4.0, 3.0, 0.01]));
        c.pose_cameras(&mut geo, &cams, Some(floor), None, &mut rng).unwrap();
        assert_eq!(c.poses.len(), 1);
        assert!(c.poses[0].location[0] <= 4.0);
    }

    #[test]
    fn test_only_skirting_is_optional() {
        let optional: Vec<RoomElement> = [
            RoomElement::Doors,
            RoomElement::Windows,
            RoomElement::Stairs,
            RoomElement::SkirtingFloor,
            RoomElement::SkirtingCeiling,
            RoomElement::Walls,
            RoomElement::Pillars,
            RoomElement::Floors,
            RoomElement::Ceilings,
        ]
        .into_iter()
        .filter(|e| e.is_optional())
        .collect();
        assert_eq!(optional, vec![RoomElement::SkirtingFloor, RoomElement::SkirtingCeiling]);
    }
}
