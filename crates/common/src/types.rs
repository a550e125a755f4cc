use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Identifies a unit grid cell in world space.
///
/// A key is the floor of a world-space point's coordinates, so two points share
/// a key iff their floored coordinates are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectorKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl SectorKey {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Floor each axis of a world-space point.
    pub fn from_point(point: Vec3) -> Self {
        let floored = point.floor();
        Self {
            x: floored.x as i32,
            y: floored.y as i32,
            z: floored.z as i32,
        }
    }

    /// World-space position of the cell's minimum corner.
    pub fn origin(&self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

impl std::fmt::Display for SectorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Spatial transform: position, rotation, scale.
///
/// Used as the parent transform handed to the host when it creates render surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sector_key_floors_each_axis() {
        let key = SectorKey::from_point(Vec3::new(0.2, 1.9, 2.0));
        assert_eq!(key, SectorKey::new(0, 1, 2));
    }

    #[test]
    fn sector_key_floors_negative_toward_negative_infinity() {
        let key = SectorKey::from_point(Vec3::new(-0.1, -1.0, -1.5));
        assert_eq!(key, SectorKey::new(-1, -1, -2));
    }

    #[test]
    fn sector_key_equality_is_structural() {
        let a = SectorKey::from_point(Vec3::new(3.1, 0.0, 0.9));
        let b = SectorKey::from_point(Vec3::new(3.9, 0.5, 0.1));
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn sector_key_display() {
        assert_eq!(SectorKey::new(1, -2, 3).to_string(), "(1, -2, 3)");
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }
}
