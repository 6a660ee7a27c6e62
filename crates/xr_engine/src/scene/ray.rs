//! Ray casting against scene bounding spheres
//!
//! Picking uses bounding spheres rather than triangle meshes: controller
//! rays only need to resolve which object is pointed at, and spheres keep
//! that resolution cheap enough to run every frame.

use crate::foundation::math::{Point3, Vec3};

use super::{Node, NodeKey, Scene};

/// A ray for picking, in world space
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Point3,
    /// The direction of the ray (normalized on construction)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Point3 {
        self.origin + self.direction * t
    }

    /// Test this ray against a sphere
    ///
    /// Returns the distance to the nearest intersection in front of the
    /// origin, or `None` when the ray misses or the sphere lies behind it.
    pub fn intersect_sphere(&self, center: Point3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;

        // Quadratic formula coefficients for ray-sphere intersection
        // Solve: |origin + t*direction - center|^2 = radius^2
        let a = self.direction.dot(&self.direction);
        let b = 2.0 * oc.dot(&self.direction);
        let c = oc.dot(&oc) - radius * radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_discriminant = discriminant.sqrt();
        let t1 = (-b - sqrt_discriminant) / (2.0 * a);
        let t2 = (-b + sqrt_discriminant) / (2.0 * a);

        // Use the closest intersection in front of the origin
        if t1 > 0.0 {
            Some(t1)
        } else if t2 > 0.0 {
            Some(t2)
        } else {
            None
        }
    }
}

/// Result of a pick query
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// The node that was hit
    pub node: NodeKey,
    /// The distance from the ray origin to the hit point
    pub distance: f32,
    /// The point of intersection in world space
    pub point: Point3,
}

/// Cast `ray` against the scene's direct children that pass `filter`
///
/// With `recursive` set, descendants of matching children are tested as
/// well; otherwise only the matching children themselves are candidates.
/// Nodes with a zero bounding radius never register hits. Returns the
/// nearest hit, or `None` when nothing qualifies.
pub fn pick(
    scene: &Scene,
    ray: &Ray,
    filter: &dyn Fn(NodeKey, &Node) -> bool,
    recursive: bool,
) -> Option<RayHit> {
    let mut candidates: Vec<NodeKey> = Vec::new();
    for &child in scene.children(scene.root()) {
        let Some(node) = scene.get(child) else { continue };
        if !filter(child, node) {
            continue;
        }
        candidates.push(child);
        if recursive {
            collect_descendants(scene, child, &mut candidates);
        }
    }

    let mut nearest: Option<RayHit> = None;
    for key in candidates {
        let Some(node) = scene.get(key) else { continue };
        if node.bounding_radius <= 0.0 {
            continue;
        }
        let Some(center) = scene.world_position(key) else { continue };
        if let Some(distance) = ray.intersect_sphere(center, node.bounding_radius) {
            let closer = nearest.map_or(true, |hit| distance < hit.distance);
            if closer {
                nearest = Some(RayHit {
                    node: key,
                    distance,
                    point: ray.point_at(distance),
                });
            }
        }
    }
    nearest
}

fn collect_descendants(scene: &Scene, key: NodeKey, out: &mut Vec<NodeKey>) {
    for &child in scene.children(key) {
        out.push(child);
        collect_descendants(scene, child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NodeKind, TINT_NONE};
    use approx::assert_relative_eq;

    fn mesh(name: &str, position: Vec3, radius: f32) -> Node {
        Node::new(NodeKind::Mesh, name)
            .with_position(position)
            .with_radius(radius)
    }

    fn any_mesh(_key: NodeKey, node: &Node) -> bool {
        node.kind == NodeKind::Mesh
    }

    #[test]
    fn test_ray_hits_sphere_head_on() {
        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));
        let t = ray.intersect_sphere(Point3::new(0.0, 0.0, -5.0), 1.0).unwrap();
        assert_relative_eq!(t, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_ray_misses_sphere_behind_origin() {
        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));
        assert!(ray.intersect_sphere(Point3::new(0.0, 0.0, 5.0), 1.0).is_none());
    }

    #[test]
    fn test_pick_returns_nearest_of_two() {
        let mut scene = Scene::new(TINT_NONE);
        let _far = scene.insert(mesh("far", Vec3::new(0.0, 0.0, -10.0), 1.0));
        let near = scene.insert(mesh("near", Vec3::new(0.0, 0.0, -4.0), 1.0));
        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));
        let hit = pick(&scene, &ray, &any_mesh, false).unwrap();
        assert_eq!(hit.node, near);
        assert_relative_eq!(hit.distance, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_pick_honors_filter() {
        let mut scene = Scene::new(TINT_NONE);
        let _skipped = scene.insert(mesh("skipped", Vec3::new(0.0, 0.0, -4.0), 1.0));
        let wanted = scene.insert(mesh("wanted", Vec3::new(0.0, 0.0, -8.0), 1.0));
        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));
        let hit = pick(
            &scene,
            &ray,
            &|_key, node: &Node| node.name == "wanted",
            false,
        )
        .unwrap();
        assert_eq!(hit.node, wanted);
    }

    #[test]
    fn test_pick_empty_match_set_is_no_hit() {
        let mut scene = Scene::new(TINT_NONE);
        scene.insert(mesh("only", Vec3::new(0.0, 0.0, -4.0), 1.0));
        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));
        let hit = pick(&scene, &ray, &|_, _| false, false);
        assert!(hit.is_none());
    }

    #[test]
    fn test_pick_descends_only_when_recursive() {
        let mut scene = Scene::new(TINT_NONE);
        // Parent sits off the ray; its child sits on it
        let parent = scene.insert(mesh("parent", Vec3::new(5.0, 0.0, -4.0), 0.5));
        let child = scene.insert_child(
            parent,
            mesh("child", Vec3::new(-5.0, 0.0, 0.0), 0.5),
        );
        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));

        assert!(pick(&scene, &ray, &any_mesh, false).is_none());
        let hit = pick(&scene, &ray, &any_mesh, true).unwrap();
        assert_eq!(hit.node, child);
    }

    #[test]
    fn test_pick_ignores_zero_radius_nodes() {
        let mut scene = Scene::new(TINT_NONE);
        scene.insert(mesh("ghost", Vec3::new(0.0, 0.0, -4.0), 0.0));
        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));
        assert!(pick(&scene, &ray, &any_mesh, false).is_none());
    }
}
