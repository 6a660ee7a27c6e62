//! Ring layout for exhibit placement

use xr_engine::prelude::Vec3;

/// Place `count` items evenly on a horizontal ring around the origin
///
/// The radius grows with item size and gap so the arc between neighbors
/// stays roughly constant no matter how many items there are. `y_offset`
/// selects which ring level the items sit on.
pub fn place_ring(
    y_offset: i32,
    y_spacing: f32,
    item_width: f32,
    gap: f32,
    count: usize,
) -> Vec<Vec3> {
    if count == 0 {
        return Vec::new();
    }
    let angle_step = std::f32::consts::TAU / count as f32;
    let radius = (item_width + gap) / angle_step;
    let y = y_offset as f32 * y_spacing;

    (0..count)
        .map(|i| {
            let angle = i as f32 * angle_step;
            Vec3::new(radius * angle.cos(), y, radius * angle.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_keeps_constant_distance_from_axis() {
        let positions = place_ring(2, 1.5, 0.5, 0.9, 8);
        assert_eq!(positions.len(), 8);
        let radius = (positions[0].x.powi(2) + positions[0].z.powi(2)).sqrt();
        for position in &positions {
            let r = (position.x.powi(2) + position.z.powi(2)).sqrt();
            assert!((r - radius).abs() < 1e-4);
            assert!((position.y - 3.0).abs() < 1e-6);
        }
    }
}
