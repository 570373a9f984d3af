use super::pose::{ColliderState, Pose};

impl ColliderState {
    /// Whether the point lies inside this oriented box (edges included).
    ///
    /// The box is `width` x `height` in the collider's local space with its origin at the pivot,
    /// then scaled, rotated and translated by the resolved transform.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let t = &self.object.transform;
        if t.scale_x == 0.0 || t.scale_y == 0.0 {
            return false;
        }

        let (sin, cos) = (-t.angle).to_radians().sin_cos();
        let (dx, dy) = (x - t.x, y - t.y);
        let local_x = (dx * cos - dy * sin) / t.scale_x;
        let local_y = (dx * sin + dy * cos) / t.scale_y;

        let left = -self.pivot_x * self.width;
        let bottom = -self.pivot_y * self.height;
        left <= local_x
            && local_x <= left + self.width
            && bottom <= local_y
            && local_y <= bottom + self.height
    }
}

impl Pose {
    /// Every collider containing the point, in pose order.
    pub fn hit_test(&self, x: f32, y: f32) -> Vec<&ColliderState> {
        self.colliders.iter().filter(|c| c.contains(x, y)).collect()
    }
}
