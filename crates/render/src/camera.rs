use glam::{Mat4, Vec3, Vec4};
use serde::Serialize;

/// NDC depth at which the screen corners are unprojected.
///
/// With a `[0, 1]` depth range this is the near plane, so each corner ray ends
/// on the near rectangle of the frustum. A GL-style `[-1, 1]` projection puts
/// NDC z = 0 at `2 * near * far / (near + far)` instead, roughly twice as far
/// for the reference planes, so ray magnitudes differ from a GL unprojection.
/// Only their direction reaches the kernel, which normalizes each ray.
pub const REFERENCE_DEPTH: f32 = 0.0;

/// Symmetric perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    /// Vertical field of view in radians.
    pub fovy: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn from_degrees(fovy_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fovy: fovy_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy, self.aspect, self.near, self.far)
    }
}

/// Matrices and corner rays derived from one camera pose.
///
/// Corner rays are named by screen corner: `ray00` is bottom-left, `ray01`
/// top-left, `ray10` bottom-right and `ray11` top-right. They are world-space
/// offsets from the camera position, not normalized: their length is the
/// frustum extent at [`REFERENCE_DEPTH`] and consumers blend them bilinearly
/// per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frustum {
    pub view: Mat4,
    pub projection: Mat4,
    pub inv_view_proj: Mat4,
    pub ray00: Vec3,
    pub ray01: Vec3,
    pub ray10: Vec3,
    pub ray11: Vec3,
}

impl Frustum {
    /// Derive view, projection and the four corner rays.
    ///
    /// Pure function of its inputs. The pose must keep the reference corners
    /// off the plane where the unprojected `w` vanishes (for instance
    /// `position == target`, or `up` parallel to the view direction); such a
    /// pose is a caller error and yields non-finite rays.
    pub fn derive(position: Vec3, target: Vec3, up: Vec3, projection: &Projection) -> Self {
        let view = Mat4::look_at_rh(position, target, up);
        let proj = projection.matrix();
        let inv_view_proj = (proj * view).inverse();

        let corner = |x: f32, y: f32| {
            let p = inv_view_proj * Vec4::new(x, y, REFERENCE_DEPTH, 1.0);
            (p / p.w).truncate() - position
        };

        Self {
            view,
            projection: proj,
            inv_view_proj,
            ray00: corner(-1.0, -1.0),
            ray01: corner(-1.0, 1.0),
            ray10: corner(1.0, -1.0),
            ray11: corner(1.0, 1.0),
        }
    }

    /// Corner rays in `[ray00, ray01, ray10, ray11]` order.
    pub fn corner_rays(&self) -> [Vec3; 4] {
        [self.ray00, self.ray01, self.ray10, self.ray11]
    }

    /// Bilinear blend of the corner rays, `u` left to right and `v` bottom to
    /// top, both in `[0, 1]`. This is the per-pixel direction the compute
    /// kernel traces.
    pub fn ray_at(&self, u: f32, v: f32) -> Vec3 {
        let bottom = self.ray00.lerp(self.ray10, u);
        let top = self.ray01.lerp(self.ray11, u);
        bottom.lerp(top, v)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn is_finite(&self) -> bool {
        self.inv_view_proj.is_finite() && self.corner_rays().iter().all(|r| r.is_finite())
    }
}

/// Camera pose plus the frustum derived from it.
///
/// The pose is only mutable through methods that re-derive the frustum in the
/// same call, so [`Camera::frustum`] always matches the current pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    projection: Projection,
    frustum: Frustum,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3, up: Vec3, projection: Projection) -> Self {
        Self {
            position,
            target,
            up,
            projection,
            frustum: Frustum::derive(position, target, up, &projection),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Move the camera, keeping target and up.
    pub fn set_position(&mut self, position: Vec3) {
        self.set_pose(position, self.target, self.up);
    }

    pub fn set_pose(&mut self, position: Vec3, target: Vec3, up: Vec3) {
        self.position = position;
        self.target = target;
        self.up = up;
        self.frustum = Frustum::derive(position, target, up, &self.projection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn reference_projection() -> Projection {
        Projection::from_degrees(60.0, 1024.0 / 512.0, 0.1, 100.0)
    }

    #[test]
    fn derivation_is_deterministic() {
        let proj = reference_projection();
        let a = Frustum::derive(Vec3::new(1.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y, &proj);
        let b = Frustum::derive(Vec3::new(1.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y, &proj);
        assert!(a.inv_view_proj.abs_diff_eq(b.inv_view_proj, EPS));
        for (ra, rb) in a.corner_rays().iter().zip(b.corner_rays()) {
            assert!(ra.abs_diff_eq(rb, EPS));
        }
    }

    #[test]
    fn corner_rays_mirror_about_view_axis() {
        let f = Frustum::derive(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y, &reference_projection());
        assert!((f.ray00.x + f.ray10.x).abs() < EPS);
        assert!((f.ray00.y + f.ray01.y).abs() < EPS);
        assert!((f.ray01.x + f.ray11.x).abs() < EPS);
        assert!((f.ray10.y + f.ray11.y).abs() < EPS);
        // all four corners look down -Z
        for r in f.corner_rays() {
            assert!(r.z < 0.0);
        }
    }

    #[test]
    fn corners_round_trip_through_projection() {
        let cam = Camera::new(
            Vec3::new(3.0, 2.0, 7.0),
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::Y,
            reference_projection(),
        );
        let f = cam.frustum();
        let vp = f.view_projection();
        let corners = [(-1.0, -1.0), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)];
        for (ray, (x, y)) in f.corner_rays().iter().zip(corners) {
            let world = cam.position() + *ray;
            let clip = vp * world.extend(1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(
                ndc.abs_diff_eq(Vec3::new(x, y, REFERENCE_DEPTH), 1e-4),
                "corner ({x}, {y}) came back as {ndc:?}"
            );
        }
    }

    #[test]
    fn offset_pose_is_well_formed() {
        let proj = reference_projection();
        let f = Frustum::derive(Vec3::new(3.0, 2.0, 7.0), Vec3::new(0.0, 0.5, 0.0), Vec3::Y, &proj);
        assert!(f.is_finite());
        assert!(f.inv_view_proj.determinant().abs() > 0.0);
        for r in f.corner_rays() {
            assert!(r.length() > 0.0);
        }
    }

    #[test]
    fn ray_magnitude_reaches_near_plane() {
        let f = Frustum::derive(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y, &reference_projection());
        // the blended center ray is the view axis scaled to the near distance
        let center = f.ray_at(0.5, 0.5);
        assert!(center.abs_diff_eq(Vec3::new(0.0, 0.0, -0.1), EPS));
        assert!(f.ray_at(0.0, 0.0).abs_diff_eq(f.ray00, EPS));
        assert!(f.ray_at(1.0, 1.0).abs_diff_eq(f.ray11, EPS));
    }

    #[test]
    fn ray_length_differs_from_gl_depth_range() {
        let proj = reference_projection();
        let position = Vec3::new(0.0, 0.0, 3.0);
        let f = Frustum::derive(position, Vec3::ZERO, Vec3::Y, &proj);
        for r in f.corner_rays() {
            assert!((r.dot(Vec3::NEG_Z) - proj.near).abs() < 1e-4);
        }

        let view = Mat4::look_at_rh(position, Vec3::ZERO, Vec3::Y);
        let gl = Mat4::perspective_rh_gl(proj.fovy, proj.aspect, proj.near, proj.far);
        let p = (gl * view).inverse() * Vec4::new(0.0, 0.0, REFERENCE_DEPTH, 1.0);
        let gl_center = (p / p.w).truncate() - position;
        let gl_depth = 2.0 * proj.near * proj.far / (proj.near + proj.far);
        assert!((gl_center.length() - gl_depth).abs() < 1e-4);
        assert!(gl_center.length() > 1.9 * f.ray_at(0.5, 0.5).length());
        assert!(gl_center.normalize().abs_diff_eq(f.ray_at(0.5, 0.5).normalize(), 1e-4));
    }

    #[test]
    fn moving_camera_rederives_frustum() {
        let mut cam = Camera::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y, reference_projection());
        let before = *cam.frustum();
        cam.set_position(Vec3::new(3.0, 0.0, 0.0));
        let expected = Frustum::derive(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO, Vec3::Y, cam.projection());
        assert_ne!(before, *cam.frustum());
        assert_eq!(expected, *cam.frustum());
        assert_eq!(cam.target(), Vec3::ZERO);
        assert_eq!(cam.up(), Vec3::Y);
    }

    #[test]
    fn degenerate_pose_is_not_finite() {
        let f = Frustum::derive(Vec3::ZERO, Vec3::ZERO, Vec3::Y, &reference_projection());
        assert!(!f.is_finite());
    }
}
