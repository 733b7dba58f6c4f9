use glam::{Vec3, Vec4};

use super::camera::Ray;

/// The three scene functions a generated kernel calls.
///
/// `step` is the march iteration the sample belongs to, as in the kernel.
pub trait SceneFunctions {
    fn distance(&self, position: Vec3, step: u32) -> f32;
    fn material(&self, position: Vec3, step: u32) -> Vec4;
    fn skybox(&self, step: u32) -> Vec4;
}

/// [`SceneFunctions`] from three closures.
pub struct ClosureScene<D, M, S> {
    pub distance: D,
    pub material: M,
    pub skybox: S,
}

impl<D, M, S> ClosureScene<D, M, S>
where
    D: Fn(Vec3, u32) -> f32,
    M: Fn(Vec3, u32) -> Vec4,
    S: Fn(u32) -> Vec4,
{
    pub fn new(distance: D, material: M, skybox: S) -> Self {
        Self { distance, material, skybox }
    }
}

impl<D, M, S> SceneFunctions for ClosureScene<D, M, S>
where
    D: Fn(Vec3, u32) -> f32,
    M: Fn(Vec3, u32) -> Vec4,
    S: Fn(u32) -> Vec4,
{
    fn distance(&self, position: Vec3, step: u32) -> f32 {
        (self.distance)(position, step)
    }

    fn material(&self, position: Vec3, step: u32) -> Vec4 {
        (self.material)(position, step)
    }

    fn skybox(&self, step: u32) -> Vec4 {
        (self.skybox)(step)
    }
}

/// Terminal state of one traced ray.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TraceOutcome {
    pub color: Vec4,
    /// Distance-function evaluations performed.
    pub steps: u32,
    /// `true` for a surface hit, `false` when the step budget ran out.
    pub hit: bool,
}

/// Sphere-traces `ray` through `scene`.
///
/// Each iteration samples the distance at the current point and advances by
/// it. A sample below `epsilon` ends the march with the material colour at
/// the advanced point; after `max_steps` samples without a hit the skybox
/// colour is returned. A non-converging scene is not an error, it simply
/// runs out of steps.
pub fn march<S: SceneFunctions + ?Sized>(
    scene: &S,
    ray: &Ray,
    max_steps: u32,
    epsilon: f32,
) -> TraceOutcome {
    let mut traveled = 0.0;
    for step in 0..max_steps {
        let d = scene.distance(ray.at(traveled), step);
        traveled += d;
        if d < epsilon {
            return TraceOutcome {
                color: scene.material(ray.at(traveled), step),
                steps: step + 1,
                hit: true,
            };
        }
    }

    TraceOutcome {
        color: scene.skybox(max_steps),
        steps: max_steps,
        hit: false,
    }
}

/// Surface normal from four tetrahedral samples of the distance field.
///
/// Samples at `p + k` for `k` in `(h,-h,-h)`, `(-h,-h,h)`, `(-h,h,-h)`,
/// `(h,h,h)`, each weighted by its own offset, then normalized. Zero when
/// the field is flat around `p`.
pub fn estimate_normal<S: SceneFunctions + ?Sized>(scene: &S, p: Vec3, h: f32) -> Vec3 {
    let offsets = [
        Vec3::new(h, -h, -h),
        Vec3::new(-h, -h, h),
        Vec3::new(-h, h, -h),
        Vec3::new(h, h, h),
    ];
    offsets
        .iter()
        .map(|&k| k * scene.distance(p + k, 0))
        .sum::<Vec3>()
        .normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rmrp_compiler::templates::{HIT_EPSILON, NORMAL_EPSILON};

    use super::*;

    const MATERIAL: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
    const SKY: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);

    /// Constant-distance scene that counts its distance evaluations.
    struct Constant {
        d: f32,
        calls: Cell<u32>,
    }

    impl SceneFunctions for Constant {
        fn distance(&self, _: Vec3, _: u32) -> f32 {
            self.calls.set(self.calls.get() + 1);
            self.d
        }
        fn material(&self, _: Vec3, _: u32) -> Vec4 {
            MATERIAL
        }
        fn skybox(&self, _: u32) -> Vec4 {
            SKY
        }
    }

    fn sphere(radius: f32) -> impl SceneFunctions {
        ClosureScene::new(move |p: Vec3, _| p.length() - radius, |_, _| MATERIAL, |_| SKY)
    }

    fn forward() -> Ray {
        Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z)
    }

    #[test]
    fn positive_constant_exhausts_budget() {
        let scene = Constant { d: 1.0, calls: Cell::new(0) };
        let out = march(&scene, &forward(), 64, HIT_EPSILON);
        assert_eq!(out, TraceOutcome { color: SKY, steps: 64, hit: false });
        assert_eq!(scene.calls.get(), 64);
    }

    #[test]
    fn zero_distance_hits_on_first_sample() {
        let scene = Constant { d: 0.0, calls: Cell::new(0) };
        let out = march(&scene, &forward(), 64, HIT_EPSILON);
        assert_eq!(out, TraceOutcome { color: MATERIAL, steps: 1, hit: true });
        assert_eq!(scene.calls.get(), 1);
    }

    #[test]
    fn skybox_receives_step_budget() {
        let scene = ClosureScene::new(|_, _| 10.0, |_, _| MATERIAL, |step| Vec4::splat(step as f32));
        assert_eq!(march(&scene, &forward(), 7, HIT_EPSILON).color, Vec4::splat(7.0));
    }

    #[test]
    fn sphere_is_hit_near_its_surface() {
        let scene = ClosureScene::new(
            |p: Vec3, _| p.length() - 1.0,
            |p: Vec3, _| p.extend(1.0),
            |_| SKY,
        );
        let out = march(&scene, &forward(), 128, HIT_EPSILON);
        assert!(out.hit);
        assert!((out.color.z - 1.0).abs() < 1e-3, "{:?}", out.color);
    }

    #[test]
    fn ray_missing_sphere_sees_sky() {
        let ray = Ray::new(Vec3::new(0.0, 3.0, 5.0), Vec3::NEG_Z);
        let out = march(&sphere(1.0), &ray, 64, HIT_EPSILON);
        assert!(!out.hit);
        assert_eq!(out.color, SKY);
    }

    #[test]
    fn normal_of_sphere_points_outward() {
        let scene = sphere(1.0);
        for dir in [Vec3::X, Vec3::NEG_Y, Vec3::new(1.0, 1.0, 0.0).normalize()] {
            let n = estimate_normal(&scene, dir, NORMAL_EPSILON);
            assert!((n - dir).length() < 1e-2, "{n:?} vs {dir:?}");
        }
    }

    #[test]
    fn normal_of_box_corner_region_is_axis_aligned_on_faces() {
        let scene = ClosureScene::new(
            |p: Vec3, _| {
                let q = p.abs() - Vec3::ONE;
                q.max(Vec3::ZERO).length() + q.max_element().min(0.0)
            },
            |_, _| MATERIAL,
            |_| SKY,
        );
        let n = estimate_normal(&scene, Vec3::new(1.0, 0.2, -0.3), NORMAL_EPSILON);
        assert!((n - Vec3::X).length() < 1e-2, "{n:?}");
    }
}
