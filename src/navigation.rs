//! Keyboard camera navigation.
//!
//! Held keys fly the camera every frame (W/S forward, A/D sideways, Q/E orbit);
//! F frames the selected object and Home/0 goes back to the default view.
//! Whatever drives the camera only has to implement [`CameraRig`].

use bevy::math::Vec3;
use std::collections::HashSet;
use std::f32::consts::PI;
use tracing::debug;

use crate::config::CameraSettings;
use crate::scene::Transform;

pub trait CameraRig {
    /// Move the eye to `eye` looking at `target`, animated when `smooth`.
    fn set_look_at(&mut self, eye: Vec3, target: Vec3, smooth: bool);
    /// Move eye and target along the horizontal view direction.
    fn forward(&mut self, distance: f32);
    /// Move eye and target in the view plane.
    fn truck(&mut self, x: f32, y: f32);
    /// Orbit around the target, radians.
    fn rotate(&mut self, azimuth: f32, polar: f32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavKey {
    W,
    A,
    S,
    D,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Q,
    E,
    F,
    Home,
    Digit0,
}

#[derive(Debug, Default, Clone)]
pub struct HeldKeys(HashSet<NavKey>);

impl HeldKeys {
    pub fn press(&mut self, key: NavKey) {
        self.0.insert(key);
    }

    pub fn release(&mut self, key: NavKey) {
        self.0.remove(&key);
    }

    pub fn is_down(&self, key: NavKey) -> bool {
        self.0.contains(&key)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    fn any(&self, keys: &[NavKey]) -> bool {
        keys.iter().any(|k| self.is_down(*k))
    }
}

pub fn vec3(t: (f32, f32, f32)) -> Vec3 {
    Vec3::new(t.0, t.1, t.2)
}

/// Per-frame movement for whatever keys are currently held.
pub fn apply_held_keys(rig: &mut impl CameraRig, keys: &HeldKeys, cfg: &CameraSettings) {
    let pan = cfg.pan_speed;
    let rot = cfg.rotate_speed;

    if keys.any(&[NavKey::W, NavKey::ArrowUp]) {
        rig.forward(pan);
    }
    if keys.any(&[NavKey::S, NavKey::ArrowDown]) {
        rig.forward(-pan);
    }
    if keys.any(&[NavKey::A, NavKey::ArrowLeft]) {
        rig.truck(-pan, 0.0);
    }
    if keys.any(&[NavKey::D, NavKey::ArrowRight]) {
        rig.truck(pan, 0.0);
    }
    if keys.is_down(NavKey::Q) {
        rig.rotate(-rot, 0.0);
    }
    if keys.is_down(NavKey::E) {
        rig.rotate(rot, 0.0);
    }
}

/// One-shot commands. Returns true when the key did something.
pub fn on_key_pressed(
    rig: &mut impl CameraRig,
    key: NavKey,
    selected: Option<&Transform>,
    cfg: &CameraSettings,
) -> bool {
    match key {
        NavKey::F => {
            let Some(t) = selected else { return false };
            let (x, y, z) = t.world_translation();
            let target = Vec3::new(x as f32, y as f32, z as f32);
            debug!(?target, "focus on selection");
            rig.set_look_at(target + vec3(cfg.focus_offset), target, true);
            true
        }
        NavKey::Home | NavKey::Digit0 => {
            reset_view(rig, cfg);
            true
        }
        _ => false,
    }
}

pub fn reset_view(rig: &mut impl CameraRig, cfg: &CameraSettings) {
    debug!("reset view");
    rig.set_look_at(vec3(cfg.position), vec3(cfg.target), true);
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// from +Y
    polar: f32,
    /// around +Y, zero along +Z
    azimuth: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius: 0.0,
                polar: 0.0,
                azimuth: 0.0,
            };
        }
        Self {
            radius,
            polar: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            azimuth: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let s = self.polar.sin();
        Vec3::new(
            self.radius * s * self.azimuth.sin(),
            self.radius * self.polar.cos(),
            self.radius * s * self.azimuth.cos(),
        )
    }
}

/// Orbit camera around a target point. Smooth moves ease towards their goal
/// on each [`OrbitRig::tick`]; direct moves apply at once.
#[derive(Debug, Clone)]
pub struct OrbitRig {
    target: Vec3,
    spherical: Spherical,
    goal_target: Vec3,
    goal_spherical: Spherical,
    smooth_time: f32,
    min_distance: f32,
    max_distance: f32,
}

impl OrbitRig {
    pub fn new(cfg: &CameraSettings) -> Self {
        let mut rig = Self {
            target: Vec3::ZERO,
            spherical: Spherical::from_offset(Vec3::Z),
            goal_target: Vec3::ZERO,
            goal_spherical: Spherical::from_offset(Vec3::Z),
            smooth_time: cfg.smooth_time,
            min_distance: cfg.min_distance,
            max_distance: cfg.max_distance,
        };
        rig.set_look_at(vec3(cfg.position), vec3(cfg.target), false);
        rig
    }

    pub fn apply_settings(&mut self, cfg: &CameraSettings) {
        self.smooth_time = cfg.smooth_time;
        self.min_distance = cfg.min_distance;
        self.max_distance = cfg.max_distance;
    }

    pub fn eye(&self) -> Vec3 {
        self.target + self.spherical.to_offset()
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        const EPS: f32 = 1e-4;
        self.target.distance(self.goal_target) < EPS
            && (self.spherical.radius - self.goal_spherical.radius).abs() < EPS
            && (self.spherical.polar - self.goal_spherical.polar).abs() < EPS
            && (self.spherical.azimuth - self.goal_spherical.azimuth).abs() < EPS
    }

    /// Advance a smooth transition by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if self.smooth_time <= 0.0 {
            self.target = self.goal_target;
            self.spherical = self.goal_spherical;
            return;
        }
        // reaches ~98% of the way in one smooth_time
        let k = 1.0 - (-4.0 * dt / self.smooth_time).exp();
        self.target = self.target.lerp(self.goal_target, k);
        let (cur, goal) = (&mut self.spherical, self.goal_spherical);
        cur.radius += (goal.radius - cur.radius) * k;
        cur.polar += (goal.polar - cur.polar) * k;
        cur.azimuth += (goal.azimuth - cur.azimuth) * k;
        if self.is_settled() {
            self.target = self.goal_target;
            self.spherical = self.goal_spherical;
        }
    }

    fn right(&self) -> Vec3 {
        let az = self.spherical.azimuth;
        Vec3::new(az.cos(), 0.0, -az.sin())
    }

    fn shift(&mut self, delta: Vec3) {
        self.target += delta;
        self.goal_target += delta;
    }
}

impl CameraRig for OrbitRig {
    fn set_look_at(&mut self, eye: Vec3, target: Vec3, smooth: bool) {
        let mut spherical = Spherical::from_offset(eye - target);
        spherical.radius = spherical.radius.clamp(self.min_distance, self.max_distance);

        // take the short way round
        let turn = 2.0 * PI;
        let current = self.spherical.azimuth;
        spherical.azimuth = current + (spherical.azimuth - current + PI).rem_euclid(turn) - PI;

        self.goal_target = target;
        self.goal_spherical = spherical;
        if !smooth {
            self.target = target;
            self.spherical = spherical;
        }
    }

    fn forward(&mut self, distance: f32) {
        let az = self.spherical.azimuth;
        let ahead = -Vec3::new(az.sin(), 0.0, az.cos());
        self.shift(ahead * distance);
    }

    fn truck(&mut self, x: f32, y: f32) {
        let view = -self.spherical.to_offset().normalize_or_zero();
        let right = self.right();
        let up = right.cross(view).normalize_or_zero();
        self.shift(right * x + up * y);
    }

    fn rotate(&mut self, azimuth: f32, polar: f32) {
        for s in [&mut self.spherical, &mut self.goal_spherical] {
            s.azimuth += azimuth;
            s.polar = (s.polar + polar).clamp(0.0, PI);
        }
    }
}
