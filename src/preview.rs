use bevy::prelude::*;
use crossbeam::channel::Receiver;
use std::thread;
use tracing::info;

use crate::config::CameraSettings;
use crate::ground_height::euler_rotation;
use crate::navigation::{self, HeldKeys, NavKey, OrbitRig};
use crate::scene::{self, SceneObject};

/// What the editor pushes to the 3D window.
#[derive(Debug, Clone)]
pub enum PreviewMsg {
    Scene(SceneSnapshot),
    Focus,
    ResetView,
    Camera(CameraSettings),
}

#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    pub objects: Vec<SceneObject>,
    pub selected: Option<String>,
    pub default_color: [u8; 3],
}

#[derive(Component)]
struct PreviewTag; // mark spawned scene entities so we can clear/rebuild

#[derive(Component)]
struct PreviewCamera;

#[derive(Resource)]
struct PreviewRx(Receiver<PreviewMsg>);

#[derive(Resource)]
struct UnitBox(Handle<Mesh>);

#[derive(Resource)]
struct Rig {
    rig: OrbitRig,
    settings: CameraSettings,
    held: HeldKeys,
}

/// Transform of the selected object, for focus and highlighting.
#[derive(Resource, Default)]
struct Selection(Option<scene::Transform>);

pub struct PreviewHandle {
    thread: thread::JoinHandle<()>,
}

impl PreviewHandle {
    /// Spawn a Bevy window in a background thread and return a handle.
    pub fn start(rx: Receiver<PreviewMsg>, camera: CameraSettings) -> Self {
        let th = thread::spawn(move || {
            let mut app = App::new();

            app.add_plugins(DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Facilitate Studio - 3D Preview".into(),
                    resolution: (960., 540.).into(),
                    present_mode: bevy::window::PresentMode::AutoVsync,
                    ..default()
                }),
                ..default()
            }));

            app.insert_resource(PreviewRx(rx))
                .insert_resource(Rig {
                    rig: OrbitRig::new(&camera),
                    settings: camera,
                    held: HeldKeys::default(),
                })
                .init_resource::<Selection>()
                .insert_resource(ClearColor(Color::srgb_u8(0xf1, 0xf5, 0xf9)));

            app.add_systems(Startup, setup).add_systems(
                Update,
                (
                    apply_preview_msgs,
                    keyboard_navigation,
                    sync_camera,
                    draw_ground_and_selection,
                )
                    .chain(),
            );

            info!("3D preview started");
            app.run();
            info!("3D preview closed");
        });

        Self { thread: th }
    }

    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }
}

/// Render transform for an editor object. Shares the XYZ rotation with the
/// height math.
pub fn render_transform(t: &scene::Transform) -> Transform {
    let (x, y, z) = t.world_translation();
    let (sx, sy, sz) = t.scale();
    Transform::from_translation(Vec3::new(x as f32, y as f32, z as f32))
        .with_rotation(euler_rotation(t.rotation_x, t.rotation_y, t.rotation_z).as_quat())
        .with_scale(Vec3::new(sx as f32, sy as f32, sz as f32))
}

fn setup(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>, rig: Res<Rig>) {
    commands.insert_resource(UnitBox(meshes.add(Cuboid::new(1.0, 1.0, 1.0))));
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 700.0,
        ..default()
    });

    commands.spawn((
        Camera3d::default(),
        PreviewCamera,
        Transform::from_translation(rig.rig.eye()).looking_at(rig.rig.target(), Vec3::Y),
    ));
    commands.spawn((
        PointLight {
            shadows_enabled: true,
            intensity: 2_000_000.0,
            range: 60.0,
            ..default()
        },
        Transform::from_xyz(10.0, 10.0, 10.0),
    ));
    commands.spawn((
        DirectionalLight {
            illuminance: 3_000.0,
            ..default()
        },
        Transform::from_xyz(-10.0, 15.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn apply_preview_msgs(
    mut commands: Commands,
    rx: Res<PreviewRx>,
    unit_box: Res<UnitBox>,
    mut rig: ResMut<Rig>,
    mut selection: ResMut<Selection>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    existing: Query<Entity, With<PreviewTag>>,
) {
    let Some(snap) = drain_msgs(rx.0.try_iter(), &mut *rig, &mut *selection) else {
        return;
    };

    for e in &existing {
        commands.entity(e).despawn();
    }

    for obj in snap.objects.iter().filter(|o| o.properties.visible) {
        let [r, g, b] = obj.properties.color.unwrap_or(snap.default_color);
        let material = materials.add(StandardMaterial {
            base_color: Color::srgb_u8(r, g, b),
            perceptual_roughness: 0.2,
            metallic: 0.1,
            ..default()
        });
        commands.spawn((
            PreviewTag,
            Name::new(obj.name.clone()),
            Mesh3d(unit_box.0.clone()),
            MeshMaterial3d(material),
            render_transform(&obj.transform),
        ));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewCmd {
    Focus,
    Reset,
}

/// Apply a batch of editor messages and return the newest scene snapshot.
/// Focus and reset run after the batch, against the newest selection, and
/// the later of the two wins.
fn drain_msgs(
    msgs: impl IntoIterator<Item = PreviewMsg>,
    rig: &mut Rig,
    selection: &mut Selection,
) -> Option<SceneSnapshot> {
    let mut latest: Option<SceneSnapshot> = None;
    let mut view: Option<ViewCmd> = None;
    for msg in msgs {
        match msg {
            PreviewMsg::Scene(snap) => {
                selection.0 = snap
                    .selected
                    .as_deref()
                    .and_then(|id| snap.objects.iter().find(|o| o.id == id))
                    .map(|o| o.transform);
                latest = Some(snap);
            }
            PreviewMsg::Focus => view = Some(ViewCmd::Focus),
            PreviewMsg::ResetView => view = Some(ViewCmd::Reset),
            PreviewMsg::Camera(settings) => {
                rig.rig.apply_settings(&settings);
                rig.settings = settings;
            }
        }
    }

    let Rig { rig, settings, .. } = rig;
    match view {
        Some(ViewCmd::Focus) => {
            navigation::on_key_pressed(rig, NavKey::F, selection.0.as_ref(), settings);
        }
        Some(ViewCmd::Reset) => navigation::reset_view(rig, settings),
        None => {}
    }
    latest
}

fn nav_key(code: KeyCode) -> Option<NavKey> {
    Some(match code {
        KeyCode::KeyW => NavKey::W,
        KeyCode::KeyA => NavKey::A,
        KeyCode::KeyS => NavKey::S,
        KeyCode::KeyD => NavKey::D,
        KeyCode::ArrowUp => NavKey::ArrowUp,
        KeyCode::ArrowDown => NavKey::ArrowDown,
        KeyCode::ArrowLeft => NavKey::ArrowLeft,
        KeyCode::ArrowRight => NavKey::ArrowRight,
        KeyCode::KeyQ => NavKey::Q,
        KeyCode::KeyE => NavKey::E,
        KeyCode::KeyF => NavKey::F,
        KeyCode::Home => NavKey::Home,
        KeyCode::Digit0 => NavKey::Digit0,
        _ => return None,
    })
}

fn keyboard_navigation(
    keys: Res<ButtonInput<KeyCode>>,
    selection: Res<Selection>,
    mut rig: ResMut<Rig>,
) {
    let Rig {
        rig,
        settings,
        held,
    } = &mut *rig;

    for code in keys.get_just_pressed() {
        if let Some(key) = nav_key(*code) {
            held.press(key);
            navigation::on_key_pressed(rig, key, selection.0.as_ref(), settings);
        }
    }
    for code in keys.get_just_released() {
        if let Some(key) = nav_key(*code) {
            held.release(key);
        }
    }

    navigation::apply_held_keys(rig, held, settings);
}

fn sync_camera(
    time: Res<Time>,
    mut rig: ResMut<Rig>,
    mut camera: Query<&mut Transform, With<PreviewCamera>>,
) {
    rig.rig.tick(time.delta_secs());
    for mut t in &mut camera {
        *t = Transform::from_translation(rig.rig.eye()).looking_at(rig.rig.target(), Vec3::Y);
    }
}

fn draw_ground_and_selection(mut gizmos: Gizmos, selection: Res<Selection>) {
    const HALF: i32 = 20;
    let cell = Color::srgba(0.80, 0.84, 0.88, 0.8);
    let section = Color::srgb(0.58, 0.64, 0.72);

    for i in -HALF..=HALF {
        let color = if i % 5 == 0 { section } else { cell };
        let f = i as f32;
        let h = HALF as f32;
        gizmos.line(Vec3::new(f, 0.0, -h), Vec3::new(f, 0.0, h), color);
        gizmos.line(Vec3::new(-h, 0.0, f), Vec3::new(h, 0.0, f), color);
    }

    if let Some(t) = &selection.0 {
        let mut outline = render_transform(t);
        outline.scale *= 1.1;
        gizmos.cuboid(outline, Color::srgb(0.23, 0.51, 0.96));
    }
}
