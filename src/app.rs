use crate::config::EditorConfig;
use crate::fs_watcher::WatchWorker;
use crate::ground_height::UNITS_PER_METER;
use crate::preview::{PreviewHandle, PreviewMsg, SceneSnapshot};
use crate::scene::{ObjectKind, SceneObject, SceneState, SidebarSection};
use crate::stats::FrameStats;
use crate::transform_edit::{
    GroundDrag, RotationAxis, footprint, height_above_ground, normalize_angle, set_height,
    set_rotation, set_uniform_scale,
};
use bevy::math::DVec3;
use crossbeam::channel::{Receiver, Sender, unbounded};
use eframe::egui;
use egui::{Color32, Slider};
use std::cmp::Ordering;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

const DEFAULT_ZOOM: f32 = 40.0;

enum ViewportDrag {
    Pan,
    Object { id: String, drag: GroundDrag },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PreviewState {
    NotStarted,
    Running,
    Closed,
}

impl PreviewState {
    fn of(running: Option<bool>) -> Self {
        match running {
            None => PreviewState::NotStarted,
            Some(true) => PreviewState::Running,
            Some(false) => PreviewState::Closed,
        }
    }
}

#[derive(Default)]
struct InspectorAction {
    changed: bool,
    delete: bool,
    close: bool,
}

pub struct EditorApp {
    scene: SceneState,
    config: EditorConfig,
    config_path: PathBuf,
    config_rx: Receiver<PathBuf>,
    _watcher: WatchWorker,
    last_log: String,
    rotation_axis: RotationAxis,

    // Push-based wakeups
    egui_ctx: egui::Context,
    preview: Option<(PreviewHandle, Sender<PreviewMsg>)>,
    preview_dirty: bool,

    // --- viewport (2D top-down view) ---
    view_offset: egui::Vec2, // world-space pan (in metres)
    view_zoom: f32,          // screen pixels per metre
    drag: Option<ViewportDrag>,

    show_debug: bool,
    stats: FrameStats,
    last_frame: Option<Instant>,
}

impl EditorApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: EditorConfig, config_path: PathBuf) -> Self {
        let (tx, config_rx) = unbounded::<PathBuf>();
        let watcher = WatchWorker::start(config_path.clone(), tx);

        Self {
            scene: SceneState::default(),
            config,
            config_path,
            config_rx,
            _watcher: watcher,
            last_log: String::new(),
            rotation_axis: RotationAxis::default(),

            egui_ctx: cc.egui_ctx.clone(),
            preview: None,
            preview_dirty: false,

            view_offset: egui::vec2(0.0, 0.0),
            view_zoom: DEFAULT_ZOOM,
            drag: None,

            show_debug: false,
            stats: FrameStats::default(),
            last_frame: None,
        }
    }

    fn log(&mut self, msg: impl Into<String>) {
        self.last_log = msg.into();
        self.egui_ctx.request_repaint();
    }

    fn add_object(&mut self, kind: ObjectKind) {
        let id = self.scene.add_object(kind);
        self.select(Some(id.as_str()));
        let name = self
            .scene
            .find(&id)
            .map(|o| o.name.clone())
            .unwrap_or_default();
        self.log(format!("added {name}"));
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.scene.selected.clone() else {
            return;
        };
        match self.scene.delete_object(&id) {
            Ok(obj) => self.log(format!("deleted {}", obj.name)),
            Err(e) => self.log(format!("delete failed: {e}")),
        }
        self.preview_dirty = true;
    }

    fn select(&mut self, id: Option<&str>) {
        if let Err(e) = self.scene.select(id) {
            self.log(format!("{e}"));
        }
        self.preview_dirty = true;
    }

    fn reload_config(&mut self) {
        match EditorConfig::load_or_default(&self.config_path) {
            Ok(cfg) => {
                info!(path = %self.config_path.display(), "settings reloaded");
                self.config = cfg;
                self.send_preview(PreviewMsg::Camera(self.config.camera.clone()));
                self.preview_dirty = true;
                self.log("settings reloaded");
            }
            Err(e) => {
                warn!("keeping previous settings: {e}");
                self.log(format!("settings not reloaded: {e}"));
            }
        }
    }

    // ---------- 3D preview ----------

    fn ensure_preview(&mut self) {
        let state = PreviewState::of(self.preview.as_ref().map(|(h, _)| h.is_running()));
        match state {
            PreviewState::NotStarted => {
                let (tx, rx) = unbounded::<PreviewMsg>();
                let handle = PreviewHandle::start(rx, self.config.camera.clone());
                self.preview = Some((handle, tx));
                self.preview_dirty = true;
                self.log("3D preview opened");
            }
            PreviewState::Running => self.log("3D preview is already open"),
            PreviewState::Closed => {
                // one event loop per process
                warn!("3D preview cannot be reopened");
                self.log("3D preview was closed; restart the editor to reopen it");
            }
        }
    }

    fn send_preview(&self, msg: PreviewMsg) {
        if let Some((handle, tx)) = &self.preview {
            if handle.is_running() {
                let _ = tx.send(msg);
            }
        }
    }

    fn push_preview_scene(&mut self) {
        if !self.preview_dirty {
            return;
        }
        self.preview_dirty = false;
        self.send_preview(PreviewMsg::Scene(SceneSnapshot {
            objects: self.scene.objects.clone(),
            selected: self.scene.selected.clone(),
            default_color: self.config.default_color,
        }));
    }

    // ---------- view commands ----------

    fn focus_selected(&mut self) {
        let Some(obj) = self.scene.selected_object() else {
            return;
        };
        let (x, _, z) = obj.transform.world_translation();
        self.view_offset = egui::vec2(x as f32, z as f32);
        // the preview focuses on whatever selection it last received
        self.push_preview_scene();
        self.send_preview(PreviewMsg::Focus);
    }

    fn reset_view(&mut self) {
        self.view_offset = egui::vec2(0.0, 0.0);
        self.view_zoom = DEFAULT_ZOOM;
        self.send_preview(PreviewMsg::ResetView);
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (focus, reset) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::F),
                i.key_pressed(egui::Key::Home) || i.key_pressed(egui::Key::Num0),
            )
        });
        if focus {
            self.focus_selected();
        }
        if reset {
            self.reset_view();
        }
    }

    // ---------- panels ----------

    fn ui_menubar(&mut self, ui: &mut egui::Ui) {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("Scene", |ui| {
                if ui.button("Add Cube").clicked() {
                    self.add_object(ObjectKind::Mesh);
                    ui.close();
                }
                if ui
                    .add_enabled(self.scene.selected.is_some(), egui::Button::new("Delete Selected"))
                    .clicked()
                {
                    self.delete_selected();
                    ui.close();
                }
                if ui.button("Exit").clicked() {
                    ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
            ui.menu_button("View", |ui| {
                if ui.button("Open 3D Preview").clicked() {
                    self.ensure_preview();
                    ui.close();
                }
                if ui.button("Reset View").clicked() {
                    self.reset_view();
                    ui.close();
                }
                if ui.checkbox(&mut self.show_debug, "Debug Tools").clicked() {
                    ui.close();
                }
            });

            ui.separator();
            ui.add(
                egui::TextEdit::singleline(&mut self.scene.title)
                    .desired_width(220.0)
                    .hint_text("Simulation title"),
            );
        });
    }

    fn ui_left_sidebar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for (section, label) in [
                (SidebarSection::Add, "Add"),
                (SidebarSection::Objects, "Objects"),
                (SidebarSection::Steps, "Steps"),
            ] {
                let active = self.scene.active_tab == Some(section);
                if ui.selectable_label(active, label).clicked() {
                    self.scene.toggle_tab(section);
                }
            }
        });
        ui.separator();

        let Some(tab) = self.scene.active_tab else {
            ui.small("Pick a section above.");
            return;
        };
        ui.horizontal(|ui| {
            ui.heading(tab.title());
            if ui.small_button("«").on_hover_text("Minimize Sidebar").clicked() {
                self.scene.close_tab();
            }
        });
        ui.separator();

        match tab {
            SidebarSection::Add => {
                for kind in ObjectKind::ALL {
                    if ui.button(format!("+ {}", kind.label())).clicked() {
                        self.add_object(kind);
                    }
                }
                ui.separator();
                ui.small("No recent assets");
            }
            SidebarSection::Objects => {
                if self.scene.objects.is_empty() {
                    ui.label("No objects in scene");
                    if ui.link("Add objects from the Library").clicked() {
                        self.scene.active_tab = Some(SidebarSection::Add);
                    }
                    return;
                }
                let mut clicked: Option<String> = None;
                for obj in &self.scene.objects {
                    let selected = self.scene.selected.as_deref() == Some(obj.id.as_str());
                    let text = format!("{}  ({})", obj.name, obj.kind.label());
                    if ui.selectable_label(selected, text).clicked() {
                        clicked = Some(obj.id.clone());
                    }
                }
                if let Some(id) = clicked {
                    self.select(Some(id.as_str()));
                    self.focus_selected();
                }
            }
            SidebarSection::Steps => {
                if self.scene.steps.is_empty() {
                    ui.small("No steps yet.");
                }
                for (i, step) in self.scene.steps.iter().enumerate() {
                    ui.group(|ui| {
                        let mark = if step.completed { "✔" } else { " " };
                        ui.label(format!("{mark} {}. {}", i + 1, step.title));
                        ui.small(&step.description);
                    });
                }
            }
            SidebarSection::Scenes => {
                ui.small("Scenes are not available yet.");
            }
        }
    }

    fn ui_debug_window(&mut self, ctx: &egui::Context) {
        let mut add_cube = false;
        let report = self.stats.latest();
        egui::Window::new("Debug Tools")
            .open(&mut self.show_debug)
            .resizable(false)
            .show(ctx, |ui| {
                ui.small("ADD OBJECTS");
                if ui.button("Add Cube").clicked() {
                    add_cube = true;
                }
                ui.separator();
                match report {
                    Some(r) => {
                        ui.monospace(format!("{:.0} fps", r.fps));
                        ui.monospace(format!("{:.2} ms / frame", r.frame_time_ms));
                    }
                    None => {
                        ui.small("collecting frame times…");
                    }
                }
            });
        if add_cube {
            self.add_object(ObjectKind::Mesh);
        }
        if self.show_debug {
            // keep frame stats moving while the readout is visible
            ctx.request_repaint();
        }
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        if let Some(prev) = self.last_frame.replace(now) {
            self.stats
                .record(now.duration_since(prev).as_secs_f64() * 1000.0);
        }

        // settings hot-reload
        let mut changed = false;
        while self.config_rx.try_recv().is_ok() {
            changed = true;
        }
        if changed {
            self.reload_config();
        }

        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("menubar").show(ctx, |ui| self.ui_menubar(ui));

        egui::TopBottomPanel::bottom("status")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(format!("{} objects", self.scene.objects.len()));
                    ui.separator();
                    ui.label(&self.last_log);
                });
            });

        egui::SidePanel::left("sidebar")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| self.ui_left_sidebar(ui));

        if self.scene.selected.is_some() {
            egui::SidePanel::right("inspector")
                .resizable(true)
                .default_width(320.0)
                .show(ctx, |ui| {
                    ui.heading("Object Details");
                    ui.separator();

                    let mut action = InspectorAction::default();
                    if let Some(obj) = self.scene.selected_object_mut() {
                        action = draw_inspector(ui, obj, &mut self.rotation_axis, &self.config);
                    }

                    if action.changed {
                        self.preview_dirty = true;
                    }
                    if action.delete {
                        self.delete_selected();
                    } else if action.close {
                        self.select(None);
                    }
                });
        }

        if self.show_debug {
            self.ui_debug_window(ctx);
        }

        // --- Main viewport (top-down scene view) ---
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Viewport");
                ui.separator();
                if ui.button("Reset View").on_hover_text("Home / 0").clicked() {
                    self.reset_view();
                }
                ui.small("drag empty space to pan · scroll to zoom · F to focus");
            });
            ui.separator();

            let changed = draw_scene_view(
                ui,
                &mut self.scene,
                &mut self.drag,
                &mut self.view_offset,
                &mut self.view_zoom,
                self.config.default_color,
            );
            if changed {
                self.preview_dirty = true;
            }
        });

        self.push_preview_scene();
    }
}

// ================== Inspector ==================

fn draw_inspector(
    ui: &mut egui::Ui,
    obj: &mut SceneObject,
    axis: &mut RotationAxis,
    cfg: &EditorConfig,
) -> InspectorAction {
    let mut action = InspectorAction::default();

    ui.small(format!("Type: {}", obj.kind.label()));
    ui.horizontal(|ui| {
        ui.label("Name");
        action.changed |= ui.text_edit_singleline(&mut obj.name).changed();
        let label = if obj.properties.visible { "Hide" } else { "Show" };
        if ui.button(label).on_hover_text("Toggle Visibility").clicked() {
            obj.properties.visible = !obj.properties.visible;
            action.changed = true;
        }
    });
    ui.horizontal(|ui| {
        ui.label("Color");
        let mut rgb = obj.properties.color.unwrap_or(cfg.default_color);
        if ui.color_edit_button_srgb(&mut rgb).changed() {
            obj.properties.color = Some(rgb);
            action.changed = true;
        }
        if obj.properties.color.is_some() && ui.small_button("Default").clicked() {
            obj.properties.color = None;
            action.changed = true;
        }
    });
    ui.separator();

    // height above ground, shown in metres
    let mut height_m = height_above_ground(&obj.transform) / UNITS_PER_METER;
    let max_m = cfg.height_max / UNITS_PER_METER;
    if ui
        .add(
            Slider::new(&mut height_m, 0.0..=max_m)
                .text("Height")
                .suffix(" m")
                .max_decimals(2),
        )
        .changed()
    {
        set_height(&mut obj.transform, height_m * UNITS_PER_METER);
        action.changed = true;
    }

    let mut scale = obj.transform.scale_x;
    let (lo, hi) = cfg.scale_range;
    if ui
        .add(
            Slider::new(&mut scale, lo..=hi)
                .step_by(cfg.scale_step)
                .text("Scale")
                .suffix("x"),
        )
        .changed()
    {
        set_uniform_scale(&mut obj.transform, scale);
        action.changed = true;
    }
    ui.separator();

    ui.horizontal(|ui| {
        ui.label("Rotation");
        for a in RotationAxis::ALL {
            ui.selectable_value(axis, a, a.label());
        }
    });
    let mut degrees = normalize_angle(axis.get(&obj.transform));
    if ui
        .add(
            Slider::new(&mut degrees, -180.0..=180.0)
                .step_by(1.0)
                .suffix("°"),
        )
        .changed()
    {
        set_rotation(&mut obj.transform, *axis, degrees);
        action.changed = true;
    }
    ui.separator();

    let t = &obj.transform;
    ui.monospace(format!("pos  {:>7.0} {:>7.0} {:>7.0}", t.x, t.y, t.z));
    ui.separator();

    ui.horizontal(|ui| {
        if ui.button("Delete").clicked() {
            action.delete = true;
        }
        if ui.button("Close").clicked() {
            action.close = true;
        }
    });

    action
}

// ================== 2D top-down view (egui painter) ==================

struct DrawCmd {
    min: egui::Vec2, // world xz
    max: egui::Vec2,
    center: egui::Vec2,
    color: Color32,
    height_y: f64,
    selected: bool,
    name: String,
}

fn gather_draw_cmds(scene: &SceneState, default_color: [u8; 3]) -> Vec<DrawCmd> {
    scene
        .visible_objects()
        .map(|obj| {
            let (min, max) = footprint(&obj.transform);
            let (x, _, z) = obj.transform.world_translation();
            let [r, g, b] = obj.properties.color.unwrap_or(default_color);
            DrawCmd {
                min: egui::vec2(min.x as f32, min.y as f32),
                max: egui::vec2(max.x as f32, max.y as f32),
                center: egui::vec2(x as f32, z as f32),
                color: Color32::from_rgb(r, g, b),
                height_y: obj.transform.y,
                selected: scene.selected.as_deref() == Some(obj.id.as_str()),
                name: obj.name.clone(),
            }
        })
        .collect()
}

/// Topmost visible object whose footprint contains `world`.
fn pick(scene: &SceneState, world: egui::Vec2) -> Option<&SceneObject> {
    scene
        .visible_objects()
        .filter(|obj| {
            let (min, max) = footprint(&obj.transform);
            let (x, z) = (world.x as f64, world.y as f64);
            x >= min.x && x <= max.x && z >= min.y && z <= max.y
        })
        .max_by(|a, b| {
            a.transform
                .y
                .partial_cmp(&b.transform.y)
                .unwrap_or(Ordering::Equal)
        })
}

fn select_or_warn(scene: &mut SceneState, id: Option<&str>) {
    if let Err(e) = scene.select(id) {
        warn!("viewport selection ignored: {e}");
    }
}

/// Select the topmost object under `world`, or clear the selection when
/// nothing is hit.
fn select_at(scene: &mut SceneState, world: Option<egui::Vec2>) {
    let hit = world.and_then(|w| pick(scene, w).map(|o| o.id.clone()));
    select_or_warn(scene, hit.as_deref());
}

/// Returns true when the selection changed or an object moved.
fn draw_scene_view(
    ui: &mut egui::Ui,
    scene: &mut SceneState,
    drag: &mut Option<ViewportDrag>,
    view_offset: &mut egui::Vec2,
    view_zoom: &mut f32,
    default_color: [u8; 3],
) -> bool {
    let mut changed = false;

    let avail = ui.available_size();
    let (response, painter) = ui.allocate_painter(avail, egui::Sense::click_and_drag());
    let rect = response.rect;

    // Mouse wheel zoom around the cursor
    if response.hovered() {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 {
            let zoom_factor = (1.0 + scroll * 0.001).clamp(0.5, 4.0);
            let old_zoom = *view_zoom;
            let new_zoom = (old_zoom * zoom_factor).clamp(10.0, 400.0);

            if let Some(mp) = ui.input(|i| i.pointer.hover_pos()) {
                let world_before = screen_to_world(mp, rect, *view_offset, old_zoom);
                let world_after = screen_to_world(mp, rect, *view_offset, new_zoom);
                *view_offset += world_before - world_after;
            }
            *view_zoom = new_zoom;
        }
    }

    if response.clicked() {
        let world = response
            .interact_pointer_pos()
            .map(|p| screen_to_world(p, rect, *view_offset, *view_zoom));
        select_at(scene, world);
        changed = true;
    }

    if response.drag_started() {
        *drag = Some(ViewportDrag::Pan);
        if let Some(p) = response.interact_pointer_pos() {
            let world = screen_to_world(p, rect, *view_offset, *view_zoom);
            if let Some(obj) = pick(scene, world) {
                let (_, y, _) = obj.transform.world_translation();
                let hit = DVec3::new(world.x as f64, y, world.y as f64);
                let id = obj.id.clone();
                *drag = Some(ViewportDrag::Object {
                    drag: GroundDrag::begin(hit, &obj.transform),
                    id: id.clone(),
                });
                select_or_warn(scene, Some(id.as_str()));
                changed = true;
            }
        }
    }

    if response.dragged() {
        match drag {
            Some(ViewportDrag::Object { id, drag }) => {
                if let Some(p) = response.interact_pointer_pos() {
                    let world = screen_to_world(p, rect, *view_offset, *view_zoom);
                    if let Some(obj) = scene.find_mut(id) {
                        let (_, y, _) = obj.transform.world_translation();
                        drag.apply(
                            DVec3::new(world.x as f64, y, world.y as f64),
                            &mut obj.transform,
                        );
                        changed = true;
                    }
                }
            }
            _ => {
                *view_offset -= response.drag_delta() / *view_zoom;
            }
        }
    }

    if response.drag_stopped() {
        *drag = None;
    }

    painter.rect_filled(rect, 0.0, ui.visuals().extreme_bg_color);
    draw_grid(
        &painter,
        rect,
        *view_offset,
        *view_zoom,
        ui.visuals().weak_text_color(),
    );

    let mut cmds = gather_draw_cmds(scene, default_color);
    // higher objects draw on top
    cmds.sort_by(|a, b| {
        a.height_y
            .partial_cmp(&b.height_y)
            .unwrap_or(Ordering::Equal)
    });

    let outline = ui.visuals().widgets.noninteractive.fg_stroke.color;
    for cmd in cmds {
        let p0 = world_to_screen(cmd.min, rect, *view_offset, *view_zoom);
        let p1 = world_to_screen(cmd.max, rect, *view_offset, *view_zoom);
        let r = egui::Rect::from_two_pos(p0, p1);
        painter.rect_filled(r, 2.0, cmd.color);
        let stroke = if cmd.selected {
            egui::Stroke::new(2.5, Color32::from_rgb(0x3b, 0x82, 0xf6))
        } else {
            egui::Stroke::new(1.0, outline)
        };
        painter.rect_stroke(r, 2.0, stroke, egui::StrokeKind::Outside);
        painter.text(
            world_to_screen(cmd.center, rect, *view_offset, *view_zoom),
            egui::Align2::CENTER_CENTER,
            &cmd.name,
            egui::FontId::proportional(11.0),
            Color32::WHITE,
        );
    }

    changed
}

fn world_to_screen(
    world_xz: egui::Vec2,
    rect: egui::Rect,
    offset_world: egui::Vec2,
    zoom: f32,
) -> egui::Pos2 {
    // origin is centered; +x right, +z down (screen y grows downward)
    let centered = (world_xz - offset_world) * zoom;
    rect.center() + centered
}

fn screen_to_world(
    pos: egui::Pos2,
    rect: egui::Rect,
    offset_world: egui::Vec2,
    zoom: f32,
) -> egui::Vec2 {
    (pos - rect.center()) / zoom + offset_world
}

fn draw_grid(
    painter: &egui::Painter,
    rect: egui::Rect,
    offset_world: egui::Vec2,
    zoom: f32,
    color: Color32,
) {
    // one line per metre, bold every five
    let spacing_px = zoom;
    if spacing_px < 8.0 {
        return; // too dense, skip
    }

    let top_left = screen_to_world(rect.left_top(), rect, offset_world, zoom);
    let bottom_right = screen_to_world(rect.right_bottom(), rect, offset_world, zoom);

    let thin = egui::Stroke::new(1.0, color.linear_multiply(0.25));
    let bold = egui::Stroke::new(1.5, color.linear_multiply(0.6));

    for ix in (top_left.x.floor() as i32)..=(bottom_right.x.ceil() as i32) {
        let sx = world_to_screen(egui::vec2(ix as f32, 0.0), rect, offset_world, zoom).x;
        let stroke = if ix % 5 == 0 { bold } else { thin };
        painter.line_segment(
            [egui::pos2(sx, rect.top()), egui::pos2(sx, rect.bottom())],
            stroke,
        );
    }
    for iz in (top_left.y.floor() as i32)..=(bottom_right.y.ceil() as i32) {
        let sy = world_to_screen(egui::vec2(0.0, iz as f32), rect, offset_world, zoom).y;
        let stroke = if iz % 5 == 0 { bold } else { thin };
        painter.line_segment(
            [egui::pos2(rect.left(), sy), egui::pos2(rect.right(), sy)],
            stroke,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    #[test]
    fn screen_and_world_round_trip() {
        let offset = egui::vec2(2.0, -1.0);
        let world = egui::vec2(3.5, 0.25);
        let screen = world_to_screen(world, rect(), offset, 40.0);
        let back = screen_to_world(screen, rect(), offset, 40.0);
        assert!((back - world).length() < 1e-4);
        assert_eq!(
            world_to_screen(offset, rect(), offset, 40.0),
            rect().center()
        );
    }

    #[test]
    fn picking_prefers_the_highest_object() {
        let mut scene = SceneState::default();
        let low = scene.add_object(ObjectKind::Mesh);
        let high = scene.add_object(ObjectKind::Mesh);
        set_height(&mut scene.find_mut(&high).unwrap().transform, 200.0);

        let hit = pick(&scene, egui::vec2(0.1, 0.1)).map(|o| o.id.clone());
        assert_eq!(hit.as_deref(), Some(high.as_str()));

        scene.find_mut(&high).unwrap().properties.visible = false;
        let hit = pick(&scene, egui::vec2(0.1, 0.1)).map(|o| o.id.clone());
        assert_eq!(hit.as_deref(), Some(low.as_str()));

        assert!(pick(&scene, egui::vec2(3.0, 3.0)).is_none());
    }

    #[test]
    fn preview_starts_only_once() {
        assert_eq!(PreviewState::of(None), PreviewState::NotStarted);
        assert_eq!(PreviewState::of(Some(true)), PreviewState::Running);
        assert_eq!(PreviewState::of(Some(false)), PreviewState::Closed);
    }

    #[test]
    fn clicking_selects_the_object_under_the_pointer() {
        let mut scene = SceneState::default();
        let id = scene.add_object(ObjectKind::Mesh);

        select_at(&mut scene, Some(egui::vec2(0.2, -0.2)));
        assert_eq!(scene.selected.as_deref(), Some(id.as_str()));

        select_at(&mut scene, Some(egui::vec2(4.0, 4.0)));
        assert!(scene.selected.is_none());

        select_or_warn(&mut scene, Some(id.as_str()));
        select_at(&mut scene, None);
        assert!(scene.selected.is_none());
    }

    #[test]
    fn unknown_ids_keep_the_current_selection() {
        let mut scene = SceneState::default();
        let id = scene.add_object(ObjectKind::Mesh);
        select_or_warn(&mut scene, Some(id.as_str()));

        select_or_warn(&mut scene, Some("missing"));
        assert_eq!(scene.selected.as_deref(), Some(id.as_str()));
    }

    #[test]
    fn draw_commands_skip_hidden_objects_and_mark_selection() {
        let mut scene = SceneState::default();
        let a = scene.add_object(ObjectKind::Mesh);
        let b = scene.add_object(ObjectKind::Zone);
        scene.find_mut(&b).unwrap().properties.visible = false;
        scene.select(Some(a.as_str())).unwrap();

        let cmds = gather_draw_cmds(&scene, [1, 2, 3]);
        assert_eq!(cmds.len(), 1);
        assert!(cmds[0].selected);
        assert_eq!(cmds[0].color, Color32::from_rgb(1, 2, 3));
        assert!((cmds[0].max - egui::vec2(0.5, 0.5)).length() < 1e-6);
    }
}
