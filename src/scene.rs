use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::ground_height::UNITS_PER_METER;
use crate::transform_edit::set_height;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("no object with id {0}")]
    UnknownObject(String),
}

/// Position is in centi-units with z pointing towards the viewer (the
/// renderer's z is the negation). Rotation is XYZ Euler in degrees.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rotation_x: f64,
    pub rotation_y: f64,
    pub rotation_z: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub scale_z: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            rotation_x: 0.0,
            rotation_y: 0.0,
            rotation_z: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            scale_z: 1.0,
        }
    }
}

impl Transform {
    /// Position in renderer space (metres, z flipped).
    pub fn world_translation(&self) -> (f64, f64, f64) {
        (
            self.x / UNITS_PER_METER,
            self.y / UNITS_PER_METER,
            -self.z / UNITS_PER_METER,
        )
    }

    pub fn rotation_radians(&self) -> (f64, f64, f64) {
        (
            self.rotation_x.to_radians(),
            self.rotation_y.to_radians(),
            self.rotation_z.to_radians(),
        )
    }

    pub fn scale(&self) -> (f64, f64, f64) {
        (self.scale_x, self.scale_y, self.scale_z)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Mesh,
    Light,
    Camera,
    Zone,
    TextPopup,
    Wire,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 6] = [
        ObjectKind::Mesh,
        ObjectKind::Light,
        ObjectKind::Camera,
        ObjectKind::Zone,
        ObjectKind::TextPopup,
        ObjectKind::Wire,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::Mesh => "Cube",
            ObjectKind::Light => "Light",
            ObjectKind::Camera => "Camera",
            ObjectKind::Zone => "Zone",
            ObjectKind::TextPopup => "Text Popup",
            ObjectKind::Wire => "Wire",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ObjectProperties {
    pub visible: bool,
    #[serde(default)]
    pub grabbable: bool,
    #[serde(default)]
    pub has_gravity: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub color: Option<[u8; 3]>,
}

impl Default for ObjectProperties {
    fn default() -> Self {
        Self {
            visible: true,
            grabbable: false,
            has_gravity: false,
            locked: false,
            color: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SceneObject {
    pub id: String,
    pub name: String,
    pub kind: ObjectKind,
    pub transform: Transform,
    pub properties: ObjectProperties,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SimStep {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SidebarSection {
    Add,
    Steps,
    Scenes,
    Objects,
}

impl SidebarSection {
    pub fn title(self) -> &'static str {
        match self {
            SidebarSection::Add => "Library",
            SidebarSection::Steps => "Training Flow",
            SidebarSection::Scenes => "Scenes",
            SidebarSection::Objects => "Scene Objects",
        }
    }
}

/// Everything the editor panels share: the flat object list, the selection
/// and which sidebar tab is open.
#[derive(Debug, Clone)]
pub struct SceneState {
    pub title: String,
    pub objects: Vec<SceneObject>,
    pub steps: Vec<SimStep>,
    pub selected: Option<String>,
    pub active_tab: Option<SidebarSection>,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            title: "New Simulation".into(),
            objects: Vec::new(),
            steps: Vec::new(),
            selected: None,
            active_tab: None,
        }
    }
}

impl SceneState {
    /// Add a unit box of `kind` at the origin, resting on the ground.
    pub fn add_object(&mut self, kind: ObjectKind) -> String {
        let n = self.objects.iter().filter(|o| o.kind == kind).count() + 1;
        let mut transform = Transform::default();
        set_height(&mut transform, 0.0);

        let obj = SceneObject {
            id: Uuid::new_v4().to_string(),
            name: format!("{} {n}", kind.label()),
            kind,
            transform,
            properties: ObjectProperties::default(),
        };
        let id = obj.id.clone();
        info!(id = %id, name = %obj.name, "object added");
        self.objects.push(obj);
        id
    }

    pub fn find(&self, id: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn update_object(&mut self, updated: SceneObject) -> Result<(), SceneError> {
        let slot = self
            .find_mut(&updated.id)
            .ok_or_else(|| SceneError::UnknownObject(updated.id.clone()))?;
        *slot = updated;
        Ok(())
    }

    pub fn delete_object(&mut self, id: &str) -> Result<SceneObject, SceneError> {
        let idx = self
            .objects
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| SceneError::UnknownObject(id.to_string()))?;
        let removed = self.objects.remove(idx);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        info!(id = %id, name = %removed.name, "object deleted");
        Ok(removed)
    }

    pub fn select(&mut self, id: Option<&str>) -> Result<(), SceneError> {
        match id {
            Some(id) if self.find(id).is_none() => Err(SceneError::UnknownObject(id.to_string())),
            _ => {
                self.selected = id.map(str::to_string);
                debug!(selected = ?self.selected, "selection changed");
                Ok(())
            }
        }
    }

    pub fn selected_object(&self) -> Option<&SceneObject> {
        self.selected.as_deref().and_then(|id| self.find(id))
    }

    pub fn selected_object_mut(&mut self) -> Option<&mut SceneObject> {
        let id = self.selected.clone()?;
        self.find_mut(&id)
    }

    /// Open `section`, or close the sidebar if it is already showing it.
    pub fn toggle_tab(&mut self, section: SidebarSection) {
        self.active_tab = if self.active_tab == Some(section) {
            None
        } else {
            Some(section)
        };
    }

    pub fn close_tab(&mut self) {
        self.active_tab = None;
    }

    pub fn visible_objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.properties.visible)
    }
}
