//! Facilitate Studio: a small 3D scene editor for training simulations.
//!
//! Objects are unit boxes positioned in centi-units. The editor speaks in
//! height above ground, and [`ground_height`] converts that to and from the
//! centre Y the renderer uses.

pub mod app;
pub mod config;
pub mod fs_watcher;
pub mod ground_height;
pub mod navigation;
pub mod preview;
pub mod scene;
pub mod stats;
pub mod transform_edit;

pub use ground_height::{calculate_lowest_point_offset, height_to_y_position, y_position_to_height};
