//! Default interaction set.
//!
//! Builds the engine's stock interactions, selected by a set of named toggles.
//! The resulting container is what a map starts with when no explicit
//! interaction list is supplied.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{BaseObject, EngineRef, ObjectCollection};

/// Toggles selecting which built-in interactions to include.
///
/// Every toggle defaults to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultInteractions {
    pub alt_shift_drag_rotate: bool,
    pub double_click_zoom: bool,
    pub drag_pan: bool,
    pub pinch_rotate: bool,
    pub pinch_zoom: bool,
    pub keyboard: bool,
    pub mouse_wheel_zoom: bool,
    pub shift_drag_zoom: bool,
}

impl Default for DefaultInteractions {
    fn default() -> Self {
        Self {
            alt_shift_drag_rotate: true,
            double_click_zoom: true,
            drag_pan: true,
            pinch_rotate: true,
            pinch_zoom: true,
            keyboard: true,
            mouse_wheel_zoom: true,
            shift_drag_zoom: true,
        }
    }
}

impl DefaultInteractions {
    /// All toggles off.
    pub fn none() -> Self {
        Self {
            alt_shift_drag_rotate: false,
            double_click_zoom: false,
            drag_pan: false,
            pinch_rotate: false,
            pinch_zoom: false,
            keyboard: false,
            mouse_wheel_zoom: false,
            shift_drag_zoom: false,
        }
    }

    /// Names of the interactions these toggles select, in creation order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.alt_shift_drag_rotate {
            names.push("DragRotate");
        }
        if self.double_click_zoom {
            names.push("DoubleClickZoom");
        }
        if self.drag_pan {
            names.push("DragPan");
        }
        if self.pinch_rotate {
            names.push("PinchRotate");
        }
        if self.pinch_zoom {
            names.push("PinchZoom");
        }
        if self.keyboard {
            names.extend(["KeyboardPan", "KeyboardZoom"]);
        }
        if self.mouse_wheel_zoom {
            names.push("MouseWheelZoom");
        }
        if self.shift_drag_zoom {
            names.push("DragZoom");
        }
        names
    }
}

/// Create the default interaction set selected by `options`.
///
/// Objects are created without identity or priority; admission into a managed
/// collection assigns both.
pub fn create_default_interactions(options: &DefaultInteractions) -> ObjectCollection {
    let objects: Vec<EngineRef> = options
        .names()
        .into_iter()
        .map(|name| Arc::new(BaseObject::interaction(name)) as EngineRef)
        .collect();
    ObjectCollection::from_vec(objects)
}
