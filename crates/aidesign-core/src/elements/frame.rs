//! Frame containers.

use super::SerializableColor;
use serde::{Deserialize, Serialize};

/// A rectangular container that clips its children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameData {
    /// Label shown above the frame.
    pub name: String,
    pub fill: SerializableColor,
    pub stroke: Option<SerializableColor>,
    /// Set by collaborators while content is being generated into the frame.
    #[serde(default)]
    pub loading: bool,
}

impl FrameData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fill: SerializableColor::white(),
            stroke: Some(SerializableColor::new(0xd0, 0xd0, 0xd0, 0xff)),
            loading: false,
        }
    }
}

impl Default for FrameData {
    fn default() -> Self {
        Self::new("Frame")
    }
}
