//! Visual mount points.

/// Handle to the visual surface a chart is drawn into.
///
/// Two mount points are the same surface when all fields match; a resize
/// therefore counts as a new mount and triggers a re-render.
#[derive(Debug, Clone, PartialEq)]
pub struct MountPoint {
    id: String,
    width: f32,
    height: f32,
}

impl MountPoint {
    /// A new surface with a generated id.
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_id(format!("chart-{}", uuid::Uuid::new_v4()), width, height)
    }

    pub fn with_id(id: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}
