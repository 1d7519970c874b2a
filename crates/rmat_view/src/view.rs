//! View catalog entries and the named groups that arrange them.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewError};

/// Name of the group shown when nothing else was chosen.
pub const DEFAULT_GROUP: &str = "default";

/// Kind of content a view displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewKind {
    /// Rendered raster of the image (band combination chosen by the backend)
    Image,
    /// Opaque external map embed, addressed only by size and location
    #[serde(alias = "bingmap")]
    ExternalMap,
}

/// One named way of looking at the current image. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: ViewKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_kind() -> ViewKind {
    ViewKind::Image
}

impl View {
    pub fn new(name: &str, kind: ViewKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn is_image(&self) -> bool {
        self.kind == ViewKind::Image
    }
}

/// Ordered list of view names shown side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewGroup {
    pub name: String,
    pub views: Vec<String>,
}

impl ViewGroup {
    pub fn new(name: &str, views: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            views,
        }
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Insert a view at `position`; `None` or a position past the end appends.
    pub fn insert(&mut self, position: Option<usize>, view: &str) {
        let at = position.map_or(self.views.len(), |p| p.min(self.views.len()));
        self.views.insert(at, view.to_string());
    }

    /// Replace the view at `position`.
    pub fn replace(&mut self, position: usize, view: &str) -> Result<()> {
        let len = self.views.len();
        let slot = self
            .views
            .get_mut(position)
            .ok_or(ViewError::PositionOutOfRange { position, len })?;
        *slot = view.to_string();
        Ok(())
    }

    /// Remove the view at `position`. A group always keeps at least one view.
    pub fn remove(&mut self, position: usize) -> Result<String> {
        let len = self.views.len();
        if position >= len {
            return Err(ViewError::PositionOutOfRange { position, len });
        }
        if len == 1 {
            return Err(ViewError::EmptyGroup(self.name.clone()));
        }
        Ok(self.views.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> ViewGroup {
        ViewGroup::new("default", vec!["rgb".into(), "snow".into()])
    }

    #[test]
    fn test_view_kind_accepts_legacy_name() {
        let view: View = serde_json::from_str(r#"{"name": "aerial", "type": "bingmap"}"#)
            .expect("valid view");
        assert_eq!(view.kind, ViewKind::ExternalMap);

        let view: View = serde_json::from_str(r#"{"name": "rgb"}"#).expect("valid view");
        assert_eq!(view.kind, ViewKind::Image);
        assert!(view.description.is_none());
    }

    #[test]
    fn test_insert_positions() {
        let mut g = group();
        g.insert(Some(1), "cirrus");
        assert_eq!(g.views, ["rgb", "cirrus", "snow"]);

        g.insert(None, "aerial");
        assert_eq!(g.views.last().map(String::as_str), Some("aerial"));

        g.insert(Some(99), "end");
        assert_eq!(g.views.last().map(String::as_str), Some("end"));
    }

    #[test]
    fn test_replace_and_remove() {
        let mut g = group();
        g.replace(0, "cirrus").expect("in range");
        assert_eq!(g.views, ["cirrus", "snow"]);

        assert!(matches!(
            g.replace(5, "x"),
            Err(ViewError::PositionOutOfRange { position: 5, len: 2 })
        ));

        assert_eq!(g.remove(1).expect("in range"), "snow");
        assert!(matches!(g.remove(0), Err(ViewError::EmptyGroup(_))));
    }
}
