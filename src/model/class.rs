//! Label classes painted into the mask.

use serde::{Deserialize, Serialize};

/// A mask class. Its index in the class table is the value stored in the mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskClass {
    /// Display name of the class
    pub name: String,
    /// RGBA colour in the final mask view
    pub colour: [u8; 4],
    /// RGBA colour in the user view, defaults to `colour`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_colour: Option<[u8; 4]>,
    #[serde(default)]
    pub description: String,
}

impl MaskClass {
    pub fn new(name: &str, colour: [u8; 4]) -> Self {
        Self {
            name: name.to_string(),
            colour,
            user_colour: None,
            description: String::new(),
        }
    }

    pub fn with_user_colour(mut self, colour: [u8; 4]) -> Self {
        self.user_colour = Some(colour);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Colour used for user-labelled pixels.
    pub fn user_display_colour(&self) -> [u8; 4] {
        self.user_colour.unwrap_or(self.colour)
    }
}

/// Classes used when a project config defines none.
pub fn default_classes() -> Vec<MaskClass> {
    vec![
        MaskClass::new("Clear", [255, 255, 255, 0])
            .with_user_colour([0, 255, 255, 70])
            .with_description("All clear pixels, i.e. without cloud contamination or cloud shadows."),
        MaskClass::new("Cloud", [255, 255, 0, 70])
            .with_description("All cloudy pixels covered by thick or thin clouds."),
        MaskClass::new("Shadow", [100, 100, 100, 180])
            .with_description("All pixels contaminated by cloud shadows."),
    ]
}
