use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::field::{Method, WindowParams};
use crate::partition::{plan_layers, plan_sections, LayerParams, SectionParams};
use serde::{Deserialize, Serialize};

/// Everything a post-processing run needs besides the snapshot itself.
///
/// Every field has a default, so a config file only lists what it changes:
///
/// ```json
/// { "window": { "window_size": 2.0 }, "interpolation": "linear" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostprocessConfig {
    pub sections: SectionParams,
    pub layers: LayerParams,
    pub window: WindowParams,
    /// Particle attribute averaged into the field.
    pub attribute: String,
    /// Method used to fill missing cells; `None` leaves them missing.
    pub interpolation: Option<Method>,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        PostprocessConfig {
            sections: SectionParams::default(),
            layers: LayerParams::default(),
            window: WindowParams::default(),
            attribute: "disp_y".to_owned(),
            interpolation: Some(Method::Nearest),
        }
    }
}

impl PostprocessConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Runs every check the planners and the window builder would run on `domain`.
    pub fn validate(&self, domain: &Domain) -> Result<()> {
        plan_sections(domain.origin().x, domain.width(), &self.sections)?;
        plan_layers(&self.layers.thicknesses, self.layers.margin, domain.height())?;
        self.window.validate(domain.width(), domain.height())?;
        if self.attribute.is_empty() {
            return Err(Error::UnknownAttribute(self.attribute.clone()));
        }
        Ok(())
    }
}
