//! Category gains and the reverb wet/dry blend.

use sonance_core::NodeId;
use sonance_core::level::dry_for_wet;

/// A category's dedicated gain stage.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStage {
    /// Category name.
    pub name: String,
    /// Gain stage feeding the reverb and dry paths.
    pub node: NodeId,
    /// Last level set on the stage.
    pub level: f32,
}

/// Mixer state. Category stages exist only after initialization.
pub(crate) struct Mixer {
    categories: Vec<CategoryStage>,
    reverb_level: f32,
}

impl Mixer {
    pub fn new(reverb_level: f32) -> Self {
        Self {
            categories: Vec::new(),
            reverb_level,
        }
    }

    pub fn add_category(&mut self, name: &str, node: NodeId) {
        self.categories.push(CategoryStage {
            name: name.to_string(),
            node,
            level: 1.0,
        });
    }

    pub fn category(&self, name: &str) -> Option<&CategoryStage> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn category_mut(&mut self, name: &str) -> Option<&mut CategoryStage> {
        self.categories.iter_mut().find(|c| c.name == name)
    }

    pub fn categories(&self) -> &[CategoryStage] {
        &self.categories
    }

    pub fn reverb_level(&self) -> f32 {
        self.reverb_level
    }

    /// Stores a new reverb level and returns the `(wet, dry)` targets, or
    /// `None` if the level did not change.
    pub fn set_reverb_level(&mut self, level: f32) -> Option<(f32, f32)> {
        if level == self.reverb_level {
            return None;
        }
        self.reverb_level = level;
        Some(self.wet_dry())
    }

    pub fn wet_dry(&self) -> (f32, f32) {
        (self.reverb_level, dry_for_wet(self.reverb_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_lookup() {
        let mut mixer = Mixer::new(0.02);
        mixer.add_category("ui", NodeId::from_index(7));
        mixer.add_category("sim", NodeId::from_index(8));

        assert_eq!(mixer.category("sim").map(|c| c.node), Some(NodeId::from_index(8)));
        assert!(mixer.category("music").is_none());

        mixer.category_mut("ui").unwrap().level = 0.25;
        assert_eq!(mixer.categories()[0].level, 0.25);
        assert_eq!(mixer.categories()[1].level, 1.0);
    }

    #[test]
    fn reverb_blend_sums_to_one() {
        let mut mixer = Mixer::new(0.02);
        assert_eq!(mixer.set_reverb_level(0.02), None);

        let (wet, dry) = mixer.set_reverb_level(0.3).unwrap();
        assert_eq!(wet, 0.3);
        assert!((wet + dry - 1.0).abs() < 1e-6);
        assert_eq!(mixer.reverb_level(), 0.3);
    }
}
