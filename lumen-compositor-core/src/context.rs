//! What the composition tree needs from the rest of the compositor: a place to
//! report damage, pointer-focus hooks, and its runtime settings.

use lumen_core::config::CompositorConfig;
use lumen_core::types::RectF;

use crate::protocol::ResourceId;
use crate::region::Region;

/// Receives damage in global logical coordinates.
pub trait DamageSink {
    fn damage_box(&mut self, rect: RectF);

    fn damage_region(&mut self, region: &Region) {
        for rect in region.rects() {
            self.damage_box(*rect);
        }
    }
}

/// Pointer-focus hooks used when surfaces disappear from under the cursor.
pub trait InputSink {
    /// Resource under pointer focus, if any.
    fn pointer_focus(&self) -> Option<ResourceId>;

    fn release_all_buttons(&mut self);

    /// Re-evaluates which surface the pointer is over.
    fn refocus_pointer(&mut self);
}

/// Whether committing a subsurface also damages its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiblingDamagePolicy {
    /// Damage every other child of the same parent on each commit. Covers
    /// clients that rely on overlapping siblings being repainted together.
    #[default]
    DamageSiblings,
    Disabled,
}

/// Settings the tree reads at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeConfig {
    pub sibling_damage: SiblingDamagePolicy,
    /// Extra margin around a subsurface's box when it maps or unmaps.
    pub map_damage_margin: f64,
    /// Trace every damage rectangle and skipped commit.
    pub log_damage: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::from(&CompositorConfig::default())
    }
}

impl From<&CompositorConfig> for TreeConfig {
    fn from(config: &CompositorConfig) -> Self {
        Self {
            sibling_damage: if config.sibling_damage_workaround {
                SiblingDamagePolicy::DamageSiblings
            } else {
                SiblingDamagePolicy::Disabled
            },
            map_damage_margin: config.map_damage_margin,
            log_damage: config.log_damage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_config_follows_compositor_config() {
        let config = CompositorConfig {
            sibling_damage_workaround: false,
            map_damage_margin: 2.5,
            log_damage: true,
        };
        let tree = TreeConfig::from(&config);
        assert_eq!(tree.sibling_damage, SiblingDamagePolicy::Disabled);
        assert_eq!(tree.map_damage_margin, 2.5);
        assert!(tree.log_damage);
    }

    #[test]
    fn test_default_tree_config_damages_siblings() {
        let tree = TreeConfig::default();
        assert_eq!(tree.sibling_damage, SiblingDamagePolicy::DamageSiblings);
        assert_eq!(tree.map_damage_margin, 4.0);
        assert!(!tree.log_damage);
    }

    #[test]
    fn test_damage_region_forwards_each_rect() {
        struct Collect(Vec<RectF>);
        impl DamageSink for Collect {
            fn damage_box(&mut self, rect: RectF) {
                self.0.push(rect);
            }
        }

        let mut region = Region::from_rect(RectF::from_coords(0.0, 0.0, 10.0, 10.0));
        region.add(RectF::from_coords(20.0, 20.0, 5.0, 5.0));
        let mut sink = Collect(Vec::new());
        sink.damage_region(&region);
        assert_eq!(sink.0.len(), 2);
    }
}
