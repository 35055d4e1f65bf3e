//! The Stage: layer metadata plus the root prim tree.

use crate::path::Path;
use crate::prim::Prim;
use crate::value::{Axis, Dictionary, Token};

/// Layer-level metadata parsed from the pseudo-root.
#[derive(Clone, Debug, PartialEq)]
pub struct StageMetas {
    pub up_axis: Axis,
    pub meters_per_unit: f64,
    pub time_codes_per_second: f64,
    pub start_time_code: f64,
    pub end_time_code: f64,
    pub default_prim: Token,
    pub custom_layer_data: Dictionary,
    pub doc: Option<String>,
    pub comment: Option<String>,
}

impl Default for StageMetas {
    fn default() -> Self {
        Self {
            up_axis: Axis::Y,
            meters_per_unit: 1.0,
            time_codes_per_second: 24.0,
            start_time_code: 0.0,
            end_time_code: 0.0,
            default_prim: Token::default(),
            custom_layer_data: Dictionary::new(),
            doc: None,
            comment: None,
        }
    }
}

/// An in-memory scene graph as parsed from one layer.
///
/// The stage exclusively owns its root prims; each prim owns its subtree.
/// Reading a completed stage from multiple threads is safe as long as no
/// thread mutates it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stage {
    metas: StageMetas,
    root_prims: Vec<Prim>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn metas(&self) -> &StageMetas {
        &self.metas
    }

    pub fn metas_mut(&mut self) -> &mut StageMetas {
        &mut self.metas
    }

    #[inline]
    pub fn root_prims(&self) -> &[Prim] {
        &self.root_prims
    }

    pub fn root_prims_mut(&mut self) -> &mut Vec<Prim> {
        &mut self.root_prims
    }

    pub fn add_root_prim(&mut self, prim: Prim) {
        self.root_prims.push(prim);
    }

    /// Find a prim by absolute path (property parts are ignored).
    pub fn find_prim_at_path(&self, path: &Path) -> Option<&Prim> {
        if !path.is_absolute() || path.is_root() {
            return None;
        }
        let mut components = path.prim_part().split('/').filter(|c| !c.is_empty());

        let first = components.next()?;
        let mut current = self.root_prims.iter().find(|p| p.name() == first)?;
        for component in components {
            current = current.find_child(component)?;
        }
        Some(current)
    }

    /// Depth-first iteration over every prim in the stage.
    pub fn traverse(&self) -> impl Iterator<Item = &Prim> {
        let mut stack: Vec<&Prim> = self.root_prims.iter().rev().collect();
        std::iter::from_fn(move || {
            let prim = stack.pop()?;
            stack.extend(prim.children().iter().rev());
            Some(prim)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Model, PrimBody};

    fn prim(name: &str) -> Prim {
        Prim::new(name, PrimBody::from(Model::default()))
    }

    #[test]
    fn test_default_metas() {
        let metas = StageMetas::default();
        assert_eq!(metas.up_axis, Axis::Y);
        assert_eq!(metas.meters_per_unit, 1.0);
        assert_eq!(metas.time_codes_per_second, 24.0);
        assert!(metas.default_prim.is_empty());
    }

    #[test]
    fn test_find_prim_at_path() {
        let mut stage = Stage::new();
        let mut root = prim("Scene");
        let mut geo = prim("Geo");
        geo.add_child(prim("Cube"));
        root.add_child(geo);
        stage.add_root_prim(root);

        let found = stage.find_prim_at_path(&Path::new("/Scene/Geo/Cube", ""));
        assert_eq!(found.map(|p| p.name()), Some("Cube"));

        assert!(stage.find_prim_at_path(&Path::new("/Scene/Nope", "")).is_none());
        assert!(stage.find_prim_at_path(&Path::root()).is_none());
    }

    #[test]
    fn test_traverse_order() {
        let mut stage = Stage::new();
        let mut a = prim("A");
        a.add_child(prim("A1"));
        a.add_child(prim("A2"));
        stage.add_root_prim(a);
        stage.add_root_prim(prim("B"));

        let names: Vec<&str> = stage.traverse().map(|p| p.name()).collect();
        assert_eq!(names, vec!["A", "A1", "A2", "B"]);
    }
}
