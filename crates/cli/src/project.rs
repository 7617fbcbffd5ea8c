//! JSON documents read and written by `compile` and `generate`.
//!
//! `compile` writes `{"targets": [...]}` with the stage first. `generate`
//! accepts that shape or a bare target object.

use serde::{Deserialize, Serialize};
use tosh_core::Target;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Project {
    pub targets: Vec<Target>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Document {
    Project(Project),
    Target(Target),
}

impl Document {
    pub fn into_targets(self) -> Vec<Target> {
        match self {
            Document::Project(p) => p.targets,
            Document::Target(t) => vec![t],
        }
    }
}

/// The target called `name`, or the first sprite, or the stage.
pub(crate) fn pick_target(targets: Vec<Target>, name: Option<&str>) -> Option<Target> {
    match name {
        Some(name) => targets.into_iter().find(|t| t.name == name),
        None => {
            let sprite = targets.iter().position(|t| !t.is_stage);
            let index = sprite.unwrap_or(0);
            targets.into_iter().nth(index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sprite_is_preferred() {
        let targets = vec![Target::stage(), Target::sprite("Cat"), Target::sprite("Dog")];
        assert_eq!(pick_target(targets.clone(), None).map(|t| t.name), Some("Cat".into()));
        assert_eq!(pick_target(targets.clone(), Some("Dog")).map(|t| t.name), Some("Dog".into()));
        assert!(pick_target(targets, Some("Bat")).is_none());
        assert!(pick_target(vec![Target::stage()], None).is_some_and(|t| t.is_stage));
    }

    #[test]
    fn bare_targets_are_accepted() {
        let json = serde_json::to_string(&Target::sprite("Cat")).unwrap();
        let doc: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(doc.into_targets().len(), 1);

        let json = serde_json::to_string(&Project {
            targets: vec![Target::stage(), Target::sprite("Cat")],
        })
        .unwrap();
        let doc: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(doc.into_targets().len(), 2);
    }
}
