use indexmap::IndexMap;

use crate::asset_pipeline::property_sync::sync_instance_properties;
use crate::asset_pipeline::spawn_points::SpawnPointDeriver;
use crate::config::SpawnConfig;
use crate::error::{PipelineError, Result};
use crate::scene_graph::Scene;

pub const GENERATE_SPAWN_POINTS: &str = "generate_spawn_points";
pub const SYNC_INSTANCE_PROPERTIES: &str = "sync_collection_instance_properties";

/// A named, argument-less scene routine.
pub trait SceneRoutine {
    /// Runs the routine and returns a human-readable status line.
    fn run(&self, scene: &mut Scene) -> Result<String>;
}

impl<F> SceneRoutine for F
where
    F: Fn(&mut Scene) -> Result<String>,
{
    fn run(&self, scene: &mut Scene) -> Result<String> {
        self(scene)
    }
}

pub struct SpawnPointsRoutine(pub SpawnPointDeriver);

impl SceneRoutine for SpawnPointsRoutine {
    fn run(&self, scene: &mut Scene) -> Result<String> {
        let report = self.0.generate(scene)?;
        Ok(format!("Spawn points generated ({} created)", report.created))
    }
}

#[derive(Default)]
pub struct RoutineRegistry {
    routines: IndexMap<String, Box<dyn SceneRoutine>>,
}

impl RoutineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the spawn point and property sync routines.
    pub fn with_builtins(spawn: SpawnConfig) -> Self {
        let mut registry = Self::new();
        registry.register(
            GENERATE_SPAWN_POINTS,
            SpawnPointsRoutine(SpawnPointDeriver::new(spawn)),
        );
        registry.register(SYNC_INSTANCE_PROPERTIES, |scene: &mut Scene| -> Result<String> {
            let report = sync_instance_properties(scene)?;
            Ok(format!(
                "Clean sync completed on {} instances",
                report.instances
            ))
        });
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, routine: impl SceneRoutine + 'static) {
        self.routines.insert(name.into(), Box::new(routine));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routines.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routines.keys().map(String::as_str)
    }

    pub fn run(&self, name: &str, scene: &mut Scene) -> Result<String> {
        let routine = self
            .routines
            .get(name)
            .ok_or_else(|| PipelineError::not_found("routine", name))?;
        log::debug!("Running routine '{}'", name);
        routine.run(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_routine_is_not_found() {
        let registry = RoutineRegistry::new();
        let mut scene = Scene::new("level");

        let err = registry.run(GENERATE_SPAWN_POINTS, &mut scene).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn builtins_are_registered_and_callable() {
        let registry = RoutineRegistry::with_builtins(SpawnConfig::default());
        let mut scene = Scene::new("level");

        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec![GENERATE_SPAWN_POINTS, SYNC_INSTANCE_PROPERTIES]
        );
        let status = registry.run(GENERATE_SPAWN_POINTS, &mut scene).unwrap();
        assert_eq!(status, "Spawn points generated (0 created)");
        assert!(scene.collection_by_name("SPAWN_POINTS").is_some());
    }

    #[test]
    fn closures_can_be_registered() {
        let mut registry = RoutineRegistry::new();
        registry.register("rename", |scene: &mut Scene| -> Result<String> {
            scene.name = "renamed".to_string();
            Ok("renamed".to_string())
        });

        let mut scene = Scene::new("level");
        registry.run("rename", &mut scene).unwrap();
        assert_eq!(scene.name, "renamed");
    }
}
