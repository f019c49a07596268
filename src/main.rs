use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use levelbake::asset_pipeline::{
    sync_instance_properties, ChunkExporter, ChunkFailurePolicy, ExportStatus, LevelExporter,
    RoutineRegistry, SpawnPointDeriver,
};
use levelbake::export::{GlbExporter, MemoryExporter, SceneExporter};
use levelbake::scene_graph::SceneDocument;
use levelbake::PipelineConfig;

/// Bake an authored level scene into runtime assets.
#[derive(Parser)]
#[command(name = "levelbake", version)]
struct Cli {
    /// Scene description (JSON). Output directories are relative to its folder.
    scene: PathBuf,

    /// Save the scene back after the command ran (e.g. with regenerated spawn points).
    #[arg(long)]
    write_scene: Option<PathBuf>,

    /// Log what would be exported instead of writing files.
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export every visible mesh and empty, one file per grid cell.
    Chunks {
        /// Grid cell size in world units.
        #[arg(long)]
        size: Option<f32>,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Stop at the first chunk that fails to export.
        #[arg(long)]
        abort_on_error: bool,
    },
    /// Regenerate spawn point markers from "vis" collections.
    SpawnPoints,
    /// Mirror collection custom properties onto their instances.
    SyncProperties,
    /// Generate spawn points and export the level without helper collections.
    ExportLevel {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();

    let document = SceneDocument::load(&cli.scene)
        .with_context(|| format!("Failed to load scene {}", cli.scene.display()))?;
    let mut scene = document
        .build_scene()
        .with_context(|| format!("Failed to build scene {}", cli.scene.display()))?;

    let base_dir = cli.scene.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut config = PipelineConfig::default();
    config.chunk_dir = base_dir.join(&config.chunk_dir);
    config.level_dir = base_dir.join(&config.level_dir);

    let mut exporter: Box<dyn SceneExporter> = if cli.dry_run {
        Box::new(MemoryExporter::new())
    } else {
        Box::new(GlbExporter::new())
    };

    match cli.command {
        Command::Chunks {
            size,
            out,
            abort_on_error,
        } => {
            if let Some(size) = size {
                config.chunk_size = size;
            }
            if let Some(out) = out {
                config.chunk_dir = out;
            }
            if abort_on_error {
                config.chunk_failure_policy = ChunkFailurePolicy::Abort;
            }

            let report = ChunkExporter::from_config(&config)
                .export_all(&mut scene, exporter.as_mut())
                .context("Chunk export failed")?;
            log::info!("{}", report.status_line());
            if !report.failed.is_empty() {
                anyhow::bail!("{} chunks failed to export", report.failed.len());
            }
        }
        Command::SpawnPoints => {
            SpawnPointDeriver::new(config.spawn.clone())
                .generate(&mut scene)
                .context("Failed to generate spawn points")?;
        }
        Command::SyncProperties => {
            sync_instance_properties(&mut scene).context("Failed to sync properties")?;
        }
        Command::ExportLevel { out } => {
            if let Some(out) = out {
                config.level_dir = out;
            }

            let registry = RoutineRegistry::with_builtins(config.spawn.clone());
            let level = LevelExporter::for_scene_file(&config, &cli.scene);
            let status = level.run_guarded(&mut scene, &registry, exporter.as_mut());
            match status {
                ExportStatus::Exported { .. } => {}
                ExportStatus::Skipped { .. } => log::warn!("Level export skipped"),
                ExportStatus::Failed { .. } => anyhow::bail!("Level export failed"),
            }
        }
    }

    if let Some(path) = &cli.write_scene {
        SceneDocument::from_scene(&scene)?
            .save(path)
            .with_context(|| format!("Failed to save scene {}", path.display()))?;
        log::info!("Saved scene to {}", path.display());
    }

    Ok(())
}
