use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use marlstone_core::edits::edit_queue;
use marlstone_terrain::height::ConstantHeight;
use marlstone_terrain::marching::is_degenerate;
use marlstone_terrain::{ChunkMesh, ChunkOrigin, MeshSink, TerrainConfig, TerrainGrid};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct InspectorConfig {
    #[serde(flatten)]
    terrain: TerrainConfig,
    #[serde(default)]
    edits: Vec<ScriptedEdit>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct ScriptedEdit {
    position: [f32; 3],
    #[serde(default = "default_adding")]
    adding: bool,
}

fn default_adding() -> bool {
    true
}

struct Options {
    config_path: Option<PathBuf>,
    flat: bool,
    edits: Vec<ScriptedEdit>,
}

#[derive(Default)]
struct MeshStats {
    chunks: usize,
    empty_chunks: usize,
    triangles: usize,
    degenerate: usize,
    upload_bytes: usize,
}

impl MeshSink for MeshStats {
    fn submit(&mut self, origin: ChunkOrigin, mesh: &ChunkMesh) {
        let degenerate = mesh.triangles().filter(is_degenerate).count();
        let bounds = mesh
            .bounds()
            .map(|(min, max)| format!("{min} .. {max}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  chunk @ ({}, {}, {}): {} triangles, {} degenerate, bounds {}",
            origin.x,
            origin.y,
            origin.z,
            mesh.triangle_count(),
            degenerate,
            bounds
        );

        self.chunks += 1;
        self.triangles += mesh.triangle_count();
        self.degenerate += degenerate;
        self.upload_bytes += mesh.positions_bytes().len() + mesh.indices_bytes().len();
        if mesh.is_empty() {
            self.empty_chunks += 1;
        }
    }
}

fn main() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let options = match parse_args(env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => return,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(options) {
        eprintln!("terrain_inspector error: {err}");
        std::process::exit(1);
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Options>, String> {
    let mut options = Options {
        config_path: None,
        flat: false,
        edits: Vec::new(),
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--flat" => options.flat = true,
            "--edit" => {
                let Some(value) = args.next() else {
                    return Err("--edit expects x,y,z,add|remove".to_string());
                };
                options.edits.push(parse_edit(&value)?);
            }
            "--help" | "-h" => {
                println!("Usage: terrain_inspector [config.toml] [--flat] [--edit x,y,z,add|remove]...");
                return Ok(None);
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown argument: {other}"));
            }
            path => {
                if options.config_path.is_some() {
                    return Err(format!("unexpected extra config path: {path}"));
                }
                options.config_path = Some(PathBuf::from(path));
            }
        }
    }

    Ok(Some(options))
}

fn parse_edit(value: &str) -> Result<ScriptedEdit, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [x, y, z, mode] = parts.as_slice() else {
        return Err(format!("invalid edit '{value}': expected x,y,z,add|remove"));
    };

    let mut position = [0.0f32; 3];
    for (slot, text) in position.iter_mut().zip([x, y, z]) {
        *slot = text
            .parse()
            .map_err(|err| format!("invalid edit coordinate '{text}': {err}"))?;
    }

    let adding = match *mode {
        "add" => true,
        "remove" => false,
        other => return Err(format!("invalid edit mode '{other}': expected add or remove")),
    };

    Ok(ScriptedEdit { position, adding })
}

fn load_config(path: &Path) -> Result<InspectorConfig, String> {
    let src = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let config: InspectorConfig = toml::from_str(&src)
        .map_err(|err| format!("failed to parse {}: {err}", path.display()))?;
    config
        .terrain
        .validate()
        .map_err(|err| format!("{}: {err}", path.display()))?;
    Ok(config)
}

fn run(options: Options) -> Result<(), String> {
    let mut config = match &options.config_path {
        Some(path) => load_config(path)?,
        None => InspectorConfig {
            terrain: TerrainConfig::default(),
            edits: Vec::new(),
        },
    };
    config.edits.extend(options.edits);

    let terrain = &config.terrain;
    let mut grid = if options.flat {
        let surface = terrain.chunk_height as f32 / 2.0;
        TerrainGrid::from_config_with(terrain, &ConstantHeight(surface))
    } else {
        TerrainGrid::from_config(terrain)
    };

    println!(
        "Terrain: {}x{} chunks of {}x{}x{} cubes ({})",
        terrain.chunks_wide,
        terrain.chunks_long,
        terrain.chunk_width,
        terrain.chunk_height,
        terrain.chunk_width,
        if options.flat { "flat" } else { "noise" }
    );

    let (edits, pending) = edit_queue();
    for edit in &config.edits {
        let [x, y, z] = edit.position;
        edits
            .point(Vec3::new(x, y, z), edit.adding)
            .map_err(|err| format!("failed to queue edit: {err}"))?;
    }

    let results = grid.drain_edits(&pending);
    let rejected = results.iter().filter(|result| result.is_err()).count();
    let remeshed: usize = results
        .iter()
        .filter_map(|result| result.as_ref().ok())
        .map(|report| report.remeshed.len())
        .sum();
    info!(
        "Applied {} edits ({} rejected, {} chunk rebuilds)",
        results.len(),
        rejected,
        remeshed
    );

    let mut stats = MeshStats::default();
    grid.submit_all(&mut stats);

    println!(
        "Totals: {} chunks ({} empty), {} triangles, {} degenerate, {} KiB of mesh data",
        stats.chunks,
        stats.empty_chunks,
        stats.triangles,
        stats.degenerate,
        stats.upload_bytes / 1024
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_args, parse_edit, InspectorConfig};

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|arg| arg.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn edits_parse_from_the_command_line() {
        let edit = parse_edit("16, 7.5, 8, remove").expect("valid edit");
        assert_eq!(edit.position, [16.0, 7.5, 8.0]);
        assert!(!edit.adding);

        assert!(parse_edit("1,2,add").is_err());
        assert!(parse_edit("1,2,3,dig").is_err());
        assert!(parse_edit("1,x,3,add").is_err());
    }

    #[test]
    fn arguments_collect_config_flags_and_edits() {
        let options = parse_args(args(&["terrain.toml", "--flat", "--edit", "1,2,3,add"]))
            .expect("valid arguments")
            .expect("not a help request");
        assert_eq!(
            options.config_path.as_deref(),
            Some(std::path::Path::new("terrain.toml"))
        );
        assert!(options.flat);
        assert_eq!(options.edits.len(), 1);

        assert!(parse_args(args(&["--edit"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
        assert!(parse_args(args(&["--help"])).expect("help").is_none());
    }

    #[test]
    fn inspector_config_adds_scripted_edits_to_terrain_settings() {
        let config: InspectorConfig = toml::from_str(
            r#"
            chunks_wide = 2
            chunk_width = 8

            [surface]
            seed = 3

            [[edits]]
            position = [8.0, 4.0, 2.0]

            [[edits]]
            position = [1.0, 1.0, 1.0]
            adding = false
            "#,
        )
        .expect("parse inspector config");

        assert_eq!(config.terrain.chunks_wide, 2);
        assert_eq!(config.terrain.chunks_long, 10);
        assert_eq!(config.terrain.surface.seed, 3);
        assert_eq!(config.edits.len(), 2);
        assert!(config.edits[0].adding);
        assert!(!config.edits[1].adding);
    }
}
