use anyhow::Context as _;
use clap::{Parser, Subcommand};
use debugviz_common::{CameraMatrices, Transform};
use debugviz_geometry::{Mesh, build_plane};
use debugviz_render::{
    FilledGridOverlay, Frame, NormalOverlay, Overlay, RecordingContext, SceneConfig,
    WireGridOverlay, render_all,
};
use debugviz_tools::PanelLayout;
use glam::Vec3;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "debugviz-cli", about = "Inspect debug overlay geometry and draw traces")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (JSON); missing fields use defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Print buffer sizes of both grid variants
    Grid {
        /// Override the filled grid's cell count on both axes
        #[arg(long)]
        segments: Option<u32>,
        /// Override how many line cells each fill cell holds
        #[arg(long)]
        line_density: Option<u32>,
    },
    /// Print buffer sizes of the normal overlay for a box target
    Normals {
        /// Edge length of the target box
        #[arg(long, default_value = "50")]
        size: f32,
        /// Segments per box edge
        #[arg(long, default_value = "1")]
        segments: u32,
        /// Override the normal line length
        #[arg(long)]
        line_length: Option<f32>,
    },
    /// Render one frame into a recording context and dump every call
    Trace {
        /// Simulate a context without vertex-array objects
        #[arg(long)]
        no_vertex_arrays: bool,
        /// Only print the draw summary
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print the inspector layout every overlay registers
    Gui,
    /// Print the effective configuration as JSON
    Config,
}

fn load_scene(path: Option<&Path>) -> anyhow::Result<SceneConfig> {
    let Some(path) = path else {
        return Ok(SceneConfig::default());
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let scene: SceneConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    scene.validate()?;
    tracing::debug!(path = %path.display(), "loaded scene config");
    Ok(scene)
}

/// The cube the normal overlay annotates, resting on the grid.
fn target_mesh(scene: &SceneConfig) -> anyhow::Result<Mesh> {
    let size = scene.target_size;
    let mesh = Mesh::cube(size)?
        .with_name("target")
        .with_transform(Transform::default().with_position(Vec3::new(0.0, size / 2.0, 0.0)));
    Ok(mesh)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut scene = load_scene(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("debugviz-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", debugviz_common::crate_info());
            println!("geometry: {}", debugviz_geometry::crate_info());
            println!("render: {}", debugviz_render::crate_info());
            println!("tools: {}", debugviz_tools::crate_info());
        }
        Commands::Grid {
            segments,
            line_density,
        } => {
            if let Some(s) = segments {
                scene.filled_grid.width_segments = s;
                scene.filled_grid.height_segments = s;
            }
            if let Some(d) = line_density {
                scene.filled_grid.line_density = d;
            }
            print_grid_stats(&scene)?;
        }
        Commands::Normals {
            size,
            segments,
            line_length,
        } => {
            if let Some(l) = line_length {
                scene.normals.line_length = l;
            }
            let mesh = Mesh::box_mesh(size, size, size, [segments; 3])?;
            let mut ctx = RecordingContext::new();
            let overlay = NormalOverlay::new(&mut ctx, &mesh, &scene.normals)?;
            println!("target: {} vertices, {} triangles", mesh.vertex_count(), mesh.triangle_count());
            println!(
                "normals: {} points, {} line vertices, {} line indices, length {}",
                overlay.point_count(),
                overlay.line_vertex_count(),
                overlay.line_index_count(),
                overlay.line_length()
            );
            println!(
                "context: {} programs, {} buffers, {} vertex arrays",
                ctx.live_programs(),
                ctx.live_buffers(),
                ctx.live_vertex_arrays()
            );
        }
        Commands::Trace {
            no_vertex_arrays,
            quiet,
        } => {
            let ctx = if no_vertex_arrays {
                RecordingContext::without_vertex_arrays()
            } else {
                RecordingContext::new()
            };
            trace_frame(&scene, ctx, quiet)?;
        }
        Commands::Gui => {
            let mut ctx = RecordingContext::new();
            let target = target_mesh(&scene)?;
            let wire = WireGridOverlay::new(&mut ctx, &scene.wire_grid)?;
            let filled = FilledGridOverlay::new(&mut ctx, &scene.filled_grid)?;
            let normals = NormalOverlay::new(&mut ctx, &target, &scene.normals)?;

            let mut layouts = [PanelLayout::new(), PanelLayout::new(), PanelLayout::new()];
            wire.add_gui(&mut layouts[0]);
            filled.add_gui(&mut layouts[1]);
            normals.add_gui(&mut layouts[2]);
            for (name, layout) in [wire.name(), filled.name(), "normals"].into_iter().zip(&layouts) {
                println!("# {name}");
                print!("{layout}");
            }
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&scene)?);
        }
    }

    Ok(())
}

fn print_grid_stats(scene: &SceneConfig) -> anyhow::Result<()> {
    let wire = &scene.wire_grid;
    wire.validate()?;
    let plane = build_plane(wire.width, wire.height, wire.width_segments, wire.height_segments)?;
    println!(
        "wire grid: {}x{} over {}x{} cells, {} vertices, {} wire indices, axes {}",
        wire.width,
        wire.height,
        wire.width_segments,
        wire.height_segments,
        plane.vertex_count(),
        plane.wire_indices.len(),
        wire.axis_length
    );

    let filled = &scene.filled_grid;
    let lines = FilledGridOverlay::line_grid(filled)?;
    let (ws, hs) = filled.line_segments();
    println!(
        "filled grid: {}x{} fill cells, {}x{} line cells, {} quads, {} vertices, {} indices",
        filled.width_segments,
        filled.height_segments,
        ws,
        hs,
        lines.quad_count(),
        lines.vertex_count(),
        lines.index_count()
    );
    Ok(())
}

fn trace_frame(scene: &SceneConfig, mut ctx: RecordingContext, quiet: bool) -> anyhow::Result<()> {
    let target = target_mesh(scene)?;
    let mut filled = FilledGridOverlay::new(&mut ctx, &scene.filled_grid)?;
    let mut wire = WireGridOverlay::new(&mut ctx, &scene.wire_grid)?;
    let mut normals = NormalOverlay::new(&mut ctx, &target, &scene.normals)?;
    println!(
        "setup: {} calls, {} programs, {} buffers, {} vertex arrays",
        ctx.calls().len(),
        ctx.live_programs(),
        ctx.live_buffers(),
        ctx.live_vertex_arrays()
    );
    ctx.clear_log();

    let camera = CameraMatrices::default();
    let draws = {
        let mut frame = Frame::new(&mut ctx);
        let mut targeted = normals.with_target(&target);
        let mut overlays: [&mut dyn Overlay; 3] = [&mut filled, &mut wire, &mut targeted];
        render_all(&mut frame, &camera, &mut overlays)?
    };

    if !quiet {
        for (i, call) in ctx.calls().iter().enumerate() {
            println!("{i:4}  {call:?}");
        }
    }
    println!("frame: {} calls, {draws} draws", ctx.calls().len());
    for (i, draw) in ctx.draws().iter().enumerate() {
        println!(
            "  draw {i}: {} {:?} count={} indexed={} blend={:?} depth={} cull={}",
            draw.shader,
            draw.topology,
            draw.count,
            draw.indexed,
            draw.blend,
            draw.depth_test,
            draw.cull_face
        );
    }

    filled.release(&mut ctx);
    wire.release(&mut ctx);
    normals.release(&mut ctx);
    tracing::debug!(
        programs = ctx.live_programs(),
        buffers = ctx.live_buffers(),
        "released overlays"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_is_a_cube_on_the_grid() {
        let target = target_mesh(&SceneConfig::default()).unwrap();
        assert_eq!(target.vertex_count(), 24);
        assert_eq!(target.transform.position.y, 25.0);
    }

    #[test]
    fn missing_config_path_uses_defaults() {
        assert_eq!(load_scene(None).unwrap(), SceneConfig::default());
    }

    #[test]
    fn trace_runs_without_vertex_arrays() {
        let scene = SceneConfig::default();
        trace_frame(&scene, RecordingContext::without_vertex_arrays(), true).unwrap();
    }
}
