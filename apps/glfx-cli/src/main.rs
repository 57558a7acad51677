use anyhow::{Context, ensure};
use clap::{Parser, Subcommand, ValueEnum};
use glfx_geom::{LitVertex, Mesh, MeshProcessor, NormalCalculator, Vertex};
use glfx_math::{Mat4, Vec2, Vec3};
use glfx_render::{
    BackendStats, CachedShader, FixedLocations, GpuCommand, PrimitiveMode, RecordingBackend,
    set_uniform,
};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glfx-cli", about = "CLI tool for glfx meshes and matrices")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and vertex layout info
    Info,
    /// Recompute normals of a generated height grid
    Normals {
        /// Grid cells per side
        #[arg(short, long, default_value = "4")]
        segments: u16,
        /// Primitive mode the indices are interpreted with
        #[arg(short, long, value_enum, default_value = "triangles")]
        mode: ModeArg,
        /// Expand triangles into a non-indexed vertex list
        #[arg(long)]
        unindexed: bool,
    },
    /// Flush a grid repeatedly against the recording backend and dump the calls
    Flush {
        /// Grid cells per side
        #[arg(short, long, default_value = "2")]
        segments: u16,
        /// Use the dynamic upload path
        #[arg(short, long)]
        dynamic: bool,
        /// Number of flushes after the first
        #[arg(short, long, default_value = "1")]
        repeat: u32,
    },
    /// Build a matrix and cross-check it against glam
    Matrix {
        #[arg(short, long, value_enum, default_value = "perspective")]
        kind: MatrixKind,
        /// Vertical field of view in degrees
        #[arg(long, default_value = "60")]
        fov: f32,
        #[arg(long, default_value = "1.7777778")]
        aspect: f32,
        #[arg(long, default_value = "0.1")]
        near: f32,
        #[arg(long, default_value = "100")]
        far: f32,
        /// Camera position for look-at, or offset for translation
        #[arg(long, num_args = 3, default_values_t = [0.0, 2.0, 5.0])]
        eye: Vec<f32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Points,
    Lines,
    Triangles,
    Fan,
    Strip,
}

impl From<ModeArg> for PrimitiveMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Points => PrimitiveMode::Points,
            ModeArg::Lines => PrimitiveMode::Lines,
            ModeArg::Triangles => PrimitiveMode::Triangles,
            ModeArg::Fan => PrimitiveMode::TriangleFan,
            ModeArg::Strip => PrimitiveMode::TriangleStrip,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MatrixKind {
    Translation,
    Perspective,
    Ortho,
    LookAt,
}

#[derive(Serialize)]
struct NormalsReport {
    mode: PrimitiveMode,
    vertices: usize,
    elements: usize,
    normals: Vec<[f32; 3]>,
}

#[derive(Serialize)]
struct FlushReport {
    stats: BackendStats,
    vertex_capacity: usize,
    index_capacity: usize,
    commands: Vec<GpuCommand>,
}

#[derive(Serialize)]
struct MatrixReport {
    rows: [f32; 16],
    determinant: f32,
    inverse: [f32; 16],
    max_deviation_from_glam: f32,
}

fn height(x: f32, z: f32) -> f32 {
    0.25 * x.sin() * z.cos()
}

/// Largest grid whose `(segments + 1)²` vertices are all addressable by `u16`.
const MAX_SEGMENTS: u16 = 255;

/// `segments`² quads on the XZ plane displaced by a small height field.
fn grid(segments: u16, indexed: bool, dynamic: bool) -> anyhow::Result<Mesh<LitVertex>> {
    ensure!(segments > 0, "segments must be at least 1");
    ensure!(
        segments <= MAX_SEGMENTS,
        "{segments} segments exceed the 16-bit index range (max {MAX_SEGMENTS})"
    );
    let side = segments as u32 + 1;

    let mut points = Vec::with_capacity((side * side) as usize);
    for r in 0..side {
        for c in 0..side {
            let (x, z) = (c as f32, r as f32);
            let uv = Vec2::new(x, z) / segments as f32;
            points.push(LitVertex::new(Vec3::new(x, height(x, z), z), uv));
        }
    }

    let mut tris = Vec::new();
    for r in 0..side - 1 {
        for c in 0..side - 1 {
            let a = (r * side + c) as u16;
            let b = a + 1;
            let d = a + side as u16;
            let e = d + 1;
            tris.push([a, d, b]);
            tris.push([b, d, e]);
        }
    }

    let mut mesh = Mesh::new(indexed, dynamic);
    if indexed {
        points.into_iter().for_each(|v| mesh.add_vertex(v));
        for [i0, i1, i2] in tris {
            mesh.add_triangle(i0, i1, i2);
        }
    } else {
        for i in tris.into_iter().flatten() {
            mesh.add_vertex(points[i as usize]);
        }
    }
    Ok(mesh)
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_rows(label: &str, m: &[f32; 16]) {
    println!("{label}:");
    for row in m.chunks(4) {
        println!(
            "  [{:>9.4} {:>9.4} {:>9.4} {:>9.4}]",
            row[0], row[1], row[2], row[3]
        );
    }
}

fn run_normals(segments: u16, mode: ModeArg, unindexed: bool, json: bool) -> anyhow::Result<()> {
    let mode = PrimitiveMode::from(mode);
    let mut mesh = grid(segments, !unindexed, false)?;
    NormalCalculator::new(mode).process(&mut mesh);
    info!(?mode, vertices = mesh.vertex_count(), "normals computed");

    let report = NormalsReport {
        mode,
        vertices: mesh.vertex_count(),
        elements: mesh.element_count(),
        normals: mesh.vertices().iter().map(|v| v.normal.to_array()).collect(),
    };
    if json {
        return print_json(&report);
    }
    println!(
        "Normals ({:?}): {} vertices, {} elements",
        report.mode, report.vertices, report.elements
    );
    for (i, n) in report.normals.iter().enumerate() {
        println!("  [{i:>4}] ({:>7.4}, {:>7.4}, {:>7.4})", n[0], n[1], n[2]);
    }
    Ok(())
}

/// Uniforms the flush demo sets. The demo program exposes only `u_mvp`, so
/// the `u_light_dir` upload is skipped.
const MVP_UNIFORM: &str = "u_mvp";
const LIGHT_UNIFORM: &str = "u_light_dir";

fn record_flush(segments: u16, dynamic: bool, repeat: u32) -> anyhow::Result<FlushReport> {
    let mut gpu = RecordingBackend::new();
    let mut mesh = grid(segments, true, dynamic)?;
    let format = mesh
        .vertices()
        .first()
        .map(Vertex::format)
        .context("grid produced no vertices")?;
    let mut shader = CachedShader::new(
        FixedLocations::sequential(format.attributes().map(|(name, _, _)| name))
            .with_uniform(MVP_UNIFORM, 0),
    );

    mesh.process(&NormalCalculator::new(PrimitiveMode::Triangles));
    mesh.flush(&mut gpu)?;
    for pass in 0..repeat {
        let lift = (pass + 1) as f32 * 0.1;
        for v in mesh.vertices_mut() {
            v.position.y += lift;
        }
        mesh.flush(&mut gpu)?;
    }

    let extent = segments as f32;
    let center = Vec3::new(extent * 0.5, 0.0, extent * 0.5);
    let eye = center + Vec3::new(0.0, extent, extent * 1.5);
    let mvp = Mat4::perspective(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0)
        * Mat4::look_at(eye, center, Vec3::Y);
    set_uniform(&mut gpu, &mut shader, MVP_UNIFORM, mvp);
    if !set_uniform(&mut gpu, &mut shader, LIGHT_UNIFORM, Vec3::Y) {
        debug!(uniform = LIGHT_UNIFORM, "program has no light uniform");
    }
    mesh.render(&mut gpu, PrimitiveMode::Triangles, &mut shader)?;
    info!(flushes = repeat + 1, dynamic, "mesh uploaded and drawn");

    let report = FlushReport {
        stats: gpu.stats(),
        vertex_capacity: mesh.vertex_capacity(),
        index_capacity: mesh.index_capacity(),
        commands: gpu.commands().to_vec(),
    };
    mesh.destroy(&mut gpu)?;
    Ok(report)
}

fn run_flush(segments: u16, dynamic: bool, repeat: u32, json: bool) -> anyhow::Result<()> {
    let report = record_flush(segments, dynamic, repeat)?;
    if json {
        return print_json(&report);
    }
    for cmd in &report.commands {
        println!("  {cmd:?}");
    }
    println!(
        "Buffers: vertex {} bytes, index {} bytes",
        report.vertex_capacity, report.index_capacity
    );
    println!(
        "Stats: {} commands, {} allocations, {} draw calls, {} uniforms",
        report.stats.commands,
        report.stats.allocations,
        report.stats.draw_calls,
        report.stats.uniforms_set
    );
    Ok(())
}

fn run_matrix(
    kind: MatrixKind,
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    eye: &[f32],
    json: bool,
) -> anyhow::Result<()> {
    let eye = match eye {
        [x, y, z] => Vec3::new(*x, *y, *z),
        _ => anyhow::bail!("--eye takes exactly three values"),
    };
    let fov = fov.to_radians();
    let half_h = (fov * 0.5).tan() * near;
    let half_w = half_h * aspect;

    let (ours, theirs) = match kind {
        MatrixKind::Translation => (
            Mat4::translation_vec(eye),
            glam::Mat4::from_translation(eye.into()),
        ),
        MatrixKind::Perspective => (
            Mat4::perspective(fov, aspect, near, far),
            glam::Mat4::perspective_rh_gl(fov, aspect, near, far),
        ),
        MatrixKind::Ortho => (
            Mat4::ortho(-half_w, half_w, -half_h, half_h, near, far),
            glam::Mat4::orthographic_rh_gl(-half_w, half_w, -half_h, half_h, near, far),
        ),
        MatrixKind::LookAt => (
            Mat4::look_at(eye, Vec3::ZERO, Vec3::Y),
            glam::Mat4::look_at_rh(eye.into(), glam::Vec3::ZERO, glam::Vec3::Y),
        ),
    };

    let max_deviation = ours
        .to_cols_array()
        .iter()
        .zip(theirs.to_cols_array().iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f32, f32::max);

    let report = MatrixReport {
        rows: ours.to_rows_array(),
        determinant: ours.determinant(),
        inverse: ours.inverted().to_rows_array(),
        max_deviation_from_glam: max_deviation,
    };
    if json {
        return print_json(&report);
    }
    print_rows("Matrix", &report.rows);
    print_rows("Inverse", &report.inverse);
    println!("Determinant: {:.6}", report.determinant);
    println!("Max deviation from glam: {:e}", report.max_deviation_from_glam);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("glfx-cli v{}", env!("CARGO_PKG_VERSION"));
            let format = LitVertex::layout();
            println!("LitVertex stride: {} bytes", format.size());
            for (name, attrib, offset) in format.attributes() {
                println!(
                    "  {name}: {} floats at offset {offset}{}",
                    attrib.components,
                    if attrib.normalized { " (normalized)" } else { "" }
                );
            }
        }
        Commands::Normals {
            segments,
            mode,
            unindexed,
        } => run_normals(segments, mode, unindexed, cli.json)?,
        Commands::Flush {
            segments,
            dynamic,
            repeat,
        } => run_flush(segments, dynamic, repeat, cli.json)?,
        Commands::Matrix {
            kind,
            fov,
            aspect,
            near,
            far,
            eye,
        } => run_matrix(kind, fov, aspect, near, far, &eye, cli.json)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glfx_render::UniformValue;

    #[test]
    fn cli_parses_flush_flags() {
        let cli = Cli::try_parse_from(["glfx-cli", "--json", "flush", "-d", "-r", "3"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Flush {
                dynamic, repeat, ..
            } => {
                assert!(dynamic);
                assert_eq!(repeat, 3);
            }
            _ => panic!("expected flush"),
        }
    }

    #[test]
    fn largest_grid_fits_u16_indices() {
        let mesh = grid(MAX_SEGMENTS, true, false).unwrap();
        assert_eq!(mesh.vertex_count(), 256 * 256);
        assert_eq!(mesh.indices().iter().copied().max(), Some(u16::MAX));
    }

    #[test]
    fn grid_sizes() {
        let indexed = grid(2, true, false).unwrap();
        assert_eq!(indexed.vertex_count(), 9);
        assert_eq!(indexed.index_count(), 24);

        let flat = grid(2, false, false).unwrap();
        assert_eq!(flat.vertex_count(), 24);
        assert_eq!(flat.element_count(), 24);

        assert!(grid(0, true, false).is_err());
        assert!(grid(256, true, false).is_err());
        assert!(grid(u16::MAX, true, false).is_err());
        assert!(grid(u16::MAX, false, true).is_err());
    }

    #[test]
    fn flush_demo_uploads_only_exposed_uniforms() {
        let report = record_flush(2, true, 2).unwrap();
        let uploads: Vec<_> = report
            .commands
            .iter()
            .filter_map(|c| match c {
                GpuCommand::SetUniform { location, value } => Some((*location, *value)),
                _ => None,
            })
            .collect();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, 0);
        assert!(matches!(uploads[0].1, UniformValue::Mat4(_)));
        assert_eq!(report.stats.uniforms_set, 1);
        assert_eq!(report.stats.draw_calls, 1);
    }

    #[test]
    fn flat_grid_normals_point_up() {
        let mut mesh = grid(1, true, false).unwrap();
        for v in mesh.vertices_mut() {
            v.position.y = 0.0;
        }
        NormalCalculator::new(PrimitiveMode::Triangles).process(&mut mesh);
        for v in mesh.vertices() {
            assert!((v.normal - Vec3::Y).length() < 1e-5);
        }
    }
}
