use std::f32::consts::TAU;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use glam::Vec3;
use rootcause::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use procmesh::color::Rgba8;
use procmesh::export::{GltfWriter, SphereFactory, SphereFactoryOptions};
use procmesh::ext::RotationEncoding;
use procmesh::models::{Grid, IcosphereBuilder, IcosphereOptions, MeshAssembly, PipeOptions, PipePoint};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Scene {
    /// Height field rendered as a planar grid
    Terrain,
    /// Textured torus, wrapped in both directions
    Torus,
    /// Field of instanced spheres tagged with event ids
    Spheres,
    /// Tube following a helix
    Pipe,
    /// A single icosphere
    Icosphere,
}

/// Build a procedural mesh and write it as glTF
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(value_enum)]
    scene: Scene,

    /// Output path. `.glb` writes a single binary file, `.gltf` writes JSON
    /// plus a sibling `.bin`.
    #[clap(short, long, default_value = "scene.glb")]
    output: PathBuf,

    /// Grid resolution (or sphere count per axis)
    #[clap(short, long, default_value_t = 32)]
    size: usize,

    /// Icosphere subdivision level
    #[clap(short, long, default_value_t = 2)]
    detail: u32,

    /// Place spheres as nodes instead of GPU instances
    #[clap(long)]
    no_instancing: bool,
}

fn height(x: f32, y: f32) -> f32 {
    (x * TAU).sin() * (y * TAU).cos() * 0.15
}

fn terrain(writer: &mut GltfWriter, size: usize) -> Result<(), Report> {
    let size = size.max(2);
    let mut mesh = MeshAssembly::new("terrain");
    mesh.set_material(Some(writer.new_default_material("terrain")));

    let mut grid = Grid::new(size, size);
    for (x, y) in itertools::iproduct!(0..size, 0..size) {
        let (u, v) = (x as f32 / (size - 1) as f32, y as f32 / (size - 1) as f32);
        let h = height(u, v);
        let color = Rgba8::from_hsb(0.33 - h, 0.6, 0.5 + h * 2.0);
        let id = mesh
            .new_colored_vertex(Vec3::new(u, h, v), Some(color))
            .context("terrain vertex")?;
        grid.set(x, y, Some(id));
    }
    mesh.add_plane(&grid, false).context("terrain grid")?;
    mesh.build(writer).context("Failed to build terrain")?;
    Ok(())
}

fn torus(writer: &mut GltfWriter, size: usize) -> Result<(), Report> {
    let size = size.max(3);
    let (major, minor) = (1.0, 0.3);
    let mut mesh = MeshAssembly::new("torus");
    mesh.set_material(Some(writer.new_texture_material("torus", "torus.png")));

    let mut grid = Grid::new(size, size);
    for (x, y) in itertools::iproduct!(0..size, 0..size) {
        let u = x as f32 / size as f32 * TAU;
        let v = y as f32 / size as f32 * TAU;
        let ring = major + minor * v.cos();
        let position = Vec3::new(ring * u.cos(), minor * v.sin(), ring * u.sin());
        grid.set(x, y, Some(mesh.new_vertex(position).context("torus vertex")?));
    }
    mesh.add_manifold(&grid, true).context("torus grid")?;
    mesh.build(writer).context("Failed to build torus")?;
    Ok(())
}

fn spheres(writer: &mut GltfWriter, size: usize, detail: u32, instanced: bool) -> Result<(), Report> {
    let options = SphereFactoryOptions::builder()
        .detail(detail)
        .maybe_instancing(instanced.then_some(RotationEncoding::QuantizedByte))
        .build();
    let mut factory = SphereFactory::new(writer, options);

    let palette = [Rgba8::RED, Rgba8::GREEN, Rgba8::BLUE];
    for (i, (x, z)) in itertools::iproduct!(0..size, 0..size).enumerate() {
        let position = Vec3::new(x as f32, height(x as f32 * 0.1, z as f32 * 0.1), z as f32);
        let color = palette[i % palette.len()].with_alpha(0.6);
        let event_id = format!("event-{i:05}");
        factory
            .add_sphere(writer, position, 0.3, color, Some(&event_id))
            .context("Failed to add sphere")?;
    }
    factory.finish(writer).context("Failed to emit sphere instances")?;
    Ok(())
}

fn pipe(writer: &mut GltfWriter, size: usize) -> Result<(), Report> {
    let mut mesh = MeshAssembly::new("pipe");
    mesh.set_material(Some(writer.new_default_material("pipe")));

    let steps = size.max(2);
    let points: Vec<PipePoint> = (0..steps)
        .map(|i| {
            let t = i as f32 / (steps - 1) as f32;
            let angle = t * 2.0 * TAU;
            let position = Vec3::new(angle.cos(), t * 2.0, angle.sin());
            PipePoint::new(position, Rgba8::from_hsb(t, 0.8, 0.9))
        })
        .collect();
    let options = PipeOptions::builder().radius(0.1).sides(12).build();
    mesh.add_pipe(&points, &options).context("Failed to extrude pipe")?;
    mesh.build(writer).context("Failed to build pipe")?;
    Ok(())
}

fn icosphere(writer: &mut GltfWriter, detail: u32) -> Result<(), Report> {
    let options = IcosphereOptions::builder()
        .max_detail(detail)
        .color(Rgba8::rgb(80, 160, 255))
        .patterned(true)
        .build();
    let mut builder = IcosphereBuilder::new("icosphere", options);
    builder
        .mesh_mut()
        .set_material(Some(writer.new_default_material("icosphere")));
    builder.add_icosphere().context("Failed to subdivide icosphere")?;
    builder.build(writer).context("Failed to build icosphere")?;
    Ok(())
}

fn main() -> Result<(), Report> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut writer = GltfWriter::new();

    match args.scene {
        Scene::Terrain => terrain(&mut writer, args.size)?,
        Scene::Torus => torus(&mut writer, args.size)?,
        Scene::Spheres => spheres(&mut writer, args.size, args.detail, !args.no_instancing)?,
        Scene::Pipe => pipe(&mut writer, args.size)?,
        Scene::Icosphere => icosphere(&mut writer, args.detail)?,
    }

    info!(scene = ?args.scene, output = %args.output.display(), "writing");
    writer
        .write_file(&args.output)
        .context("Failed to write output")?;
    Ok(())
}
