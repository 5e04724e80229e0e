//! In-memory glTF document plus its single binary buffer, written out as GLB
//! or as `.gltf` with a sibling `.bin`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use glam::Vec3;
use gltf_json as json;
use json::validation::Checked::Valid;
use json::validation::USize64;
use rootcause::Report;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::buffer::{
    AccessorId, AccessorRecord, Arity, AssetSink, AttributeSemantic, BufferTarget,
    BufferViewRecord, ComponentType, MaterialId, MeshId, NodeId, PrimitiveRecord, TopologyMode,
    ViewId, pad_to_4,
};
use crate::color::Rgba8;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("shared buffer is empty, nothing to write")]
    EmptyBuffer,
    #[error("unsupported output extension: {0}")]
    UnsupportedExtension(String),
    #[error("glTF serialization error: {0}")]
    Serialize(String),
    #[error("I/O error: {0}")]
    Io(String),
}

/// Alpha handling applied to materials created after it is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    #[default]
    Opaque,
    OpaqueDoubleSided,
    /// Alpha-tested at 0.5, double sided.
    Mask,
    Blend,
    BlendDoubleSided,
}

const DEFAULT_GENERATOR: &str = concat!("procmesh ", env!("CARGO_PKG_VERSION"));

/// Accumulates a glTF document and its binary buffer.
///
/// Implements [`AssetSink`], so mesh builders pack straight into it. The
/// writer also keeps its own copy of every view, accessor and primitive
/// record for inspection.
#[derive(Debug, Clone)]
pub struct GltfWriter {
    root: json::Root,
    bin: Vec<u8>,
    views: Vec<BufferViewRecord>,
    accessors: Vec<AccessorRecord>,
    primitives: Vec<Vec<PrimitiveRecord>>,
    alpha_mode: AlphaMode,
    generator: String,
    copyright: Option<String>,
}

impl Default for GltfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl GltfWriter {
    pub fn new() -> Self {
        Self {
            root: json::Root::default(),
            bin: Vec::new(),
            views: Vec::new(),
            accessors: Vec::new(),
            primitives: Vec::new(),
            alpha_mode: AlphaMode::default(),
            generator: DEFAULT_GENERATOR.to_string(),
            copyright: None,
        }
    }

    pub fn root(&self) -> &json::Root {
        &self.root
    }

    pub fn bin(&self) -> &[u8] {
        &self.bin
    }

    pub fn buffer_views(&self) -> &[BufferViewRecord] {
        &self.views
    }

    pub fn accessors(&self) -> &[AccessorRecord] {
        &self.accessors
    }

    /// Primitive records bound to `mesh`, in binding order.
    pub fn primitives(&self, mesh: MeshId) -> &[PrimitiveRecord] {
        self.primitives
            .get(mesh.value())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    pub fn set_alpha_mode(&mut self, alpha_mode: AlphaMode) {
        self.alpha_mode = alpha_mode;
    }

    pub fn set_generator(&mut self, generator: impl Into<String>) {
        self.generator = generator.into();
    }

    pub fn set_copyright(&mut self, copyright: Option<String>) {
        self.copyright = copyright;
    }

    /// Registers an extension in `extensionsUsed`, and in
    /// `extensionsRequired` when `required`. Repeated calls are harmless.
    pub fn use_extension(&mut self, name: &str, required: bool) {
        if !self.root.extensions_used.iter().any(|used| used == name) {
            info!(extension = name, required, "adding extension");
            self.root.extensions_used.push(name.to_string());
        }
        if required && !self.root.extensions_required.iter().any(|r| r == name) {
            self.root.extensions_required.push(name.to_string());
        }
    }

    pub fn set_root_extension(&mut self, name: &str, payload: Value) {
        self.root
            .extensions
            .get_or_insert_with(Default::default)
            .others
            .insert(name.to_string(), payload);
    }

    pub fn set_node_extension(&mut self, node: NodeId, name: &str, payload: Value) {
        if let Some(node) = self.root.nodes.get_mut(node.value()) {
            node.extensions
                .get_or_insert_with(Default::default)
                .others
                .insert(name.to_string(), payload);
        }
    }

    pub fn set_node_extras(&mut self, node: NodeId, extras: &Value) {
        let Some(node) = self.root.nodes.get_mut(node.value()) else {
            return;
        };
        match serde_json::value::to_raw_value(extras) {
            Ok(raw) => node.extras = Some(raw),
            Err(err) => warn!(%err, "could not encode node extras"),
        }
    }

    /// A node with a translation and scale, such as one placed sphere.
    pub fn add_transformed_node(
        &mut self,
        name: &str,
        mesh: MeshId,
        translation: Vec3,
        scale: Vec3,
    ) -> NodeId {
        let node = self.add_node(name, mesh);
        if let Some(json_node) = self.root.nodes.get_mut(node.value()) {
            json_node.translation = Some(translation.to_array());
            json_node.scale = Some(scale.to_array());
        }
        node
    }

    /// A new mesh sharing every accessor of `source`'s primitives but using
    /// `material`.
    pub fn copy_mesh_with_material(&mut self, source: MeshId, material: MaterialId) -> MeshId {
        let name = self
            .root
            .meshes
            .get(source.value())
            .and_then(|mesh| mesh.name.clone())
            .unwrap_or_default();
        let copy = self.allocate_mesh(&format!("{name}[{}]", self.root.meshes.len()));
        debug!(source = source.0, copy = copy.0, "copying mesh");

        for primitive in self.primitives(source).to_vec() {
            self.bind_primitive(
                copy,
                PrimitiveRecord {
                    material: Some(material),
                    ..primitive
                },
            );
        }
        copy
    }

    fn push_material(&mut self, material: json::Material) -> MaterialId {
        let index = self.root.materials.len();
        let name = material.name.clone().unwrap_or_default();
        let material = json::Material {
            name: Some(format!("{name}[{index}]")),
            ..material
        };
        MaterialId(self.root.push(material).value() as u32)
    }

    fn alpha_settings(&self) -> (json::material::AlphaMode, Option<json::material::AlphaCutoff>, bool) {
        use json::material::AlphaMode as Mode;
        match self.alpha_mode {
            AlphaMode::Opaque => (Mode::Opaque, None, false),
            AlphaMode::OpaqueDoubleSided => (Mode::Opaque, None, true),
            AlphaMode::Mask => (Mode::Mask, Some(json::material::AlphaCutoff(0.5)), true),
            AlphaMode::Blend => (Mode::Blend, None, false),
            AlphaMode::BlendDoubleSided => (Mode::Blend, None, true),
        }
    }

    fn pbr_material(
        &mut self,
        name: &str,
        metallic: f32,
        roughness: f32,
        base_color: Rgba8,
        base_color_texture: Option<json::texture::Info>,
    ) -> MaterialId {
        let (alpha_mode, alpha_cutoff, double_sided) = self.alpha_settings();
        self.push_material(json::Material {
            name: Some(name.to_string()),
            alpha_mode: Valid(alpha_mode),
            alpha_cutoff,
            double_sided,
            pbr_metallic_roughness: json::material::PbrMetallicRoughness {
                base_color_factor: json::material::PbrBaseColorFactor(base_color.to_unit_rgba()),
                base_color_texture,
                metallic_factor: json::material::StrengthFactor(metallic),
                roughness_factor: json::material::StrengthFactor(roughness),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    /// Untextured material with metallic 0.5 and roughness 0.75.
    pub fn new_default_material(&mut self, name: &str) -> MaterialId {
        self.pbr_material(name, 0.5, 0.75, Rgba8::WHITE, None)
    }

    pub fn new_blend_material(
        &mut self,
        name: &str,
        metallic: f32,
        roughness: f32,
        color: Rgba8,
    ) -> MaterialId {
        self.pbr_material(name, metallic, roughness, color, None)
    }

    /// Material whose base color comes from an image referenced by `uri`.
    pub fn new_texture_material(&mut self, name: &str, uri: &str) -> MaterialId {
        let image = self.root.push(json::Image {
            buffer_view: None,
            mime_type: None,
            uri: Some(uri.to_string()),
            name: Some(format!("{name}-image")),
            extensions: Default::default(),
            extras: Default::default(),
        });

        let sampler = self.root.push(json::texture::Sampler {
            mag_filter: Some(Valid(json::texture::MagFilter::Linear)),
            min_filter: Some(Valid(json::texture::MinFilter::Linear)),
            wrap_s: Valid(json::texture::WrappingMode::ClampToEdge),
            wrap_t: Valid(json::texture::WrappingMode::ClampToEdge),
            name: None,
            extensions: Default::default(),
            extras: Default::default(),
        });

        let texture = self.root.push(json::Texture {
            source: image,
            sampler: Some(sampler),
            name: Some(format!("{name}-texture")),
            extensions: Default::default(),
            extras: Default::default(),
        });

        let info = json::texture::Info {
            index: texture,
            tex_coord: 0,
            extensions: Default::default(),
            extras: Default::default(),
        };
        self.pbr_material(name, 0.5, 0.75, Rgba8::WHITE, Some(info))
    }

    /// The document as it will be written, with the buffer record, scene
    /// and asset metadata filled in.
    fn finished_root(&self, bin_uri: Option<String>) -> Result<json::Root, Report<WriteError>> {
        if self.bin.is_empty() {
            return Err(Report::new(WriteError::EmptyBuffer));
        }

        let mut root = self.root.clone();
        root.asset = json::Asset {
            generator: Some(self.generator.clone()),
            copyright: self.copyright.clone(),
            ..Default::default()
        };

        let byte_length = self.bin.len().next_multiple_of(4);
        root.push(json::Buffer {
            byte_length: USize64(byte_length as u64),
            uri: bin_uri,
            name: None,
            extensions: Default::default(),
            extras: Default::default(),
        });

        let nodes = (0..root.nodes.len() as u32).map(json::Index::new).collect();
        let scene = root.push(json::Scene {
            nodes,
            name: None,
            extensions: Default::default(),
            extras: Default::default(),
        });
        root.scene = Some(scene);
        Ok(root)
    }

    fn padded_bin(&self) -> Vec<u8> {
        let mut bin = self.bin.clone();
        pad_to_4(&mut bin);
        bin
    }

    pub fn write_glb(&self, writer: &mut impl Write) -> Result<(), Report<WriteError>> {
        let root = self.finished_root(None)?;
        let json_string = json::serialize::to_string(&root)
            .map_err(|e| Report::new(WriteError::Serialize(e.to_string())))?;

        let glb = gltf::binary::Glb {
            header: gltf::binary::Header {
                magic: *b"glTF",
                version: 2,
                length: 0, // to_writer computes this
            },
            json: Cow::Owned(json_string.into_bytes()),
            bin: Some(Cow::Owned(self.padded_bin())),
        };

        glb.to_writer(writer)
            .map_err(|e| Report::new(WriteError::Io(e.to_string())))?;
        Ok(())
    }

    /// Writes the JSON document, referencing the binary buffer at `bin_uri`.
    /// Storing the buffer there is up to the caller.
    pub fn write_gltf(&self, writer: &mut impl Write, bin_uri: &str) -> Result<(), Report<WriteError>> {
        let root = self.finished_root(Some(bin_uri.to_string()))?;
        serde_json::to_writer_pretty(&mut *writer, &root)
            .map_err(|e| Report::new(WriteError::Serialize(e.to_string())))?;
        Ok(())
    }

    /// Writes `path` as GLB (`.glb`) or as JSON plus a sibling `.bin`
    /// (`.gltf`).
    pub fn write_file(&self, path: &Path) -> Result<(), Report<WriteError>> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "glb" => {
                let mut out = create(path)?;
                self.write_glb(&mut out)?;
                out.flush().map_err(io_error)?;
            }
            "gltf" => {
                let bin_path = path.with_extension("bin");
                let bin_uri = bin_path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("buffer.bin")
                    .to_string();

                let mut out = create(path)?;
                self.write_gltf(&mut out, &bin_uri)?;
                out.flush().map_err(io_error)?;

                std::fs::write(&bin_path, self.padded_bin()).map_err(io_error)?;
            }
            other => {
                return Err(Report::new(WriteError::UnsupportedExtension(
                    other.to_string(),
                )));
            }
        }

        info!(path = %path.display(), bytes = self.bin.len(), "wrote glTF");
        Ok(())
    }
}

fn io_error(err: std::io::Error) -> Report<WriteError> {
    Report::new(WriteError::Io(err.to_string()))
}

fn create(path: &Path) -> Result<BufWriter<File>, Report<WriteError>> {
    File::create(path).map(BufWriter::new).map_err(io_error)
}

fn component_type(component_type: ComponentType) -> json::accessor::ComponentType {
    use json::accessor::ComponentType as Json;
    match component_type {
        ComponentType::I8 => Json::I8,
        ComponentType::U8 => Json::U8,
        ComponentType::I16 => Json::I16,
        ComponentType::U16 => Json::U16,
        ComponentType::U32 => Json::U32,
        ComponentType::F32 => Json::F32,
    }
}

fn accessor_type(arity: Arity) -> json::accessor::Type {
    match arity {
        Arity::Scalar => json::accessor::Type::Scalar,
        Arity::Vec2 => json::accessor::Type::Vec2,
        Arity::Vec3 => json::accessor::Type::Vec3,
        Arity::Vec4 => json::accessor::Type::Vec4,
    }
}

fn mode(mode: TopologyMode) -> json::mesh::Mode {
    use json::mesh::Mode;
    match mode {
        TopologyMode::Points => Mode::Points,
        TopologyMode::Lines => Mode::Lines,
        TopologyMode::LineLoop => Mode::LineLoop,
        TopologyMode::LineStrip => Mode::LineStrip,
        TopologyMode::Triangles => Mode::Triangles,
        TopologyMode::TriangleStrip => Mode::TriangleStrip,
        TopologyMode::TriangleFan => Mode::TriangleFan,
    }
}

fn semantic(semantic: AttributeSemantic) -> json::mesh::Semantic {
    use json::mesh::Semantic;
    match semantic {
        AttributeSemantic::Position => Semantic::Positions,
        AttributeSemantic::Normal => Semantic::Normals,
        AttributeSemantic::Tangent => Semantic::Tangents,
        AttributeSemantic::TexCoord0 => Semantic::TexCoords(0),
        AttributeSemantic::Color0 => Semantic::Colors(0),
    }
}

impl AssetSink for GltfWriter {
    fn shared_buffer_append(&mut self, bytes: &[u8]) -> u64 {
        let offset = self.bin.len() as u64;
        self.bin.extend_from_slice(bytes);
        offset
    }

    fn append_buffer_view(&mut self, view: BufferViewRecord) -> ViewId {
        let index = self.root.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: USize64(view.byte_length),
            byte_offset: Some(USize64(view.byte_offset)),
            byte_stride: view
                .byte_stride
                .map(|stride| json::buffer::Stride(stride as usize)),
            target: view.target.map(|target| {
                Valid(match target {
                    BufferTarget::ArrayBuffer => json::buffer::Target::ArrayBuffer,
                    BufferTarget::ElementArrayBuffer => json::buffer::Target::ElementArrayBuffer,
                })
            }),
            name: view.name.clone(),
            extensions: Default::default(),
            extras: Default::default(),
        });
        self.views.push(view);
        ViewId(index.value() as u32)
    }

    fn append_accessor(&mut self, accessor: AccessorRecord) -> AccessorId {
        let index = self.root.push(json::Accessor {
            buffer_view: Some(json::Index::new(accessor.view.0)),
            byte_offset: Some(USize64(0)),
            count: USize64(accessor.count),
            component_type: Valid(json::accessor::GenericComponentType(component_type(
                accessor.component_type,
            ))),
            type_: Valid(accessor_type(accessor.arity)),
            min: accessor.min.clone(),
            max: accessor.max.clone(),
            name: accessor.name.clone(),
            normalized: accessor.normalized,
            sparse: None,
            extensions: Default::default(),
            extras: Default::default(),
        });
        self.accessors.push(accessor);
        AccessorId(index.value() as u32)
    }

    fn allocate_mesh(&mut self, name: &str) -> MeshId {
        let index = self.root.push(json::Mesh {
            primitives: Vec::new(),
            weights: None,
            name: Some(name.to_string()),
            extensions: Default::default(),
            extras: Default::default(),
        });
        self.primitives.push(Vec::new());
        debug!(mesh = name, index = index.value(), "allocated mesh");
        MeshId(index.value() as u32)
    }

    fn bind_primitive(&mut self, mesh: MeshId, primitive: PrimitiveRecord) {
        let Some(json_mesh) = self.root.meshes.get_mut(mesh.value()) else {
            warn!(mesh = mesh.0, "primitive bound to unknown mesh");
            return;
        };

        let attributes: BTreeMap<_, _> = primitive
            .attributes
            .iter()
            .map(|&(sem, accessor)| (Valid(semantic(sem)), json::Index::new(accessor.0)))
            .collect();

        json_mesh.primitives.push(json::mesh::Primitive {
            attributes,
            indices: primitive.indices.map(|id| json::Index::new(id.0)),
            material: primitive.material.map(|id| json::Index::new(id.0)),
            mode: Valid(mode(primitive.mode)),
            targets: None,
            extensions: Default::default(),
            extras: Default::default(),
        });
        self.primitives[mesh.value()].push(primitive);
    }

    fn add_node(&mut self, name: &str, mesh: MeshId) -> NodeId {
        let index = self.root.push(json::Node {
            mesh: Some(json::Index::new(mesh.0)),
            name: Some(name.to_string()),
            ..Default::default()
        });
        debug!(node = name, index = index.value(), "added node");
        NodeId(index.value() as u32)
    }
}
