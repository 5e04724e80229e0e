//! Many spheres sharing a handful of icosphere meshes, placed either as one
//! node each or as GPU instances.

use std::collections::{BTreeMap, HashMap};

use bon::Builder;
use glam::{Mat4, Quat, Vec3};
use serde_json::json;
use tracing::debug;

use super::gltf_writer::{AlphaMode, GltfWriter};
use crate::buffer::{AssetSink, MaterialId, MeshId};
use crate::color::Rgba8;
use crate::error::BuildError;
use crate::ext::{
    EXT_INSTANCE_FEATURES, EXT_MESH_GPU_INSTANCING, EXT_STRUCTURAL_METADATA, InstanceAttributes,
    RotationEncoding, StringPropertyTable, instance_features,
};
use crate::models::{IcosphereBuilder, IcosphereOptions};

#[derive(Debug, Clone, Copy, PartialEq, Builder)]
pub struct SphereFactoryOptions {
    /// Subdivision level of the shared sphere meshes.
    #[builder(default = 2)]
    pub detail: u32,
    /// Applied to every sphere position.
    #[builder(default = Mat4::IDENTITY)]
    pub transform: Mat4,
    /// `None` places one node per sphere.
    pub instancing: Option<RotationEncoding>,
}

impl Default for SphereFactoryOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub struct SphereFactory {
    options: SphereFactoryOptions,
    meshes: HashMap<(Rgba8, u32), MeshId>,
    base_meshes: HashMap<u32, MeshId>,
    instances: BTreeMap<MeshId, InstanceAttributes>,
    events: StringPropertyTable,
    spheres: usize,
}

impl SphereFactory {
    /// Sphere materials are translucent, so this switches `writer` to
    /// blended alpha.
    pub fn new(writer: &mut GltfWriter, options: SphereFactoryOptions) -> Self {
        writer.set_alpha_mode(AlphaMode::Blend);
        Self {
            options,
            meshes: HashMap::new(),
            base_meshes: HashMap::new(),
            instances: BTreeMap::new(),
            events: StringPropertyTable::new("sphere", "event_id").with_names("Sphere", "Event ID"),
            spheres: 0,
        }
    }

    pub fn options(&self) -> &SphereFactoryOptions {
        &self.options
    }

    /// Number of spheres added so far.
    pub fn len(&self) -> usize {
        self.spheres
    }

    pub fn is_empty(&self) -> bool {
        self.spheres == 0
    }

    /// The mesh for `color` at `lod`, building the icosphere the first time
    /// a detail level is seen and copying it with a new material after that.
    pub fn mesh_for(
        &mut self,
        writer: &mut GltfWriter,
        color: Rgba8,
        lod: u32,
    ) -> Result<MeshId, BuildError> {
        if let Some(&mesh) = self.meshes.get(&(color, lod)) {
            return Ok(mesh);
        }

        let mesh = match self.base_meshes.get(&lod) {
            Some(&base) => {
                let material = writer.new_blend_material("sphere", 0.7, 0.5, color);
                writer.copy_mesh_with_material(base, material)
            }
            None => {
                let options = IcosphereOptions::builder().max_detail(lod).build();
                let mut builder = IcosphereBuilder::new(format!("sphere({lod})"), options);
                builder.add_icosphere()?;
                // the primitive refers to the next material slot, which is
                // only filled once the mesh has been packed
                let material = MaterialId(writer.root().materials.len() as u32);
                builder.mesh_mut().set_material(Some(material));
                let mesh = builder.build_mesh(writer)?;
                let created = writer.new_blend_material("sphere", 0.7, 0.5, color);
                debug_assert_eq!(created, material);
                self.base_meshes.insert(lod, mesh);
                mesh
            }
        };

        debug!(?color, lod, mesh = mesh.0, "new sphere mesh");
        self.meshes.insert((color, lod), mesh);
        Ok(mesh)
    }

    pub fn add_sphere(
        &mut self,
        writer: &mut GltfWriter,
        position: Vec3,
        radius: f32,
        color: Rgba8,
        event_id: Option<&str>,
    ) -> Result<(), BuildError> {
        let mesh = self.mesh_for(writer, color, self.options.detail)?;
        let translation = self.options.transform.transform_point3(position);
        if !translation.is_finite() {
            return Err(BuildError::InvalidGeometry {
                position: position.to_array(),
                stage: "transformed",
            });
        }
        let scale = Vec3::splat(radius);

        match self.options.instancing {
            None => {
                let name = format!("sphere[{}]-node", self.spheres);
                let node = writer.add_transformed_node(&name, mesh, translation, scale);
                if let Some(event_id) = event_id {
                    writer.set_node_extras(node, &json!({ "eventId": event_id }));
                }
            }
            Some(encoding) => {
                let feature_id = match event_id {
                    Some(event_id) => {
                        let row = self.events.add(event_id);
                        let row = u16::try_from(row)
                            .map_err(|_| BuildError::IndexOverflow { index: row as u32 })?;
                        Some(row)
                    }
                    None => None,
                };
                self.instances
                    .entry(mesh)
                    .or_insert_with(|| InstanceAttributes::new(&format!("sphere-{}", mesh.0), encoding))
                    .add(translation, Quat::IDENTITY, scale, feature_id);
            }
        }

        self.spheres += 1;
        Ok(())
    }

    /// Emits the instanced nodes and the event id table. Does nothing in
    /// node-per-sphere mode.
    ///
    /// Every instance stream is checked before anything is written, so on
    /// error the writer is untouched and the pending instances are kept.
    pub fn finish(&mut self, writer: &mut GltfWriter) -> Result<(), BuildError> {
        if self.instances.is_empty() {
            return Ok(());
        }
        for instances in self.instances.values() {
            instances.validate()?;
        }

        let has_table = match self.events.pack(writer)? {
            Some(payload) => {
                writer.use_extension(EXT_STRUCTURAL_METADATA, false);
                writer.set_root_extension(EXT_STRUCTURAL_METADATA, payload);
                true
            }
            None => false,
        };
        writer.use_extension(EXT_MESH_GPU_INSTANCING, true);

        for (&mesh, instances) in &self.instances {
            let packed = instances.pack(writer)?;
            let mesh_name = writer
                .root()
                .meshes
                .get(mesh.value())
                .and_then(|m| m.name.clone())
                .unwrap_or_default();
            let name = format!("{mesh_name}[{}]_node", writer.root().nodes.len());
            let node = writer.add_node(&name, mesh);
            writer.set_node_extension(node, EXT_MESH_GPU_INSTANCING, packed.to_extension());

            let has_features = packed
                .attributes
                .iter()
                .any(|(name, _)| *name == "_FEATURE_ID_0");
            if has_table && has_features {
                writer.use_extension(EXT_INSTANCE_FEATURES, false);
                writer.set_node_extension(
                    node,
                    EXT_INSTANCE_FEATURES,
                    instance_features("eventId", instances.len(), 0),
                );
            }
            debug!(node = name, instances = instances.len(), "instanced sphere node");
        }
        self.instances.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_meshes_shared_per_color_and_detail() {
        let mut writer = GltfWriter::new();
        let options = SphereFactoryOptions::builder().detail(1).build();
        let mut factory = SphereFactory::new(&mut writer, options);
        assert_eq!(writer.alpha_mode(), AlphaMode::Blend);

        let red = factory.mesh_for(&mut writer, Rgba8::RED, 1).unwrap();
        let accessors = writer.accessors().len();
        assert_eq!(factory.mesh_for(&mut writer, Rgba8::RED, 1).unwrap(), red);

        let blue = factory.mesh_for(&mut writer, Rgba8::BLUE, 1).unwrap();
        assert_ne!(blue, red);
        // a new color only adds a mesh and a material
        assert_eq!(writer.accessors().len(), accessors);
        assert_eq!(writer.root().materials.len(), 2);
        assert_eq!(
            writer.primitives(red)[0].attributes,
            writer.primitives(blue)[0].attributes
        );

        factory.mesh_for(&mut writer, Rgba8::RED, 0).unwrap();
        assert!(writer.accessors().len() > accessors);
    }

    #[test]
    fn test_node_per_sphere() {
        let mut writer = GltfWriter::new();
        let mut factory = SphereFactory::new(&mut writer, SphereFactoryOptions::default());
        factory
            .add_sphere(&mut writer, Vec3::new(1.0, 2.0, 3.0), 0.5, Rgba8::RED, Some("evt-1"))
            .unwrap();
        factory
            .add_sphere(&mut writer, Vec3::ZERO, 2.0, Rgba8::GREEN, None)
            .unwrap();
        factory.finish(&mut writer).unwrap();

        assert_eq!(factory.len(), 2);
        let root = serde_json::to_value(writer.root()).unwrap();
        let nodes = root["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0]["name"], "sphere[0]-node");
        assert_eq!(nodes[0]["translation"], json!([1.0, 2.0, 3.0]));
        assert_eq!(nodes[0]["scale"], json!([0.5, 0.5, 0.5]));
        assert_eq!(nodes[0]["extras"]["eventId"], "evt-1");
        assert_eq!(nodes[1]["extras"], Value::Null);
        assert!(writer.root().extensions_used.is_empty());
    }

    #[test]
    fn test_instanced_spheres_with_events() {
        let mut writer = GltfWriter::new();
        let options = SphereFactoryOptions::builder()
            .detail(1)
            .instancing(RotationEncoding::Float)
            .transform(Mat4::from_translation(Vec3::X))
            .build();
        let mut factory = SphereFactory::new(&mut writer, options);
        factory
            .add_sphere(&mut writer, Vec3::ZERO, 1.0, Rgba8::RED, Some("a"))
            .unwrap();
        factory
            .add_sphere(&mut writer, Vec3::Y, 1.0, Rgba8::RED, Some("b"))
            .unwrap();
        factory
            .add_sphere(&mut writer, Vec3::Z, 1.0, Rgba8::BLUE, Some("c"))
            .unwrap();
        factory.finish(&mut writer).unwrap();

        let root = writer.root();
        assert_eq!(root.nodes.len(), 2);
        assert_eq!(root.extensions_required, vec![EXT_MESH_GPU_INSTANCING]);
        for extension in [EXT_MESH_GPU_INSTANCING, EXT_INSTANCE_FEATURES, EXT_STRUCTURAL_METADATA] {
            assert!(root.extensions_used.iter().any(|used| used == extension));
        }

        let value = serde_json::to_value(root).unwrap();
        assert_eq!(value["extensions"][EXT_STRUCTURAL_METADATA]["propertyTables"][0]["count"], 3);

        let first = &value["nodes"][0];
        assert_eq!(first["name"], "sphere(1)-mesh[0]_node");
        assert_eq!(first["extensions"][EXT_INSTANCE_FEATURES]["featureIds"][0]["featureCount"], 2);
        let translation = first["extensions"][EXT_MESH_GPU_INSTANCING]["attributes"]["TRANSLATION"]
            .as_u64()
            .unwrap() as usize;
        let accessor = &writer.accessors()[translation];
        assert_eq!(accessor.count, 2);
        assert_eq!(accessor.min, Some(json!([1.0, 0.0, 0.0])));
        assert_eq!(accessor.max, Some(json!([1.0, 1.0, 0.0])));

        let second = &value["nodes"][1];
        assert_eq!(second["extensions"][EXT_INSTANCE_FEATURES]["featureIds"][0]["featureCount"], 1);
    }

    #[test]
    fn test_failed_sphere_mesh_leaves_no_material() {
        let mut writer = GltfWriter::new();
        let mut factory = SphereFactory::new(&mut writer, SphereFactoryOptions::default());
        // seven subdivisions need more vertices than u16 indices can address
        assert!(matches!(
            factory.mesh_for(&mut writer, Rgba8::RED, 7),
            Err(BuildError::IndexOverflow { .. })
        ));
        assert!(writer.root().materials.is_empty());
        assert!(writer.root().meshes.is_empty());
        assert!(writer.bin().is_empty());

        let mesh = factory.mesh_for(&mut writer, Rgba8::RED, 1).unwrap();
        assert_eq!(writer.root().materials.len(), 1);
        assert_eq!(writer.primitives(mesh)[0].material, Some(MaterialId(0)));
    }

    #[test]
    fn test_failed_finish_keeps_pending_instances() {
        let mut writer = GltfWriter::new();
        let options = SphereFactoryOptions::builder()
            .detail(0)
            .instancing(RotationEncoding::Float)
            .build();
        let mut factory = SphereFactory::new(&mut writer, options);
        factory
            .add_sphere(&mut writer, Vec3::ZERO, 1.0, Rgba8::GREEN, Some("a"))
            .unwrap();
        factory
            .add_sphere(&mut writer, Vec3::X, 1.0, Rgba8::RED, None)
            .unwrap();
        factory
            .add_sphere(&mut writer, Vec3::Y, 1.0, Rgba8::RED, Some("b"))
            .unwrap();

        let bin_len = writer.bin().len();
        let views = writer.buffer_views().len();
        for _ in 0..2 {
            assert!(matches!(
                factory.finish(&mut writer),
                Err(BuildError::PartialAttributeCoverage { .. })
            ));
            assert_eq!(writer.bin().len(), bin_len);
            assert_eq!(writer.buffer_views().len(), views);
            assert!(writer.root().nodes.is_empty());
            assert!(writer.root().extensions_used.is_empty());
        }
    }

    #[test]
    fn test_finish_without_spheres_is_a_no_op() {
        let mut writer = GltfWriter::new();
        let options = SphereFactoryOptions::builder()
            .instancing(RotationEncoding::QuantizedByte)
            .build();
        let mut factory = SphereFactory::new(&mut writer, options);
        factory.finish(&mut writer).unwrap();
        assert!(factory.is_empty());
        assert!(writer.bin().is_empty());
        assert!(writer.root().extensions_used.is_empty());
    }
}
