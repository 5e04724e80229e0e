//! String property tables for `EXT_structural_metadata` and the
//! `EXT_instance_features` link from instanced nodes to them.

use serde_json::{Value, json};
use tracing::debug;

use crate::buffer::{AssetSink, PackedStrings, StringTable};
use crate::error::BuildError;

pub const EXT_STRUCTURAL_METADATA: &str = "EXT_structural_metadata";
pub const EXT_INSTANCE_FEATURES: &str = "EXT_instance_features";

/// A metadata class with a single required `STRING` property, stored as one
/// property table.
#[derive(Debug, Clone)]
pub struct StringPropertyTable {
    schema_id: String,
    class: String,
    class_name: String,
    property: String,
    property_name: String,
    values: StringTable,
}

impl StringPropertyTable {
    pub fn new(class: &str, property: &str) -> Self {
        Self {
            schema_id: format!("{class}_schema"),
            class: class.to_string(),
            class_name: class.to_string(),
            property: property.to_string(),
            property_name: property.to_string(),
            values: StringTable::new(property),
        }
    }

    /// Display names written into the schema.
    pub fn with_names(mut self, class_name: &str, property_name: &str) -> Self {
        self.class_name = class_name.to_string();
        self.property_name = property_name.to_string();
        self
    }

    /// Appends a row and returns its feature id.
    pub fn add(&mut self, value: impl Into<String>) -> usize {
        self.values.add(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, feature_id: usize) -> Option<&str> {
        self.values.get(feature_id)
    }

    /// Packs the strings and returns the root extension payload, or `None`
    /// if the table is empty.
    pub fn pack(&self, sink: &mut impl AssetSink) -> Result<Option<Value>, BuildError> {
        let Some(packed) = self.values.pack(sink)? else {
            return Ok(None);
        };
        debug!(class = %self.class, rows = packed.count, "packed property table");
        Ok(Some(self.extension(&packed)))
    }

    fn extension(&self, packed: &PackedStrings) -> Value {
        let mut class_properties = serde_json::Map::new();
        class_properties.insert(
            self.property.clone(),
            json!({
                "name": self.property_name,
                "type": "STRING",
                "required": true,
            }),
        );
        let mut classes = serde_json::Map::new();
        classes.insert(
            self.class.clone(),
            json!({ "name": self.class_name, "properties": class_properties }),
        );

        let mut table_properties = serde_json::Map::new();
        table_properties.insert(
            self.property.clone(),
            json!({
                "values": packed.values.0,
                "stringOffsets": packed.offsets.0,
                "stringOffsetType": "UINT16",
            }),
        );

        json!({
            "schema": {
                "id": self.schema_id,
                "name": format!("{} Events", self.class_name),
                "classes": classes,
            },
            "propertyTables": [{
                "name": self.class_name,
                "class": self.class,
                "count": packed.count,
                "properties": table_properties,
            }],
        })
    }
}

/// `EXT_instance_features` payload linking `_FEATURE_ID_0` to a property
/// table.
pub fn instance_features(label: &str, feature_count: usize, property_table: usize) -> Value {
    json!({
        "featureIds": [{
            "label": label,
            "featureCount": feature_count,
            "attribute": 0,
            "propertyTable": property_table,
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::GltfWriter;

    #[test]
    fn test_empty_table_packs_nothing() {
        let mut writer = GltfWriter::new();
        let table = StringPropertyTable::new("sphere", "event_id");
        assert_eq!(table.pack(&mut writer).unwrap(), None);
        assert!(writer.bin().is_empty());
    }

    #[test]
    fn test_extension_payload() {
        let mut writer = GltfWriter::new();
        let mut table =
            StringPropertyTable::new("sphere", "event_id").with_names("Sphere", "Event ID");
        assert_eq!(table.add("first"), 0);
        assert_eq!(table.add("second"), 1);

        let ext = table.pack(&mut writer).unwrap().unwrap();
        assert_eq!(ext["schema"]["classes"]["sphere"]["name"], "Sphere");
        assert_eq!(
            ext["schema"]["classes"]["sphere"]["properties"]["event_id"]["type"],
            "STRING"
        );
        let table_json = &ext["propertyTables"][0];
        assert_eq!(table_json["class"], "sphere");
        assert_eq!(table_json["count"], 2);
        assert_eq!(table_json["properties"]["event_id"]["values"], 0);
        assert_eq!(table_json["properties"]["event_id"]["stringOffsets"], 1);
        assert_eq!(table_json["properties"]["event_id"]["stringOffsetType"], "UINT16");
    }

    #[test]
    fn test_instance_features() {
        let ext = instance_features("eventId", 3, 0);
        assert_eq!(ext["featureIds"][0]["featureCount"], 3);
        assert_eq!(ext["featureIds"][0]["propertyTable"], 0);
        assert_eq!(ext["featureIds"][0]["label"], "eventId");
    }
}
