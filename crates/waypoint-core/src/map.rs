//! Exit-zone discovery from the Tiled map document.
//!
//! The host hands over the map as untyped JSON. [`MapDocument::from_value`]
//! turns it into a typed view in one pass: the root must be an object whose
//! `layers` is an array, `null`, or absent, and everything below that is read
//! leniently. A layer, object, or property with an unexpected shape is
//! recorded as absent instead of failing the whole document, which keeps the
//! extractor tolerant of newer Tiled versions and hand-edited maps.
//!
//! [`extract_exit_zones`] then walks the navigation layer and yields one
//! [`ZoneDescriptor`] per valid exit object.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use waypoint_types::{ZoneDescriptor, ZoneName};

use crate::config::NavigationRules;
use crate::error::ExtractionError;
use crate::label::derive_label;

const OBJECT_GROUP: &str = "objectgroup";
const GROUP: &str = "group";

/// A value that is `None` when its JSON did not have the expected shape.
#[derive(Debug)]
struct Lenient<T>(Option<T>);

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self(T::deserialize(value).ok()))
    }
}

impl<T> Lenient<T> {
    const fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }
}

/// A list that may be missing or `null`; both read as empty.
fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// The parts of a Tiled map the controller reads.
#[derive(Debug, Deserialize)]
pub struct MapDocument {
    #[serde(default, deserialize_with = "nullable_list")]
    layers: Vec<Lenient<Layer>>,
}

#[derive(Debug, Deserialize)]
struct Layer {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    objects: Option<Vec<Lenient<MapObject>>>,
    /// Children of a group layer.
    #[serde(default, deserialize_with = "nullable_list")]
    layers: Vec<Lenient<Layer>>,
}

#[derive(Debug, Deserialize)]
struct MapObject {
    name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    /// Tiled 1.9 renamed `type` to `class`.
    #[serde(default)]
    class: Option<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    properties: Vec<Lenient<Property>>,
}

#[derive(Debug, Deserialize)]
struct Property {
    name: String,
    #[serde(default)]
    value: serde_json::Value,
}

impl MapDocument {
    /// Validate the document root and build the typed view.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::NotAnObject`] if the root is not a JSON
    /// object, or [`ExtractionError::Malformed`] if its `layers` field is
    /// neither an array nor `null`.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ExtractionError> {
        if !value.is_object() {
            return Err(ExtractionError::NotAnObject);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Depth-first search for the first object group named `name`.
    fn find_object_layer(&self, name: &str) -> Option<&Layer> {
        find_object_layer(&self.layers, name)
    }
}

fn find_object_layer<'a>(layers: &'a [Lenient<Layer>], name: &str) -> Option<&'a Layer> {
    layers.iter().filter_map(Lenient::get).find_map(|layer| {
        match layer.kind.as_deref() {
            Some(OBJECT_GROUP) if layer.name.as_deref() == Some(name) => Some(layer),
            Some(GROUP) => find_object_layer(&layer.layers, name),
            _ => None,
        }
    })
}

impl MapObject {
    fn has_kind(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind) || self.class.as_deref() == Some(kind)
    }

    /// First non-empty string value of the property called `name`.
    fn string_property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .filter_map(Lenient::get)
            .filter(|property| property.name == name)
            .find_map(|property| property.value.as_str())
            .filter(|value| !value.is_empty())
    }

    fn to_exit_zone(&self, rules: &NavigationRules) -> Option<ZoneDescriptor> {
        if self.name.is_empty() || !self.has_kind(&rules.area_type) {
            return None;
        }
        let url = rules
            .url_properties
            .iter()
            .find_map(|key| self.string_property(key))?;

        let mut label = derive_label(url);
        if label.is_empty() {
            label.clone_from(&self.name);
        }

        Some(ZoneDescriptor {
            name: ZoneName::new(self.name.as_str()),
            destination_url: url.to_owned(),
            destination_label: label,
        })
    }
}

/// Yield the exit zones of the navigation layer, in object order.
///
/// A missing layer or a layer without objects yields nothing. Objects that
/// are unnamed, of another kind, or have no destination URL are skipped.
pub fn extract_exit_zones<'a>(
    document: &'a MapDocument,
    rules: &'a NavigationRules,
) -> impl Iterator<Item = ZoneDescriptor> + 'a {
    document
        .find_object_layer(&rules.layer_name)
        .and_then(|layer| layer.objects.as_deref())
        .unwrap_or_default()
        .iter()
        .filter_map(Lenient::get)
        .filter_map(move |object| object.to_exit_zone(rules))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn zones(map: serde_json::Value) -> Vec<ZoneDescriptor> {
        let document = MapDocument::from_value(map).unwrap();
        extract_exit_zones(&document, &NavigationRules::default()).collect()
    }

    fn area(name: &str, properties: serde_json::Value) -> serde_json::Value {
        json!({ "name": name, "type": "area", "properties": properties })
    }

    fn nav_layer(objects: serde_json::Value) -> serde_json::Value {
        json!({ "layers": [
            { "type": "tilelayer", "name": "floor", "data": [] },
            { "type": "objectgroup", "name": "roomNavigation", "objects": objects }
        ]})
    }

    #[test]
    fn reads_target_url_zone() {
        let found = zones(nav_layer(json!([area(
            "door1",
            json!([{ "name": "targetUrl", "type": "string", "value": "forest.tmj" }])
        )])));
        assert_eq!(
            found,
            vec![ZoneDescriptor {
                name: ZoneName::from("door1"),
                destination_url: String::from("forest.tmj"),
                destination_label: String::from("forest"),
            }]
        );
    }

    #[test]
    fn missing_navigation_layer_yields_nothing() {
        assert!(zones(json!({ "layers": [] })).is_empty());
        assert!(zones(json!({})).is_empty());
        assert!(zones(json!({ "layers": [
            { "type": "tilelayer", "name": "roomNavigation" },
            { "type": "objectgroup", "name": "other", "objects": [area(
                "door1",
                json!([{ "name": "targetUrl", "value": "forest.tmj" }])
            )] }
        ]}))
        .is_empty());
    }

    #[test]
    fn layer_without_objects_yields_nothing() {
        assert!(zones(json!({ "layers": [
            { "type": "objectgroup", "name": "roomNavigation" }
        ]}))
        .is_empty());
        assert!(zones(json!({ "layers": [
            { "type": "objectgroup", "name": "roomNavigation", "objects": "nope" }
        ]}))
        .is_empty());
    }

    #[test]
    fn falls_back_to_legacy_exit_url() {
        let found = zones(nav_layer(json!([area(
            "door2",
            json!([{ "name": "exitUrl", "type": "string", "value": "Lobby-Area_2.tmj" }])
        )])));
        assert_eq!(found.len(), 1);
        assert_eq!(found.first().map(|z| z.destination_label.as_str()), Some("Lobby Area 2"));
    }

    #[test]
    fn target_url_wins_over_exit_url() {
        let found = zones(nav_layer(json!([area(
            "door",
            json!([
                { "name": "exitUrl", "value": "old.tmj" },
                { "name": "targetUrl", "value": "new.tmj" }
            ])
        )])));
        assert_eq!(found.first().map(|z| z.destination_url.as_str()), Some("new.tmj"));
    }

    #[test]
    fn skips_invalid_objects() {
        let found = zones(nav_layer(json!([
            // no URL at all
            area("plain", json!([{ "name": "color", "value": "red" }])),
            // URL is not a string
            area("numeric", json!([{ "name": "targetUrl", "type": "int", "value": 3 }])),
            // empty URL
            area("blank", json!([{ "name": "targetUrl", "value": "" }])),
            // wrong kind
            { "name": "spawn", "type": "start", "properties": [
                { "name": "targetUrl", "value": "x.tmj" }
            ] },
            // no name
            { "type": "area", "properties": [{ "name": "targetUrl", "value": "x.tmj" }] },
            // not even an object
            42,
            area("ok", json!([{ "name": "targetUrl", "value": "ok.tmj" }]))
        ])));
        let names: Vec<_> = found.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, vec!["ok"]);
    }

    #[test]
    fn keeps_object_order_and_duplicates() {
        let found = zones(nav_layer(json!([
            area("b", json!([{ "name": "targetUrl", "value": "b.tmj" }])),
            area("a", json!([{ "name": "targetUrl", "value": "a.tmj" }])),
            area("b", json!([{ "name": "targetUrl", "value": "c.tmj" }]))
        ])));
        let urls: Vec<_> = found.iter().map(|z| z.destination_url.as_str()).collect();
        assert_eq!(urls, vec!["b.tmj", "a.tmj", "c.tmj"]);
    }

    #[test]
    fn accepts_class_instead_of_type() {
        let found = zones(nav_layer(json!([
            { "name": "door", "class": "area", "properties": [
                { "name": "targetUrl", "value": "hall.tmj" }
            ] }
        ])));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn searches_group_layers() {
        let found = zones(json!({ "layers": [
            { "type": "group", "name": "meta", "layers": [
                { "type": "objectgroup", "name": "roomNavigation", "objects": [
                    area("door", json!([{ "name": "targetUrl", "value": "hall.tmj" }]))
                ] }
            ] }
        ]}));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn null_lists_read_as_empty() {
        assert!(zones(json!({ "layers": null })).is_empty());

        let found = zones(json!({ "layers": [
            { "type": "group", "name": "empty", "layers": null },
            { "type": "objectgroup", "name": "roomNavigation", "objects": [
                { "name": "bare", "type": "area", "properties": null },
                area("door", json!([{ "name": "targetUrl", "value": "hall.tmj" }]))
            ] }
        ]}));
        let names: Vec<_> = found.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, vec!["door"]);
    }

    #[test]
    fn degenerate_label_falls_back_to_zone_name() {
        let found = zones(nav_layer(json!([area(
            "secret door",
            json!([{ "name": "targetUrl", "value": "--.tmj" }])
        )])));
        assert_eq!(
            found.first().map(|z| z.destination_label.as_str()),
            Some("secret door")
        );
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let found = zones(json!({
            "compressionlevel": -1,
            "layers": [{
                "type": "objectgroup",
                "name": "roomNavigation",
                "draworder": "topdown",
                "objects": [{
                    "id": 7, "x": 1.5, "y": 2.0, "width": 32, "height": 32,
                    "name": "door", "type": "area", "visible": true,
                    "properties": [{ "name": "targetUrl", "type": "string", "value": "hall.tmj", "propertytype": "" }]
                }]
            }]
        }));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn malformed_root_is_an_error() {
        assert!(matches!(
            MapDocument::from_value(json!([1, 2, 3])),
            Err(ExtractionError::NotAnObject)
        ));
        assert!(matches!(
            MapDocument::from_value(json!("map")),
            Err(ExtractionError::NotAnObject)
        ));
        assert!(matches!(
            MapDocument::from_value(json!({ "layers": "none" })),
            Err(ExtractionError::Malformed { .. })
        ));
    }
}
