//! Vector features and layers
//!
//! Layers are plain in-memory feature lists with per-feature attributes.
//! They serialize to JSON (geometry via `geo-types`' serde support) which
//! is the on-disk form used by [`crate::store::FsStore`].

use geo_types::{Geometry, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::crs::CRS;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

/// A geometry with named attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    #[serde(default)]
    pub properties: BTreeMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get_property(key).and_then(AttributeValue::as_f64)
    }
}

/// An ordered collection of features sharing one coordinate system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorLayer {
    #[serde(default)]
    pub crs: Option<CRS>,
    pub features: Vec<Feature>,
}

impl VectorLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// One feature per polygon, no attributes
    pub fn from_polygons(polygons: impl IntoIterator<Item = Polygon<f64>>) -> Self {
        Self {
            crs: None,
            features: polygons.into_iter().map(Feature::new).collect(),
        }
    }

    pub fn with_crs(mut self, crs: Option<CRS>) -> Self {
        self.crs = crs;
        self
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// All polygon parts of the layer; multipolygons are flattened and
    /// non-areal geometries skipped.
    pub fn polygons(&self) -> Vec<Polygon<f64>> {
        let mut out = Vec::new();
        for feature in &self.features {
            match &feature.geometry {
                Geometry::Polygon(p) => out.push(p.clone()),
                Geometry::MultiPolygon(mp) => out.extend(mp.0.iter().cloned()),
                _ => {}
            }
        }
        out
    }

    /// Point geometries of the layer
    pub fn points(&self) -> Vec<Point<f64>> {
        self.features
            .iter()
            .filter_map(|f| match &f.geometry {
                Geometry::Point(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Polygon parts collected into one multipolygon (no dissolve)
    pub fn to_multipolygon(&self) -> MultiPolygon<f64> {
        MultiPolygon(self.polygons())
    }

    /// Set the same attribute on every feature
    pub fn set_all(&mut self, key: &str, value: impl Into<AttributeValue>) {
        let value = value.into();
        for feature in &mut self.features {
            feature.set_property(key, value.clone());
        }
    }
}

impl IntoIterator for VectorLayer {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl FromIterator<Feature> for VectorLayer {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            crs: None,
            features: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, point};

    fn square(x: f64) -> Polygon<f64> {
        polygon![(x: x, y: 0.0), (x: x + 1.0, y: 0.0), (x: x + 1.0, y: 1.0), (x: x, y: 1.0)]
    }

    #[test]
    fn test_polygons_flatten_multipolygons() {
        let mut layer = VectorLayer::from_polygons(vec![square(0.0)]);
        layer.push(Feature::new(MultiPolygon(vec![square(2.0), square(4.0)])));
        layer.push(Feature::new(point!(x: 1.0, y: 1.0)));
        assert_eq!(layer.len(), 3);
        assert_eq!(layer.polygons().len(), 3);
        assert_eq!(layer.points().len(), 1);
    }

    #[test]
    fn test_attributes_and_json() {
        let mut layer: VectorLayer = vec![
            Feature::new(square(0.0)).with_property("tile", 7i64),
            Feature::new(square(1.0)).with_property("POLY_AREA", 1.0),
        ]
        .into_iter()
        .collect();
        layer.set_all("kind", "start");
        layer.crs = Some(CRS::lv95());

        let json = serde_json::to_string(&layer).unwrap();
        let back: VectorLayer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.features[0].get_f64("tile"), Some(7.0));
        assert_eq!(back.features[1].get_f64("POLY_AREA"), Some(1.0));
        assert_eq!(back.features[1].get_property("kind").and_then(|v| v.as_str()), Some("start"));
        assert_eq!(back.crs, Some(CRS::lv95()));
    }
}
