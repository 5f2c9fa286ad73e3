// Geographic reference: region name → boundary id lookup used only by the
// choropleth aggregate. The three acquisition strategies (embedded literal,
// local file, remote fetch) are interchangeable behind one capability.
use crate::error::LoadError;
use crate::normalize::{normalize_cell, FieldPolicy};
use crate::reports::{sum_by, Dimension};
use crate::types::CanonicalRecord;
use geojson::GeoJson;
use log::warn;
use std::collections::HashMap;
use std::path::PathBuf;

/// Symbolic department boundaries for Colombia, keyed by the `DPTO`
/// property. Rectangles, not real polygons; enough for the choropleth to
/// join against without any external resource.
const EMBEDDED_COLOMBIA_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {"DPTO": "AMAZONAS"},
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-70, -3], [-71, -3], [-71, -4], [-70, -4], [-70, -3]]]
      }
    },
    {
      "type": "Feature",
      "properties": {"DPTO": "ANTIOQUIA"},
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-75, 7], [-76, 7], [-76, 6], [-75, 6], [-75, 7]]]
      }
    },
    {
      "type": "Feature",
      "properties": {"DPTO": "ARAUCA"},
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-70, 7], [-71, 7], [-71, 6], [-70, 6], [-70, 7]]]
      }
    }
  ]
}"#;

/// Where the boundary feature collection comes from.
#[derive(Debug, Clone)]
pub enum GeoSource {
    Embedded,
    File(PathBuf),
    Remote(String),
}

/// Lookup capability the pipeline needs from any geo reference: a
/// case/accent-normalized region name resolved to a boundary id, or `None`
/// for regions the reference does not cover.
pub trait GeoReferenceProvider {
    fn lookup(&self, region: &str) -> Option<&str>;
}

/// Region-name index over a GeoJSON feature collection's `DPTO` properties.
#[derive(Debug)]
pub struct BoundaryIndex {
    boundaries: HashMap<String, String>,
}

impl BoundaryIndex {
    pub fn from_source(source: &GeoSource) -> Result<BoundaryIndex, LoadError> {
        let text = match source {
            GeoSource::Embedded => EMBEDDED_COLOMBIA_GEOJSON.to_string(),
            GeoSource::File(path) => std::fs::read_to_string(path).map_err(|e| {
                LoadError::GeoReference(format!("{}: {}", path.display(), e))
            })?,
            GeoSource::Remote(url) => fetch(url)?,
        };
        Self::from_geojson(&text)
    }

    pub fn from_geojson(text: &str) -> Result<BoundaryIndex, LoadError> {
        let parsed: GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| LoadError::GeoReference(e.to_string()))?;
        let GeoJson::FeatureCollection(fc) = parsed else {
            return Err(LoadError::GeoReference(
                "expected a feature collection".to_string(),
            ));
        };

        let policy = FieldPolicy::identifier();
        let mut boundaries = HashMap::new();
        for feature in fc.features {
            let Some(props) = feature.properties else {
                continue;
            };
            let Some(id) = props.get("DPTO").and_then(|v| v.as_str()) else {
                continue;
            };
            boundaries.insert(normalize_cell(id, &policy), id.to_string());
        }
        Ok(BoundaryIndex { boundaries })
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }
}

impl GeoReferenceProvider for BoundaryIndex {
    fn lookup(&self, region: &str) -> Option<&str> {
        let key = normalize_cell(region, &FieldPolicy::identifier());
        self.boundaries.get(&key).map(String::as_str)
    }
}

fn fetch(url: &str) -> Result<String, LoadError> {
    // One synchronous GET, default client settings; this is the pipeline's
    // only network call and runs at most once per load.
    let resp = reqwest::blocking::get(url)
        .map_err(|e| LoadError::GeoReference(format!("{}: {}", url, e)))?;
    resp.error_for_status()
        .and_then(|r| r.text())
        .map_err(|e| LoadError::GeoReference(format!("{}: {}", url, e)))
}

/// Per-boundary case sums for the choropleth.
///
/// Regions the provider cannot resolve are dropped here and only here; they
/// remain counted in every other aggregate and KPI.
pub fn choropleth_aggregate<P: GeoReferenceProvider>(
    records: &[CanonicalRecord],
    provider: &P,
) -> Vec<(String, u64)> {
    let mut dropped = 0usize;
    let out: Vec<(String, u64)> = sum_by(records, Dimension::Region)
        .into_iter()
        .filter_map(|(region, cases)| match provider.lookup(&region) {
            Some(id) => Some((id.to_string(), cases)),
            None => {
                dropped += 1;
                None
            }
        })
        .collect();
    if dropped > 0 {
        warn!("{} regions had no boundary match and were left off the map", dropped);
    }
    out
}
