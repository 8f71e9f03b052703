use crate::data::DataError;
use crate::map::{Country, Polygon};
use geojson::{Feature, GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;

/// Load the countries layer (Natural Earth admin-0) from a GeoJSON file
pub fn load_countries(path: &Path, sovereign_key: &str) -> Result<Vec<Country>, DataError> {
    let mut bytes = fs::read(path).map_err(|source| DataError::GeometryIo {
        path: path.to_path_buf(),
        source,
    })?;
    let countries = parse_countries(&mut bytes, sovereign_key)?;
    tracing::info!(countries = countries.len(), "loaded geometry {}", path.display());
    Ok(countries)
}

/// Parse GeoJSON bytes in place; features without a sovereign name or area geometry are skipped
pub fn parse_countries(bytes: &mut [u8], sovereign_key: &str) -> Result<Vec<Country>, DataError> {
    let geojson: GeoJson = simd_json::serde::from_slice(bytes)?;
    let GeoJson::FeatureCollection(fc) = geojson else {
        return Err(DataError::NotFeatureCollection);
    };

    let mut countries = Vec::with_capacity(fc.features.len());
    for feature in &fc.features {
        let Some(sovereign) = string_property(feature, sovereign_key) else {
            continue;
        };
        let name = string_property(feature, "NAME")
            .or_else(|| string_property(feature, "ADMIN"))
            .unwrap_or_else(|| sovereign.clone());

        let mut polygons = Vec::new();
        if let Some(ref geometry) = feature.geometry {
            collect_polygons(geometry, &mut polygons);
        }
        if polygons.is_empty() {
            tracing::debug!(%sovereign, "feature has no polygon geometry");
            continue;
        }
        countries.push(Country::new(name, sovereign, polygons));
    }
    Ok(countries)
}

fn string_property(feature: &Feature, key: &str) -> Option<String> {
    feature
        .property(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn collect_polygons(geometry: &Geometry, polygons: &mut Vec<Polygon>) {
    let to_polygon = |rings: &Vec<Vec<Vec<f64>>>| -> Polygon {
        rings
            .iter()
            .map(|ring| ring.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect())
            .collect()
    };

    match &geometry.value {
        Value::Polygon(rings) => polygons.push(to_polygon(rings)),
        Value::MultiPolygon(parts) => polygons.extend(parts.iter().map(to_polygon)),
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, polygons);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYER: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"SOVEREIGNT": "Norway", "NAME": "Norway"},
                "geometry": {"type": "Polygon", "coordinates": [[[5,58],[12,58],[12,70],[5,70],[5,58]]]}
            },
            {
                "type": "Feature",
                "properties": {"SOVEREIGNT": "Denmark", "NAME": "Greenland"},
                "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[-50,60],[-40,60],[-40,80],[-50,80],[-50,60]]],
                    [[[-30,70],[-20,70],[-20,75],[-30,75],[-30,70]]]
                ]}
            },
            {
                "type": "Feature",
                "properties": {"SOVEREIGNT": "Nowhere"},
                "geometry": {"type": "Point", "coordinates": [0, 0]}
            },
            {
                "type": "Feature",
                "properties": {"NAME": "Unclaimed"},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}
            }
        ]
    }"#;

    #[test]
    fn test_parse_keeps_area_features_with_sovereign() {
        let mut bytes = LAYER.as_bytes().to_vec();
        let countries = parse_countries(&mut bytes, "SOVEREIGNT").unwrap();
        assert_eq!(countries.len(), 2);
        assert_eq!(countries[0].sovereign, "Norway");
        assert_eq!(countries[1].name, "Greenland");
        assert_eq!(countries[1].sovereign, "Denmark");
        assert_eq!(countries[1].polygons.len(), 2);
        assert_eq!(countries[1].bounds.max_lat, 80.0);
    }

    #[test]
    fn test_rejects_bare_geometry() {
        let mut bytes = br#"{"type": "Point", "coordinates": [0, 0]}"#.to_vec();
        assert!(matches!(
            parse_countries(&mut bytes, "SOVEREIGNT"),
            Err(DataError::NotFeatureCollection)
        ));
    }
}
