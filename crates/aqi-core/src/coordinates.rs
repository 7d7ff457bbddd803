use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// City name to `(latitude, longitude)`.
pub type CityCoordinates = BTreeMap<String, (f64, f64)>;

#[derive(Debug, Error)]
pub enum CoordinatesError {
    #[error("failed to read coordinates file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("coordinates file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("coordinates file must hold a JSON object of city -> [lat, lon]")]
    NotAnObject,
}

pub fn load_coordinates(path: &Path) -> Result<CityCoordinates, CoordinatesError> {
    let content = std::fs::read_to_string(path).map_err(|source| CoordinatesError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_coordinates(&content)
}

/// Entries that are not a two-number array are skipped.
pub fn parse_coordinates(content: &str) -> Result<CityCoordinates, CoordinatesError> {
    let Value::Object(entries) = serde_json::from_str::<Value>(content)? else {
        return Err(CoordinatesError::NotAnObject);
    };

    let mut coordinates = CityCoordinates::new();
    for (city, entry) in entries {
        match lat_lon(&entry) {
            Some(point) => {
                coordinates.insert(city, point);
            }
            None => debug!(%city, "skipping malformed coordinate entry"),
        }
    }
    Ok(coordinates)
}

fn lat_lon(entry: &Value) -> Option<(f64, f64)> {
    match entry.as_array()?.as_slice() {
        [lat, lon] => Some((lat.as_f64()?, lon.as_f64()?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_city_pairs_and_skips_bad_entries() {
        let coords = parse_coordinates(
            r#"{
                "Delhi": [28.6139, 77.209],
                "Mumbai": [19.076, 72.8777],
                "Nowhere": "n/a",
                "Halfway": [12.0]
            }"#,
        )
        .unwrap();

        assert_eq!(coords.len(), 2);
        assert_eq!(coords["Delhi"], (28.6139, 77.209));
        assert!(!coords.contains_key("Nowhere"));
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(matches!(
            parse_coordinates("[1, 2]"),
            Err(CoordinatesError::NotAnObject)
        ));
        assert!(matches!(parse_coordinates("{"), Err(CoordinatesError::Json(_))));
    }
}
