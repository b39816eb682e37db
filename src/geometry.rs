use crate::types::{Bounds, GnFeature};
use anyhow::{anyhow, Context, Result};
use geo::Point;
use geojson::{Feature, GeoJson, Value};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Envelope expected to contain every division boundary.
pub const ISLAND_BOUNDS: Bounds = Bounds {
    lat_min: 5.8,
    lat_max: 10.0,
    lon_min: 79.4,
    lon_max: 82.1,
};

/// Out-of-bounds examples collected for the report.
pub const MAX_OUT_OF_BOUNDS_EXAMPLES: usize = 10;

const PROGRESS_INTERVAL: usize = 5000;

pub fn load_features(path: &Path) -> Result<Vec<GnFeature>> {
    println!("Loading GeoJSON from {:?}...", path);
    let file =
        File::open(path).with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let reader = BufReader::new(file);

    // Parse the GeoJSON. warning: this loads the whole file into memory.
    let geojson = GeoJson::from_reader(reader).context("Failed to parse GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let mut features = Vec::new();
    for feature in collection.features {
        // Features without a shape name cannot be keyed; skip them.
        let name = match property_string(&feature, "shapeName") {
            Some(name) if !name.trim().is_empty() => name,
            _ => continue,
        };
        let district = property_string(&feature, "District_Name");
        let centroid = feature.geometry.as_ref().and_then(|g| ring_centroid(&g.value));
        features.push(GnFeature {
            name,
            district,
            centroid,
        });
    }
    println!("Loaded {} boundary features", features.len());
    Ok(features)
}

fn property_string(feature: &Feature, key: &str) -> Option<String> {
    match feature.properties.as_ref()?.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Arithmetic-mean centroid of the outer ring. MultiPolygons use the first
/// polygon's outer ring only; other geometry types have no centroid.
pub fn ring_centroid(value: &Value) -> Option<Point<f64>> {
    let ring = match value {
        Value::Polygon(rings) => rings.first()?,
        Value::MultiPolygon(polygons) => polygons.first()?.first()?,
        _ => return None,
    };
    if ring.is_empty() {
        return None;
    }

    let mut lon_sum = 0.0;
    let mut lat_sum = 0.0;
    for position in ring {
        lon_sum += *position.first()?;
        lat_sum += *position.get(1)?;
    }
    let n = ring.len() as f64;
    Some(Point::new(lon_sum / n, lat_sum / n))
}

#[derive(Debug, Default)]
pub struct PositionReport {
    pub total: usize,
    pub in_bounds: usize,
    pub out_of_bounds: usize,
    pub no_geometry: usize,
    /// "name: (lat, lon)" lines, bounded to MAX_OUT_OF_BOUNDS_EXAMPLES.
    pub out_of_bounds_examples: Vec<String>,
}

impl PositionReport {
    pub fn all_positioned(&self) -> bool {
        self.in_bounds == self.total - self.no_geometry
    }

    pub fn in_bounds_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.in_bounds as f64 / self.total as f64
        }
    }
}

/// Classify every feature centroid against the envelope. Out-of-bounds
/// features are reported, never modified.
pub fn verify_positions(features: &[GnFeature], bounds: &Bounds) -> PositionReport {
    let mut report = PositionReport {
        total: features.len(),
        ..Default::default()
    };

    for (i, feature) in features.iter().enumerate() {
        if (i + 1) % PROGRESS_INTERVAL == 0 {
            println!("  Progress: {}/{}", i + 1, report.total);
        }
        let Some(centroid) = feature.centroid else {
            report.no_geometry += 1;
            continue;
        };
        let (lat, lon) = (centroid.y(), centroid.x());
        if bounds.contains(lat, lon) {
            report.in_bounds += 1;
        } else {
            report.out_of_bounds += 1;
            if report.out_of_bounds_examples.len() < MAX_OUT_OF_BOUNDS_EXAMPLES {
                report
                    .out_of_bounds_examples
                    .push(format!("{}: ({:.4}, {:.4})", feature.name, lat, lon));
            }
        }
    }
    report
}

pub fn write_position_report(path: &Path, report: &PositionReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create report directory: {:?}", parent))?;
        }
    }

    let mut out = String::new();
    out.push_str("GN POSITION VERIFICATION REPORT\n");
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");
    out.push_str(&format!("Total features: {}\n", report.total));
    out.push_str(&format!(
        "In bounds: {} ({:.2}%)\n",
        report.in_bounds,
        report.in_bounds_percent()
    ));
    out.push_str(&format!("Out of bounds: {}\n", report.out_of_bounds));
    out.push_str(&format!("No valid geometry: {}\n\n", report.no_geometry));

    if !report.out_of_bounds_examples.is_empty() {
        out.push_str("Out of bounds examples:\n");
        for example in &report.out_of_bounds_examples {
            out.push_str(&format!("  {}\n", example));
        }
        out.push('\n');
    }

    if report.all_positioned() {
        out.push_str("RESULT: all GN divisions with geometry fall inside the expected bounds.\n");
    } else {
        out.push_str(&format!(
            "RESULT: {} features may have position issues.\n",
            report.out_of_bounds
        ));
    }

    fs::write(path, out).with_context(|| format!("Failed to write position report: {:?}", path))
}
