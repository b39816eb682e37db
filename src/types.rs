use geo::Point;
use serde::{Deserialize, Serialize};

/// One cleaned row per GN division, the lowest administrative level in the
/// census hierarchy. Field renames mirror the cleaned CSV header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(rename = "Province_Code")]
    pub province_code: String,
    #[serde(rename = "Province_Name")]
    pub province_name: String,
    #[serde(rename = "District_Code")]
    pub district_code: String,
    #[serde(rename = "District_Name")]
    pub district_name: String,
    #[serde(rename = "DS_Code")]
    pub ds_code: String,
    #[serde(rename = "DS_Name")]
    pub ds_name: String,
    #[serde(rename = "GN_Code")]
    pub gn_code: String,
    #[serde(rename = "GN_Name")]
    pub gn_name: String,
    #[serde(rename = "GN_Number")]
    pub gn_number: String,
    #[serde(rename = "Total_Population")]
    pub total_population: u32,
    #[serde(rename = "Male")]
    pub male: u32,
    #[serde(rename = "Female")]
    pub female: u32,
    #[serde(rename = "Age_0_14")]
    pub age_0_14: u32,
    #[serde(rename = "Age_15_59")]
    pub age_15_59: u32,
    #[serde(rename = "Age_60_64")]
    pub age_60_64: u32,
    #[serde(rename = "Age_65_Plus")]
    pub age_65_plus: u32,
}

impl CanonicalRecord {
    pub fn sex_sum(&self) -> u32 {
        self.male + self.female
    }

    pub fn age_sum(&self) -> u32 {
        self.age_0_14 + self.age_15_59 + self.age_60_64 + self.age_65_plus
    }
}

/// One boundary feature from the merged GeoJSON. The centroid is derived at
/// load time; features without usable polygon geometry carry `None`.
#[derive(Debug, Clone)]
pub struct GnFeature {
    pub name: String,
    pub district: Option<String>,
    pub centroid: Option<Point<f64>>,
}

/// Rectangular latitude/longitude envelope, bounds inclusive.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Bounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Bounds {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.lat_min <= lat && lat <= self.lat_max && self.lon_min <= lon && lon <= self.lon_max
    }
}
