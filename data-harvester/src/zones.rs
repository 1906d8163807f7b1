use crate::projection::{ProjectionError, SourceCrs};
use common::types::config::ZoneSource;
use common::types::errors::ShapeError;
use common::types::{Coordinate, ZoneId};
use geo::{Centroid, MultiPolygon};
use geojson::{Feature, GeoJson, JsonObject, JsonValue};
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use log::{debug, info};
use std::fmt::Display;
use std::path::PathBuf;
use std::{fmt, fs, io};

#[derive(Debug, Clone)]
pub struct Zone {
    pub id: ZoneId,
    pub name: Option<String>,
    pub borough: Option<String>,
    /// WGS84, x is longitude
    pub geometry: MultiPolygon<f64>,
    pub centroid: Coordinate,
}

/// Taxi zones by id. Loaded once per run and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct ZoneTable {
    zones: HashMap<ZoneId, Zone>,
}

impl ZoneTable {
    /// Representative coordinate of a zone, `None` if the zone is unknown
    pub fn resolve(&self, zone_id: ZoneId) -> Option<Coordinate> {
        self.zones.get(&zone_id).map(|zone| zone.centroid)
    }

    /// Like [`ZoneTable::resolve`] for raw id column values
    pub fn resolve_raw(&self, zone_id: Option<i64>) -> Option<Coordinate> {
        let zone_id = ZoneId::try_from(zone_id?).ok()?;
        self.resolve(zone_id)
    }

    #[cfg(test)]
    pub(crate) fn get(&self, zone_id: ZoneId) -> Option<&Zone> {
        self.zones.get(&zone_id)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl FromIterator<Zone> for ZoneTable {
    fn from_iter<T: IntoIterator<Item = Zone>>(iter: T) -> Self {
        Self { zones: iter.into_iter().map(|zone| (zone.id, zone)).collect() }
    }
}

pub fn load_zone_geometries(source: &ZoneSource) -> Result<ZoneTable, ZoneLoadError> {
    let text = fs::read_to_string(&source.path)
        .map_err(|err| ZoneLoadError::File(source.path.clone(), err))?;

    let table = parse_zone_geometries(&text, source.crs.as_deref())?;
    info!(target: "zones", "Loaded {} taxi zones from {}", table.len(), source.path.display());

    Ok(table)
}

/// Reads a GeoJSON feature collection with one (multi)polygon per zone. The CRS is taken from
/// `crs_override` or the collection's `crs` member and defaults to WGS84.
pub fn parse_zone_geometries(text: &str, crs_override: Option<&str>) -> Result<ZoneTable, ZoneLoadError> {
    let GeoJson::FeatureCollection(collection) = text.parse::<GeoJson>()? else {
        return Err(ZoneLoadError::NotAFeatureCollection);
    };

    let crs_name = crs_override
        .map(str::to_owned)
        .or_else(|| declared_crs(collection.foreign_members.as_ref()))
        .unwrap_or_else(|| "EPSG:4326".to_owned());
    let crs = SourceCrs::parse(&crs_name)
        .ok_or_else(|| ZoneLoadError::UnsupportedCrs(crs_name.clone()))?;
    let reprojection = crs.reprojection()?;
    debug!(target: "zones", "Zone geometries are in {}", crs_name);

    // Some releases split a zone into several features with the same id
    let mut merged: HashMap<ZoneId, (Option<String>, Option<String>, MultiPolygon<f64>)> = HashMap::new();
    for (index, feature) in collection.features.into_iter().enumerate() {
        let (id, name, borough, geometry) = read_feature(index, feature)?;

        match merged.entry(id) {
            Entry::Occupied(mut entry) => {
                let (_, _, existing) = entry.get_mut();
                existing.0.extend(geometry.0);
            }
            Entry::Vacant(entry) => {
                entry.insert((name, borough, geometry));
            }
        }
    }

    if merged.is_empty() {
        return Err(ZoneLoadError::Empty);
    }

    merged.into_iter()
        .map(|(id, (name, borough, geometry))| -> Result<Zone, ZoneLoadError> {
            let geometry = reprojection.geometry_to_wgs84(geometry)?;
            let centroid = geometry.centroid().ok_or(ZoneLoadError::EmptyGeometry(id))?;
            let centroid = Coordinate::new(centroid.y(), centroid.x())
                .map_err(|err| ZoneLoadError::OutOfRange(id, err))?;

            Ok(Zone { id, name, borough, geometry, centroid })
        })
        .collect()
}

fn declared_crs(foreign_members: Option<&JsonObject>) -> Option<String> {
    foreign_members?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()
        .map(str::to_owned)
}

fn read_feature(
    index: usize,
    feature: Feature,
) -> Result<(ZoneId, Option<String>, Option<String>, MultiPolygon<f64>), ZoneLoadError> {
    let properties = feature.properties.unwrap_or_default();

    let id = property(&properties, "LocationID")
        .and_then(|value| match value {
            JsonValue::Number(number) => number.as_i64(),
            JsonValue::String(text) => text.trim().parse::<f64>().ok().map(|id| id as i64),
            _ => None,
        })
        .ok_or(ZoneLoadError::MissingZoneId(index))?;
    let id = ZoneId::try_from(id).map_err(|_| ZoneLoadError::InvalidZoneId(id))?;

    let text = |key: &str| property(&properties, key)
        .and_then(JsonValue::as_str)
        .map(str::to_owned);

    let geometry = feature.geometry.ok_or(ZoneLoadError::MissingGeometry(id))?;
    let geometry = match geo::Geometry::<f64>::try_from(geometry)? {
        geo::Geometry::MultiPolygon(multi_polygon) => multi_polygon,
        geo::Geometry::Polygon(polygon) => MultiPolygon(vec![polygon]),
        _ => return Err(ZoneLoadError::UnsupportedGeometry(id)),
    };

    Ok((id, text("zone"), text("borough"), geometry))
}

/// Property lookup ignoring the case of the key, shapefile exports are inconsistent about it
fn property<'a>(properties: &'a JsonObject, key: &str) -> Option<&'a JsonValue> {
    properties.get(key).or_else(|| {
        properties.iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    })
}

#[derive(thiserror::Error, Debug)]
pub enum ZoneLoadError {
    File(PathBuf, io::Error),
    GeoJson(#[from] geojson::Error),
    NotAFeatureCollection,
    UnsupportedCrs(String),
    Projection(#[from] ProjectionError),
    MissingZoneId(usize),
    InvalidZoneId(i64),
    MissingGeometry(ZoneId),
    UnsupportedGeometry(ZoneId),
    EmptyGeometry(ZoneId),
    OutOfRange(ZoneId, ShapeError),
    Empty,
}

impl Display for ZoneLoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ZoneLoadError::File(path, err) => write!(f, "Cannot read zone file {}: {}", path.display(), err),
            ZoneLoadError::GeoJson(err) => err.fmt(f),
            ZoneLoadError::NotAFeatureCollection => write!(f, "Zone file must be a GeoJSON FeatureCollection"),
            ZoneLoadError::UnsupportedCrs(crs) => {
                write!(f, "Zone file uses unsupported CRS '{}', expected EPSG:4326 or EPSG:2263", crs)
            }
            ZoneLoadError::Projection(err) => err.fmt(f),
            ZoneLoadError::MissingZoneId(index) => write!(f, "Feature #{} has no LocationID", index),
            ZoneLoadError::InvalidZoneId(id) => write!(f, "Invalid LocationID {}", id),
            ZoneLoadError::MissingGeometry(id) => write!(f, "Zone {} has no geometry", id),
            ZoneLoadError::UnsupportedGeometry(id) => write!(f, "Zone {} is neither a polygon nor a multipolygon", id),
            ZoneLoadError::EmptyGeometry(id) => write!(f, "Zone {} has an empty geometry", id),
            ZoneLoadError::OutOfRange(id, err) => {
                write!(f, "Centroid of zone {} is not a WGS84 position ({}). Is the CRS declared correctly?", id, err)
            }
            ZoneLoadError::Empty => write!(f, "Zone file contains no zones"),
        }
    }
}
