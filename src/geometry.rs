//! Spatial values and the WKB decoder.
//!
//! MySQL ships a GEOMETRY column as a 4-byte little-endian SRID followed by
//! standard Well-Known-Binary. Only Point, Polygon and MultiPolygon in
//! little-endian byte order are supported.

use crate::error::{Error, Result};
use crate::protocol::primitive::{read_int_1, read_int_4, read_int_8};

const WKB_LITTLE_ENDIAN: u8 = 0x01;
const WKB_BIG_ENDIAN: u8 = 0x00;

const WKB_POINT: u32 = 1;
const WKB_POLYGON: u32 = 3;
const WKB_MULTI_POLYGON: u32 = 6;

/// A closed sequence of points
pub type Ring = Vec<(f64, f64)>;

/// Exterior ring first, holes after it
pub type PolygonRings = Vec<Ring>;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point {
        x: f64,
        y: f64,
        srid: Option<u32>,
    },
    Polygon {
        rings: PolygonRings,
        srid: Option<u32>,
    },
    MultiPolygon {
        polygons: Vec<PolygonRings>,
        srid: Option<u32>,
    },
}

impl Geometry {
    pub fn srid(&self) -> Option<u32> {
        match self {
            Geometry::Point { srid, .. }
            | Geometry::Polygon { srid, .. }
            | Geometry::MultiPolygon { srid, .. } => *srid,
        }
    }
}

/// Decode a GEOMETRY column payload: SRID header then WKB.
///
/// SRID 0 (no spatial reference system) is reported as `None`.
pub fn decode_geometry(payload: &[u8]) -> Result<Geometry> {
    let (srid, wkb) = read_int_4(payload).map_err(|_| {
        Error::UnsupportedGeometryEncoding(format!(
            "payload of {} bytes is too short for an SRID header",
            payload.len()
        ))
    })?;
    let srid = (srid != 0).then_some(srid);
    decode_wkb(wkb, srid)
}

/// Decode a WKB byte sequence (without the SRID header).
///
/// `srid` is attached to the returned top-level value only.
pub fn decode_wkb(wkb: &[u8], srid: Option<u32>) -> Result<Geometry> {
    let (geometry_type, data) = read_header(wkb)?;
    let (geometry, rest) = match geometry_type {
        WKB_POINT => {
            let ((x, y), rest) = read_point(data)?;
            (Geometry::Point { x, y, srid }, rest)
        }
        WKB_POLYGON => {
            let (rings, rest) = read_polygon(data)?;
            (Geometry::Polygon { rings, srid }, rest)
        }
        WKB_MULTI_POLYGON => {
            let (polygons, rest) = read_multi_polygon(data)?;
            (Geometry::MultiPolygon { polygons, srid }, rest)
        }
        other => {
            return Err(Error::UnsupportedGeometryEncoding(format!(
                "WKB geometry type {}",
                other
            )));
        }
    };

    if !rest.is_empty() {
        return Err(Error::UnsupportedGeometryEncoding(format!(
            "{} trailing bytes after WKB geometry",
            rest.len()
        )));
    }
    Ok(geometry)
}

/// Byte-order marker and geometry type code
fn read_header(data: &[u8]) -> Result<(u32, &[u8])> {
    let (order, data) = read_int_1(data).map_err(truncated)?;
    match order {
        WKB_LITTLE_ENDIAN => read_int_4(data).map_err(truncated),
        WKB_BIG_ENDIAN => Err(Error::UnsupportedGeometryEncoding(
            "big-endian WKB".to_string(),
        )),
        other => Err(Error::UnsupportedGeometryEncoding(format!(
            "WKB byte order marker 0x{:02X}",
            other
        ))),
    }
}

fn read_point(data: &[u8]) -> Result<((f64, f64), &[u8])> {
    let (x, data) = read_int_8(data).map_err(truncated)?;
    let (y, data) = read_int_8(data).map_err(truncated)?;
    Ok(((f64::from_bits(x), f64::from_bits(y)), data))
}

fn read_ring(data: &[u8]) -> Result<(Ring, &[u8])> {
    let (num_points, mut data) = read_count(data, 16)?;
    let mut ring = Vec::with_capacity(num_points);
    for _ in 0..num_points {
        let (point, rest) = read_point(data)?;
        ring.push(point);
        data = rest;
    }
    Ok((ring, data))
}

fn read_polygon(data: &[u8]) -> Result<(PolygonRings, &[u8])> {
    let (num_rings, mut data) = read_count(data, 4)?;
    let mut rings = Vec::with_capacity(num_rings);
    for _ in 0..num_rings {
        let (ring, rest) = read_ring(data)?;
        rings.push(ring);
        data = rest;
    }
    Ok((rings, data))
}

/// Standard WKB repeats a byte-order + type header before each member polygon,
/// MySQL's bare form does not. The first member decides for all of them.
const EMBEDDED_POLYGON_HEADER: [u8; 5] = [WKB_LITTLE_ENDIAN, 3, 0, 0, 0];

fn read_multi_polygon(data: &[u8]) -> Result<(Vec<PolygonRings>, &[u8])> {
    let (num_polygons, mut data) = read_count(data, 4)?;
    let with_headers = num_polygons > 0 && data.starts_with(&EMBEDDED_POLYGON_HEADER);
    let mut polygons = Vec::with_capacity(num_polygons);
    for _ in 0..num_polygons {
        let body = if with_headers {
            data.strip_prefix(&EMBEDDED_POLYGON_HEADER).ok_or_else(|| {
                Error::UnsupportedGeometryEncoding(
                    "multipolygon member is missing its polygon header".to_string(),
                )
            })?
        } else {
            data
        };
        let (rings, rest) = read_polygon(body)?;
        polygons.push(rings);
        data = rest;
    }
    Ok((polygons, data))
}

/// Read a u32 element count, bounding the preallocation by the bytes left
fn read_count(data: &[u8], min_element_size: usize) -> Result<(usize, &[u8])> {
    let (count, rest) = read_int_4(data).map_err(truncated)?;
    let count = count as usize;
    if count > rest.len() / min_element_size {
        return Err(Error::UnsupportedGeometryEncoding(format!(
            "WKB declares {} elements but only {} bytes remain",
            count,
            rest.len()
        )));
    }
    Ok((count, rest))
}

fn truncated(_: Error) -> Error {
    Error::UnsupportedGeometryEncoding("truncated WKB".to_string())
}
