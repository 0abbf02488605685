//! Geometry payloads.
//!
//! Geometries are decoded from hex-encoded [EWKB] strings or from [GeoJSON] geometry objects, and are encoded
//! as GeoJSON for JSON, BSON and MessagePack. SQL stores geometries as EWKB blobs; hex-encoded EWKB text
//! is accepted when reading. Malformed geometry is never absorbed: it always results in an error.
//!
//! [EWKB]: https://postgis.net/docs/using_postgis_dbmanagement.html#EWKB_EWKT
//! [GeoJSON]: https://datatracker.ietf.org/doc/html/rfc7946#section-3.1

use geo_types::{Geometry, LineString, MultiPolygon, Point, Polygon};
use geozero::{CoordDimensions, ToGeo, ToWkb, wkb::Ewkb};
use rusqlite::types::{FromSqlError, FromSqlResult, ToSqlOutput, Value as SqlValue, ValueRef};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{DeserializeOwned, Error as _},
};

use crate::{
    codec::Codec,
    de::DecodeOptions,
    error::{DecodeError, EncodeError},
    payload::{Payload, decode_with_serde},
    schema::Dialect,
    value::{BasicTypes, Value},
};

type Ring = Vec<[f64; 2]>;

/// GeoJSON geometry object.
#[derive(Debug, Serialize, Deserialize)]
struct GeoJson<K, C> {
    #[serde(rename = "type")]
    kind: K,
    coordinates: C,
}

/// Shape supported by a geometry payload.
trait Shape: Sized + TryFrom<Geometry<f64>, Error = geo_types::Error> + Into<Geometry<f64>> {
    /// GeoJSON type name.
    const KIND: &'static str;

    type Coordinates: Serialize + DeserializeOwned;

    fn empty() -> Self;

    fn coordinates(&self) -> Self::Coordinates;

    fn from_coordinates(coordinates: Self::Coordinates) -> Self;
}

fn ring_coordinates(ring: &LineString<f64>) -> Ring {
    ring.coords().map(|coord| [coord.x, coord.y]).collect()
}

fn polygon_coordinates(polygon: &Polygon<f64>) -> Vec<Ring> {
    let mut rings = Vec::with_capacity(polygon.interiors().len() + 1);
    if !polygon.exterior().0.is_empty() {
        rings.push(ring_coordinates(polygon.exterior()));
    }
    rings.extend(polygon.interiors().iter().map(ring_coordinates));
    rings
}

fn polygon_from_rings(rings: Vec<Ring>) -> Polygon<f64> {
    let mut rings = rings.into_iter().map(LineString::from);
    let exterior = rings.next().unwrap_or_else(|| LineString(vec![]));
    Polygon::new(exterior, rings.collect())
}

impl Shape for Point<f64> {
    const KIND: &'static str = "Point";
    type Coordinates = [f64; 2];

    fn empty() -> Self {
        Point::new(0.0, 0.0)
    }

    fn coordinates(&self) -> Self::Coordinates {
        [self.x(), self.y()]
    }

    fn from_coordinates([x, y]: Self::Coordinates) -> Self {
        Point::new(x, y)
    }
}

impl Shape for Polygon<f64> {
    const KIND: &'static str = "Polygon";
    type Coordinates = Vec<Ring>;

    fn empty() -> Self {
        Polygon::new(LineString(vec![]), vec![])
    }

    fn coordinates(&self) -> Self::Coordinates {
        polygon_coordinates(self)
    }

    fn from_coordinates(coordinates: Self::Coordinates) -> Self {
        polygon_from_rings(coordinates)
    }
}

impl Shape for MultiPolygon<f64> {
    const KIND: &'static str = "MultiPolygon";
    type Coordinates = Vec<Vec<Ring>>;

    fn empty() -> Self {
        MultiPolygon(vec![])
    }

    fn coordinates(&self) -> Self::Coordinates {
        self.0.iter().map(polygon_coordinates).collect()
    }

    fn from_coordinates(coordinates: Self::Coordinates) -> Self {
        MultiPolygon(coordinates.into_iter().map(polygon_from_rings).collect())
    }
}

fn decode_ewkb<S: Shape>(bytes: &[u8]) -> Result<S, DecodeError> {
    let geometry = Ewkb(bytes).to_geo().map_err(DecodeError::geometry)?;
    S::try_from(geometry).map_err(DecodeError::geometry)
}

fn decode_ewkb_hex<S: Shape>(raw: &str) -> Result<S, DecodeError> {
    let bytes = hex::decode(raw.trim()).map_err(DecodeError::geometry_hex)?;
    decode_ewkb(&bytes)
}

fn decode_geometry<S: Shape>(value: &Value, options: &DecodeOptions) -> Result<S, DecodeError> {
    match value {
        Value::String(raw) => decode_ewkb_hex(raw),
        Value::Object(_) => {
            let geojson: GeoJson<String, S::Coordinates> =
                decode_with_serde(value, BasicTypes::OBJECT, options)
                    .map_err(DecodeError::geometry)?;
            if geojson.kind != S::KIND {
                return Err(DecodeError::geometry(format_args!(
                    "expected GeoJSON type `{}`, got `{}`",
                    S::KIND,
                    geojson.kind
                )));
            }
            Ok(S::from_coordinates(geojson.coordinates))
        }
        _ => Err(DecodeError::geometry(format_args!(
            "expected hex-encoded EWKB or a GeoJSON object, got {}",
            value.unexpected()
        ))),
    }
}

fn encode_ewkb<S: Shape + Clone>(shape: &S) -> Result<Vec<u8>, EncodeError> {
    let geometry: Geometry<f64> = shape.clone().into();
    geometry
        .to_ewkb(CoordDimensions::xy(), None)
        .map_err(|err| EncodeError::geometry(Codec::Sql, err))
}

fn geometry_from_sql<S: Shape>(value: ValueRef<'_>) -> FromSqlResult<S> {
    let result = match value {
        ValueRef::Blob(bytes) => decode_ewkb(bytes),
        ValueRef::Text(bytes) => {
            let raw = std::str::from_utf8(bytes).map_err(|err| FromSqlError::Other(Box::new(err)))?;
            decode_ewkb_hex(raw)
        }
        _ => return Err(FromSqlError::InvalidType),
    };
    result.map_err(|err| FromSqlError::Other(Box::new(err)))
}

macro_rules! impl_geometry_payload {
    ($($(#[$meta:meta])* $name:ident($shape:ident) => [$mysql:literal, $postgres:literal];)+) => {
        $(
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(pub $shape<f64>);

        impl Default for $name {
            fn default() -> Self {
                Self(<$shape<f64> as Shape>::empty())
            }
        }

        impl From<$shape<f64>> for $name {
            fn from(shape: $shape<f64>) -> Self {
                Self(shape)
            }
        }

        impl $name {
            /// Decodes the geometry from EWKB bytes.
            ///
            /// # Errors
            ///
            /// Returns an error if the bytes are not valid EWKB, or encode a geometry of another type.
            pub fn from_ewkb(bytes: &[u8]) -> Result<Self, DecodeError> {
                decode_ewkb(bytes).map(Self)
            }

            /// Decodes the geometry from hex-encoded EWKB.
            ///
            /// # Errors
            ///
            /// Returns an error if the string is not valid hex, or under the same conditions as [`Self::from_ewkb()`].
            pub fn from_ewkb_hex(raw: &str) -> Result<Self, DecodeError> {
                decode_ewkb_hex(raw).map(Self)
            }

            /// Encodes the geometry as 2D EWKB without an SRID.
            ///
            /// # Errors
            ///
            /// Propagates encoding errors.
            pub fn to_ewkb(&self) -> Result<Vec<u8>, EncodeError> {
                encode_ewkb(&self.0)
            }
        }

        /// Serializes the geometry as a GeoJSON geometry object.
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let geojson = GeoJson {
                    kind: <$shape<f64> as Shape>::KIND,
                    coordinates: self.0.coordinates(),
                };
                geojson.serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = Value::deserialize(deserializer)?;
                decode_geometry(&value, &DecodeOptions::default())
                    .map(Self)
                    .map_err(D::Error::custom)
            }
        }

        impl Payload for $name {
            const EXPECTING: BasicTypes = BasicTypes::STRING.or(BasicTypes::OBJECT);
            const DATA_TYPE: &'static str = "geometry";

            fn decode(value: &Value, options: &DecodeOptions) -> Result<Self, DecodeError> {
                decode_geometry(value, options).map(Self)
            }

            fn column_type(dialect: Dialect) -> &'static str {
                match dialect {
                    Dialect::Sqlite => "BLOB",
                    Dialect::Mysql => $mysql,
                    Dialect::Postgres => $postgres,
                }
            }

            fn to_sql_output(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                let bytes = self
                    .to_ewkb()
                    .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
                Ok(ToSqlOutput::Owned(SqlValue::Blob(bytes)))
            }

            fn from_sql_value(value: ValueRef<'_>) -> FromSqlResult<Self> {
                geometry_from_sql(value).map(Self)
            }
        }
        )+
    };
}

impl_geometry_payload! {
    /// Point geometry. The default value is the origin.
    GeomPoint(Point) => ["POINT", "geometry(Point)"];
    /// Polygon geometry. The default value is an empty polygon.
    GeomPolygon(Polygon) => ["POLYGON", "geometry(Polygon)"];
    /// Multi-polygon geometry. The default value is an empty collection.
    GeomMultiPolygon(MultiPolygon) => ["MULTIPOLYGON", "geometry(MultiPolygon)"];
}
