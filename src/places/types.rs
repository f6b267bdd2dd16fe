//! Place type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single autocomplete suggestion returned by the geodata service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Opaque identifier used to fetch details
    pub place_id: String,
    /// Main text, usually the place name
    pub primary_text: String,
    /// Secondary text, usually the locality
    pub secondary_text: String,
    /// Full description shown once the prediction is picked
    pub full_text: String,
    /// Place types reported by the service
    #[serde(default)]
    pub place_types: Vec<String>,
}

impl Prediction {
    /// Create a new prediction; the full text joins primary and secondary text
    pub fn new(
        place_id: impl Into<String>,
        primary_text: impl Into<String>,
        secondary_text: impl Into<String>,
    ) -> Self {
        let primary_text = primary_text.into();
        let secondary_text = secondary_text.into();
        let full_text = if secondary_text.is_empty() {
            primary_text.clone()
        } else {
            format!("{}, {}", primary_text, secondary_text)
        };

        Self {
            place_id: place_id.into(),
            primary_text,
            secondary_text,
            full_text,
            place_types: vec![],
        }
    }

    /// Override the full text
    pub fn with_full_text(mut self, full_text: impl Into<String>) -> Self {
        self.full_text = full_text.into();
        self
    }

    /// Add place types
    pub fn with_types(mut self, place_types: Vec<String>) -> Self {
        self.place_types = place_types;
        self
    }
}

/// A place record as the service returns it, before attribution is attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone_number: Option<String>,
    pub website_uri: Option<String>,
    pub location: Option<LatLng>,
}

impl PlaceRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            phone_number: None,
            website_uri: None,
            location: None,
        }
    }

    pub fn with_phone_number(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = Some(phone.into());
        self
    }

    pub fn with_website(mut self, uri: impl Into<String>) -> Self {
        self.website_uri = Some(uri.into());
        self
    }

    pub fn with_location(mut self, location: LatLng) -> Self {
        self.location = Some(location);
        self
    }
}

/// Resolved details for a selected place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetail {
    /// Place identifier, equal to the prediction's `place_id`
    pub id: String,
    /// Display name
    pub name: String,
    /// Formatted address
    pub address: String,
    /// Phone number, if the place has one
    pub phone_number: Option<String>,
    /// Website, if the place has one
    pub website_uri: Option<String>,
    /// Third-party attribution text; `None` means no attribution is shown
    pub attribution: Option<String>,
    /// Place coordinates
    pub location: Option<LatLng>,
}

impl PlaceDetail {
    /// Build a detail from a service record and the buffer's attribution
    pub fn from_record(record: PlaceRecord, attribution: Option<String>) -> Self {
        Self {
            id: record.id,
            name: record.name,
            address: record.address,
            phone_number: record.phone_number,
            website_uri: record.website_uri,
            attribution,
            location: record.location,
        }
    }

    /// Whether an attribution element should be displayed
    pub fn shows_attribution(&self) -> bool {
        self.attribution.is_some()
    }
}

/// A point in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Error returned when a bounding box is malformed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundsError {
    #[error("coordinate out of range: {0}")]
    OutOfRange(LatLng),
    #[error("southwest latitude {south} is north of northeast latitude {north}")]
    Inverted { south: f64, north: f64 },
}

/// Geographic rectangle used to bias autocomplete results
///
/// A box whose southwest longitude is greater than its northeast longitude
/// spans the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds")]
pub struct BoundingBox {
    southwest: LatLng,
    northeast: LatLng,
}

#[derive(Deserialize)]
struct RawBounds {
    southwest: LatLng,
    northeast: LatLng,
}

impl TryFrom<RawBounds> for BoundingBox {
    type Error = BoundsError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        BoundingBox::new(raw.southwest, raw.northeast)
    }
}

impl BoundingBox {
    /// Create a validated bounding box
    pub fn new(southwest: LatLng, northeast: LatLng) -> Result<Self, BoundsError> {
        for corner in [southwest, northeast] {
            if !corner.is_valid() {
                return Err(BoundsError::OutOfRange(corner));
            }
        }
        if southwest.lat > northeast.lat {
            return Err(BoundsError::Inverted {
                south: southwest.lat,
                north: northeast.lat,
            });
        }

        Ok(Self {
            southwest,
            northeast,
        })
    }

    /// The whole globe
    pub fn world() -> Self {
        Self {
            southwest: LatLng::new(-90.0, -180.0),
            northeast: LatLng::new(90.0, 180.0),
        }
    }

    pub fn southwest(&self) -> LatLng {
        self.southwest
    }

    pub fn northeast(&self) -> LatLng {
        self.northeast
    }

    /// Whether the box crosses the antimeridian
    pub fn spans_antimeridian(&self) -> bool {
        self.southwest.lng > self.northeast.lng
    }

    /// Check whether a point lies inside the box (edges inclusive)
    pub fn contains(&self, point: LatLng) -> bool {
        if point.lat < self.southwest.lat || point.lat > self.northeast.lat {
            return false;
        }
        if self.spans_antimeridian() {
            point.lng >= self.southwest.lng || point.lng <= self.northeast.lng
        } else {
            point.lng >= self.southwest.lng && point.lng <= self.northeast.lng
        }
    }

    /// Wire format: `sw_lat,sw_lng|ne_lat,ne_lng`
    pub fn to_param(&self) -> String {
        format!("{}|{}", self.southwest, self.northeast)
    }

    /// Autocomplete `locationbias` value: `rectangle:sw_lat,sw_lng|ne_lat,ne_lng`
    pub fn to_location_bias(&self) -> String {
        format!("rectangle:{}", self.to_param())
    }
}

/// Restriction on the kinds of places returned, passed to the service as-is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceFilter {
    types: Vec<String>,
}

impl PlaceFilter {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Only establishments (businesses, landmarks)
    pub fn establishments() -> Self {
        Self::new(["establishment"])
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Wire format: types joined by `|`
    pub fn to_param(&self) -> String {
        self.types.join("|")
    }
}
