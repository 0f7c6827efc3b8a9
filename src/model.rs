use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::warn;

use crate::{AppError, DEFAULT_BACKEND_BASE, DEFAULT_GEODATA_BASE};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

/// A latitude/longitude pair. `(0, 0)` doubles as the "not yet chosen"
/// default, so nothing in the core treats the origin specially.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Range check, applied only where a reading comes from a sensor.
    /// Map picks are stored verbatim.
    pub fn validate(self) -> Result<Self, CoordinateError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoordinateError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(CoordinateError::LongitudeOutOfRange(self.lng));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionCode(pub String);

impl RegionCode {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CityName(pub String);

impl CityName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the accepted-materials catalog. Doubles as the wire shape
/// of the backend `items` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCategory {
    pub id: ItemId,
    pub title: String,
    pub image_url: String,
}

/// The attachment handed over by the shell's file-drop widget.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl ImageFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }

    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        sniff_image_mime(&self.data).unwrap_or("application/octet-stream")
    }
}

// Redact the raw bytes; a multi-megabyte Debug dump helps nobody.
impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("size_bytes", &self.data.len())
            .finish()
    }
}

#[must_use]
pub fn sniff_image_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if data.starts_with(b"RIFF") && data.len() >= 12 && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Name,
    Email,
    Whatsapp,
}

impl ContactField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Whatsapp => "whatsapp",
        }
    }
}

/// Per-session endpoint configuration. Owned by the `Model`; there is no
/// process-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub backend_base: String,
    pub geodata_base: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            backend_base: DEFAULT_BACKEND_BASE.into(),
            geodata_base: DEFAULT_GEODATA_BASE.into(),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn items_url(&self) -> String {
        format!("{}/items", self.backend_base.trim_end_matches('/'))
    }

    #[must_use]
    pub fn points_url(&self) -> String {
        format!("{}/points", self.backend_base.trim_end_matches('/'))
    }

    #[must_use]
    pub fn regions_url(&self) -> String {
        format!("{}/estados", self.geodata_base.trim_end_matches('/'))
    }

    #[must_use]
    pub fn cities_url(&self, region: &RegionCode) -> String {
        format!(
            "{}/estados/{}/municipios",
            self.geodata_base.trim_end_matches('/'),
            region.as_str()
        )
    }
}

/// The record under construction. Mutated one event at a time; discarded
/// with the session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub region: Option<RegionCode>,
    pub city: Option<CityName>,
    pub position: Coordinate,
    pub selected_items: Vec<ItemId>,
    pub image: Option<ImageFile>,
}

impl Draft {
    pub fn set_contact_field(&mut self, field: ContactField, value: String) {
        match field {
            ContactField::Name => self.name = value,
            ContactField::Email => self.email = value,
            ContactField::Whatsapp => self.whatsapp = value,
        }
    }

    /// Symmetric-difference update: present ids are removed, absent ids are
    /// appended. Insertion order is what the submission payload iterates.
    pub fn toggle_item(&mut self, id: ItemId) {
        if let Some(index) = self.selected_items.iter().position(|selected| *selected == id) {
            self.selected_items.remove(index);
        } else {
            self.selected_items.push(id);
        }
    }

    #[must_use]
    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selected_items.contains(&id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
    Submitted,
}

impl SubmissionState {
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(self, Self::InFlight)
    }

    #[must_use]
    pub const fn is_submitted(self) -> bool {
        matches!(self, Self::Submitted)
    }
}

/// All state for one registration session: the option pools fed by the
/// remote sources, the draft being assembled, and transient status.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub config: ApiConfig,

    // Read-only option pools
    pub items: Vec<ItemCategory>,
    pub regions: Vec<RegionCode>,
    pub cities: Vec<CityName>,
    pub cities_loading: bool,

    // Map seed; never written by map clicks
    pub initial_position: Coordinate,

    pub draft: Draft,

    pub submission: SubmissionState,
    pub submission_key: Option<String>,
    pub active_error: Option<AppError>,
}

impl Model {
    #[must_use]
    pub fn with_config(config: ApiConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    #[must_use]
    pub fn catalog_contains(&self, id: ItemId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    /// Toggles an item selection. Ids outside the fetched catalog are a
    /// caller bug: they trip a debug assertion and are ignored in release.
    pub fn toggle_item(&mut self, id: ItemId) {
        if !self.catalog_contains(id) {
            debug_assert!(false, "toggled item {id} is not in the fetched catalog");
            warn!(item_id = id.0, "ignoring toggle for unknown catalog item");
            return;
        }
        self.draft.toggle_item(id);
    }

    /// Applies a region selection. A change away from the previous value
    /// invalidates the city pool and the city selection, which both belong
    /// to the outgoing region. Returns the region a city fetch is owed for.
    pub fn select_region(&mut self, region: Option<RegionCode>) -> Option<RegionCode> {
        if self.draft.region == region {
            return None;
        }

        self.draft.region = region.clone();
        self.draft.city = None;
        self.cities.clear();
        self.cities_loading = false;

        region
    }

    pub fn select_city(&mut self, city: Option<CityName>) {
        self.draft.city = city;
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submission.is_in_flight()
    }
}
