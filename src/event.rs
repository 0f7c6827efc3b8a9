use crate::capabilities::{GeoResult, HttpResult};
use crate::model::{CityName, ContactField, ImageFile, ItemId, RegionCode};

/// Everything that can happen to a registration session: user interactions
/// from the shell and responses from the capabilities. Response payloads are
/// boxed to keep the enum small.
#[derive(Debug, Clone)]
pub enum Event {
    /// Sent once by the shell when the registration view mounts.
    Started,

    // Capability responses
    PositionResult(Box<GeoResult>),
    CatalogResponse(Box<HttpResult>),
    RegionsResponse(Box<HttpResult>),
    /// Carries the region that initiated the fetch, so responses arriving
    /// after the selection moved on can be told apart and dropped.
    CitiesResponse {
        region: RegionCode,
        result: Box<HttpResult>,
    },
    SubmitResponse(Box<HttpResult>),

    // User interactions
    FieldChanged {
        field: ContactField,
        value: String,
    },
    RegionSelected {
        region: Option<RegionCode>,
    },
    CitySelected {
        city: Option<CityName>,
    },
    MapClicked {
        lat: f64,
        lng: f64,
    },
    ItemToggled {
        id: ItemId,
    },
    FileSelected {
        file: Option<ImageFile>,
    },
    SubmitRequested,
    DismissError,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::PositionResult(_) => "position_result",
            Self::CatalogResponse(_) => "catalog_response",
            Self::RegionsResponse(_) => "regions_response",
            Self::CitiesResponse { .. } => "cities_response",
            Self::SubmitResponse(_) => "submit_response",
            Self::FieldChanged { .. } => "field_changed",
            Self::RegionSelected { .. } => "region_selected",
            Self::CitySelected { .. } => "city_selected",
            Self::MapClicked { .. } => "map_clicked",
            Self::ItemToggled { .. } => "item_toggled",
            Self::FileSelected { .. } => "file_selected",
            Self::SubmitRequested => "submit_requested",
            Self::DismissError => "dismiss_error",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::FieldChanged { .. }
                | Self::RegionSelected { .. }
                | Self::CitySelected { .. }
                | Self::MapClicked { .. }
                | Self::ItemToggled { .. }
                | Self::FileSelected { .. }
                | Self::SubmitRequested
                | Self::DismissError
        )
    }
}
