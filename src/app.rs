use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capabilities::{Capabilities, GeoError, HttpError, HttpRequest, HttpResult};
use crate::event::Event;
use crate::model::{
    ApiConfig, CityName, Coordinate, ItemCategory, Model, RegionCode, SubmissionState,
};
use crate::payload;
use crate::{AppError, ErrorKind, CATALOG_TIMEOUT_MS, DIRECTORY_TIMEOUT_MS, SUBMIT_TIMEOUT_MS};

#[derive(Default)]
pub struct App;

// Wire shapes of the geographic directory service.
#[derive(Debug, Clone, Deserialize)]
struct UfDto {
    sigla: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CityDto {
    nome: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    pub id: i64,
    pub title: String,
    pub image_url: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFacingError {
    pub message: String,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(error: &AppError) -> Self {
        Self {
            message: error.user_facing_message(),
            is_retryable: error.is_retryable(),
            error_code: error.code().to_string(),
        }
    }
}

/// What the shell paints. A pure projection of the model; building it has
/// no side effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub initial_position: Coordinate,
    pub marker_position: Coordinate,

    pub name: String,
    pub email: String,
    pub whatsapp: String,

    pub regions: Vec<String>,
    pub selected_region: Option<String>,
    pub cities: Vec<String>,
    pub selected_city: Option<String>,
    pub cities_loading: bool,

    pub items: Vec<ItemView>,
    pub selected_item_count: usize,

    pub image_file_name: Option<String>,

    pub is_submitting: bool,
    pub is_submitted: bool,
    pub error: Option<UserFacingError>,
}

impl App {
    fn request_position(caps: &Capabilities) {
        caps.geo
            .current_position(|result| Event::PositionResult(Box::new(result)));
    }

    fn fetch_catalog(config: &ApiConfig, caps: &Capabilities) {
        let request = HttpRequest::get(config.items_url())
            .and_then(|r| r.with_timeout_ms(CATALOG_TIMEOUT_MS));

        match request {
            Ok(request) => {
                caps.http
                    .send(request, |result| Event::CatalogResponse(Box::new(result)));
            }
            Err(e) => warn!(error = %e, "catalog request could not be built"),
        }
    }

    fn fetch_regions(config: &ApiConfig, caps: &Capabilities) {
        let request = HttpRequest::get(config.regions_url())
            .and_then(|r| r.with_timeout_ms(DIRECTORY_TIMEOUT_MS));

        match request {
            Ok(request) => {
                caps.http
                    .send(request, |result| Event::RegionsResponse(Box::new(result)));
            }
            Err(e) => warn!(error = %e, "region request could not be built"),
        }
    }

    /// Issues the city fetch for `region`. The response event keeps the
    /// region it was issued for, which is what lets a late answer for a
    /// superseded selection be recognised and dropped. Returns whether a
    /// request actually went out.
    fn fetch_cities(region: RegionCode, config: &ApiConfig, caps: &Capabilities) -> bool {
        let request = HttpRequest::get(config.cities_url(&region))
            .and_then(|r| r.with_timeout_ms(DIRECTORY_TIMEOUT_MS));

        match request {
            Ok(request) => {
                caps.http.send(request, move |result| Event::CitiesResponse {
                    region,
                    result: Box::new(result),
                });
                true
            }
            Err(e) => {
                warn!(error = %e, region = %region, "city request could not be built");
                false
            }
        }
    }

    fn submit(model: &mut Model, caps: &Capabilities) {
        // The key survives failed attempts, so a retry of the same draft
        // dedupes server-side.
        let idempotency_key = model
            .submission_key
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        let form = payload::create_point_form(&model.draft);
        let body = form.encode();

        let request = HttpRequest::post(model.config.points_url())
            .and_then(|r| r.with_header("Content-Type", form.content_type()))
            .and_then(|r| r.with_header("Idempotency-Key", idempotency_key))
            .and_then(|r| r.with_timeout_ms(SUBMIT_TIMEOUT_MS))
            .and_then(|r| r.with_body(body));

        match request {
            Ok(request) => {
                model.submission = SubmissionState::InFlight;
                model.clear_error();
                caps.http
                    .send(request, |result| Event::SubmitResponse(Box::new(result)));
                info!("submission dispatched");
            }
            Err(e) => {
                model.set_error(
                    AppError::new(ErrorKind::Internal, "The registration could not be sent")
                        .with_internal(e.to_string()),
                );
                warn!(error = %e, "submission request could not be built");
            }
        }
    }

    fn handle_catalog_response(result: &HttpResult, model: &mut Model) {
        match result {
            Ok(response) if response.is_success() => {
                match response.json::<Vec<ItemCategory>>() {
                    Ok(items) => {
                        debug!(count = items.len(), "item catalog loaded");
                        model.items = items;
                    }
                    Err(e) => warn!(error = %e, "item catalog body could not be parsed"),
                }
            }
            Ok(response) => warn!(status = response.status(), "item catalog fetch failed"),
            Err(e) => warn!(error = %e, "item catalog fetch failed"),
        }
    }

    fn handle_regions_response(result: &HttpResult, model: &mut Model) {
        match result {
            Ok(response) if response.is_success() => match response.json::<Vec<UfDto>>() {
                Ok(regions) => {
                    debug!(count = regions.len(), "region list loaded");
                    model.regions = regions
                        .into_iter()
                        .map(|dto| RegionCode::new(dto.sigla))
                        .collect();
                }
                Err(e) => warn!(error = %e, "region list body could not be parsed"),
            },
            Ok(response) => warn!(status = response.status(), "region list fetch failed"),
            Err(e) => warn!(error = %e, "region list fetch failed"),
        }
    }

    fn handle_cities_response(region: RegionCode, result: &HttpResult, model: &mut Model) {
        // The pool belongs to the current selection. Anything that arrives
        // for another region lost the race and is dropped wholesale.
        if model.draft.region.as_ref() != Some(&region) {
            debug!(region = %region, "discarding city list for a superseded region");
            return;
        }

        model.cities_loading = false;

        match result {
            Ok(response) if response.is_success() => match response.json::<Vec<CityDto>>() {
                Ok(cities) => {
                    debug!(count = cities.len(), region = %region, "city list loaded");
                    model.cities = cities
                        .into_iter()
                        .map(|dto| CityName::new(dto.nome))
                        .collect();
                }
                Err(e) => warn!(error = %e, "city list body could not be parsed"),
            },
            Ok(response) => warn!(status = response.status(), "city list fetch failed"),
            Err(e) => warn!(error = %e, "city list fetch failed"),
        }
    }

    fn handle_submit_response(result: &HttpResult, model: &mut Model, caps: &Capabilities) {
        match result {
            Ok(response) if response.is_success() => {
                model.submission = SubmissionState::Submitted;
                model.submission_key = None;
                model.clear_error();
                info!("collection point created");
                caps.nav.home();
            }
            Ok(response) => {
                model.submission = SubmissionState::Idle;
                model.set_error(AppError::from_http_status(
                    response.status(),
                    Some(response.body()),
                ));
                warn!(status = response.status(), "submission rejected by the backend");
            }
            Err(e) => {
                model.submission = SubmissionState::Idle;
                let kind = match e {
                    HttpError::Timeout { .. } => ErrorKind::Timeout,
                    _ => ErrorKind::Network,
                };
                model.set_error(
                    AppError::new(kind, "The registration could not be sent")
                        .with_internal(e.to_string()),
                );
                warn!(error = %e, "submission failed in transit");
            }
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(event = event.name(), "applying event");

        match event {
            Event::Started => {
                Self::request_position(caps);
                Self::fetch_catalog(&model.config, caps);
                Self::fetch_regions(&model.config, caps);
                caps.render.render();
            }

            Event::PositionResult(result) => {
                match *result {
                    Ok(position) => {
                        match Coordinate::new(position.latitude, position.longitude).validate() {
                            Ok(coordinate) => {
                                model.initial_position = coordinate;
                                debug!("initial map position resolved");
                            }
                            Err(e) => warn!(error = %e, "ignoring out-of-range device position"),
                        }
                    }
                    Err(GeoError::PermissionDenied) => {
                        warn!("location permission denied, map keeps the default center");
                    }
                    Err(e) => warn!(error = %e, "device position unavailable"),
                }
                caps.render.render();
            }

            Event::CatalogResponse(result) => {
                Self::handle_catalog_response(&result, model);
                caps.render.render();
            }

            Event::RegionsResponse(result) => {
                Self::handle_regions_response(&result, model);
                caps.render.render();
            }

            Event::CitiesResponse { region, result } => {
                Self::handle_cities_response(region, &result, model);
                caps.render.render();
            }

            Event::FieldChanged { field, value } => {
                model.draft.set_contact_field(field, value);
                caps.render.render();
            }

            Event::RegionSelected { region } => {
                if let Some(region) = model.select_region(region) {
                    let requested = Self::fetch_cities(region, &model.config, caps);
                    model.cities_loading = requested;
                }
                caps.render.render();
            }

            Event::CitySelected { city } => {
                model.select_city(city);
                caps.render.render();
            }

            Event::MapClicked { lat, lng } => {
                // Map picks are taken as given; there is no bounds check here.
                model.draft.position = Coordinate::new(lat, lng);
                caps.render.render();
            }

            Event::ItemToggled { id } => {
                model.toggle_item(id);
                caps.render.render();
            }

            Event::FileSelected { file } => {
                model.draft.image = file;
                caps.render.render();
            }

            Event::SubmitRequested => {
                if model.submission.is_in_flight() {
                    warn!("ignoring submit while a submission is in flight");
                    return;
                }
                if model.submission.is_submitted() {
                    warn!("ignoring submit after the session already completed");
                    return;
                }
                Self::submit(model, caps);
                caps.render.render();
            }

            Event::SubmitResponse(result) => {
                Self::handle_submit_response(&result, model, caps);
                caps.render.render();
            }

            Event::DismissError => {
                model.clear_error();
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel {
            initial_position: model.initial_position,
            marker_position: model.draft.position,

            name: model.draft.name.clone(),
            email: model.draft.email.clone(),
            whatsapp: model.draft.whatsapp.clone(),

            regions: model.regions.iter().map(|r| r.0.clone()).collect(),
            selected_region: model.draft.region.as_ref().map(|r| r.0.clone()),
            cities: model.cities.iter().map(|c| c.0.clone()).collect(),
            selected_city: model.draft.city.as_ref().map(|c| c.0.clone()),
            cities_loading: model.cities_loading,

            items: model
                .items
                .iter()
                .map(|item| ItemView {
                    id: item.id.0,
                    title: item.title.clone(),
                    image_url: item.image_url.clone(),
                    selected: model.draft.is_selected(item.id),
                })
                .collect(),
            selected_item_count: model.draft.selected_items.len(),

            image_file_name: model.draft.image.as_ref().map(|i| i.file_name.clone()),

            is_submitting: model.submission.is_in_flight(),
            is_submitted: model.submission.is_submitted(),
            error: model.active_error.as_ref().map(UserFacingError::from),
        }
    }
}
