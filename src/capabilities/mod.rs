mod geo;
mod http;
mod nav;

pub use self::geo::{Geo, GeoError, GeoOperation, GeoPosition, GeoResult};
pub use self::http::{
    Http, HttpError, HttpMethod, HttpOperation, HttpRequest, HttpResponse, HttpResult,
    ValidatedUrl, DEFAULT_TIMEOUT_MS, MAX_REQUEST_BODY_SIZE, MAX_TIMEOUT_MS,
};
pub use self::nav::{Nav, NavOperation};

// We use Crux's built-in Render capability directly; it provides everything
// needed for triggering view updates.
pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub geo: Geo<Event>,
    pub nav: Nav<Event>,
    pub render: Render<Event>,
}
