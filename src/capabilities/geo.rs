use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One-shot device geolocation. The shell answers with the current reading
/// or the reason it could not produce one; the core never polls.
#[derive(Clone)]
pub struct Geo<Ev> {
    context: CapabilityContext<GeoOperation, Ev>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoOperation {
    CurrentPosition,
}

impl Operation for GeoOperation {
    type Output = GeoResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location service unavailable")]
    Unavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("location request failed: {0}")]
    Failed(String),
}

pub type GeoResult = Result<GeoPosition, GeoError>;

impl<Ev> Geo<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<GeoOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn current_position<F>(&self, make_event: F)
    where
        F: FnOnce(GeoResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(GeoOperation::CurrentPosition).await;
            context.update_app(make_event(result));
        });
    }
}

impl<Ev> Capability<Ev> for Geo<Ev> {
    type Operation = GeoOperation;
    type MappedSelf<MappedEv> = Geo<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Geo::new(self.context.map_event(f))
    }
}
