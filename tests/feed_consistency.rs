use crux_core::testing::AppTester;
use crux_core::Request;

use ecopoint_core::capabilities::{
    GeoError, GeoOperation, GeoPosition, HttpOperation, HttpResponse, HttpResult,
};
use ecopoint_core::{App, CityName, Coordinate, Effect, Event, Model, RegionCode};

type Tester = AppTester<App, Effect>;

fn http_requests(effects: Vec<Effect>) -> Vec<Request<HttpOperation>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn geo_requests(effects: Vec<Effect>) -> Vec<Request<GeoOperation>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Geo(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn request_url(request: &Request<HttpOperation>) -> String {
    let HttpOperation::Execute(inner) = &request.operation;
    inner.url().as_str().to_string()
}

fn ok_json(json: &str) -> HttpResult {
    Ok(HttpResponse::ok(json.as_bytes().to_vec()))
}

fn apply_events(app: &Tester, model: &mut Model, events: Vec<Event>) {
    for event in events {
        app.update(event, model);
    }
}

#[test]
fn region_selection_issues_exactly_one_scoped_city_fetch() {
    let app = Tester::default();
    let mut model = Model::default();
    app.update(Event::Started, &mut model);

    let update = app.update(
        Event::RegionSelected {
            region: Some(RegionCode::new("SP")),
        },
        &mut model,
    );
    let requests = http_requests(update.effects);
    assert_eq!(requests.len(), 1);
    assert!(request_url(&requests[0]).ends_with("/estados/SP/municipios"));
    assert!(model.cities_loading);

    // Re-selecting the same region is a no-op: no second fetch.
    let update = app.update(
        Event::RegionSelected {
            region: Some(RegionCode::new("SP")),
        },
        &mut model,
    );
    assert!(http_requests(update.effects).is_empty());
}

#[test]
fn late_city_response_for_a_superseded_region_is_dropped() {
    let app = Tester::default();
    let mut model = Model::default();
    app.update(Event::Started, &mut model);

    let update = app.update(
        Event::RegionSelected {
            region: Some(RegionCode::new("SP")),
        },
        &mut model,
    );
    let mut sp_request = http_requests(update.effects).remove(0);

    // The selection moves on before the SP answer lands.
    let update = app.update(
        Event::RegionSelected {
            region: Some(RegionCode::new("RJ")),
        },
        &mut model,
    );
    let mut rj_request = http_requests(update.effects).remove(0);
    assert!(request_url(&rj_request).ends_with("/estados/RJ/municipios"));

    // The stale SP answer must not populate the RJ pool.
    let update = app
        .resolve(
            &mut sp_request,
            ok_json(r#"[{"nome":"Campinas"},{"nome":"Santos"}]"#),
        )
        .expect("request resolves");
    apply_events(&app, &mut model, update.events);
    assert!(model.cities.is_empty());
    assert!(model.cities_loading);

    let update = app
        .resolve(
            &mut rj_request,
            ok_json(r#"[{"nome":"Niterói"},{"nome":"Petrópolis"}]"#),
        )
        .expect("request resolves");
    apply_events(&app, &mut model, update.events);
    assert_eq!(
        model.cities,
        vec![CityName::new("Niterói"), CityName::new("Petrópolis")]
    );
    assert!(!model.cities_loading);
}

#[test]
fn clearing_the_region_empties_the_pool_and_makes_no_fetch() {
    let app = Tester::default();
    let mut model = Model::default();
    app.update(Event::Started, &mut model);

    let update = app.update(
        Event::RegionSelected {
            region: Some(RegionCode::new("SP")),
        },
        &mut model,
    );
    let mut sp_request = http_requests(update.effects).remove(0);
    let update = app
        .resolve(&mut sp_request, ok_json(r#"[{"nome":"Campinas"}]"#))
        .expect("request resolves");
    apply_events(&app, &mut model, update.events);
    assert_eq!(model.cities.len(), 1);

    let update = app.update(Event::RegionSelected { region: None }, &mut model);
    assert!(http_requests(update.effects).is_empty());
    assert!(model.cities.is_empty());
    assert_eq!(model.draft.region, None);
    assert_eq!(model.draft.city, None);
}

#[test]
fn region_change_resets_a_previously_selected_city() {
    let app = Tester::default();
    let mut model = Model::default();
    app.update(Event::Started, &mut model);

    let update = app.update(
        Event::RegionSelected {
            region: Some(RegionCode::new("SP")),
        },
        &mut model,
    );
    let mut sp_request = http_requests(update.effects).remove(0);
    let update = app
        .resolve(&mut sp_request, ok_json(r#"[{"nome":"Campinas"}]"#))
        .expect("request resolves");
    apply_events(&app, &mut model, update.events);

    app.update(
        Event::CitySelected {
            city: Some(CityName::new("Campinas")),
        },
        &mut model,
    );
    assert_eq!(model.draft.city, Some(CityName::new("Campinas")));

    app.update(
        Event::RegionSelected {
            region: Some(RegionCode::new("RJ")),
        },
        &mut model,
    );
    assert_eq!(model.draft.city, None);
    assert!(model.cities.is_empty());
}

#[test]
fn probe_success_centers_the_map_without_touching_the_marker() {
    let app = Tester::default();
    let mut model = Model::default();

    let update = app.update(Event::Started, &mut model);
    let mut geo = geo_requests(update.effects).remove(0);

    let update = app
        .resolve(
            &mut geo,
            Ok(GeoPosition {
                latitude: -23.55,
                longitude: -46.63,
                accuracy_m: Some(12.0),
            }),
        )
        .expect("request resolves");
    apply_events(&app, &mut model, update.events);

    assert_eq!(model.initial_position, Coordinate::new(-23.55, -46.63));
    assert_eq!(model.draft.position, Coordinate::default());
}

#[test]
fn probe_failure_keeps_the_default_center_and_the_form_usable() {
    let app = Tester::default();
    let mut model = Model::default();

    let update = app.update(Event::Started, &mut model);
    let mut geo = geo_requests(update.effects).remove(0);

    let update = app
        .resolve(&mut geo, Err(GeoError::PermissionDenied))
        .expect("request resolves");
    apply_events(&app, &mut model, update.events);

    assert_eq!(model.initial_position, Coordinate::default());
    assert!(model.active_error.is_none(), "probe failure is soft");

    // The other feeds keep working.
    let update = app.update(
        Event::RegionSelected {
            region: Some(RegionCode::new("SP")),
        },
        &mut model,
    );
    assert_eq!(http_requests(update.effects).len(), 1);
}

#[test]
fn out_of_range_probe_reading_is_treated_as_a_failed_probe() {
    let app = Tester::default();
    let mut model = Model::default();

    let update = app.update(Event::Started, &mut model);
    let mut geo = geo_requests(update.effects).remove(0);

    let update = app
        .resolve(
            &mut geo,
            Ok(GeoPosition {
                latitude: 120.0,
                longitude: 10.0,
                accuracy_m: None,
            }),
        )
        .expect("request resolves");
    apply_events(&app, &mut model, update.events);

    assert_eq!(model.initial_position, Coordinate::default());
}
