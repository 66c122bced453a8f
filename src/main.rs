mod butter;
mod config;
mod error;
mod notify;
mod schedule;
mod selection;
mod session;

#[cfg(test)]
mod test_utils;

use std::env;
use std::sync::Arc;

use actix_web::{get, middleware::Logger, post, web, App, HttpResponse, HttpServer, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::butter::client::ButterClient;
use crate::config::AppConfig;
use crate::error::{BusNotifyError, BusNotifyResult};
use crate::notify::{NotifyClient, TriggerDetail};
use crate::schedule::{resolve_upcoming_stops, TimeOfDay};
use crate::selection::{SelectedTrip, SelectionGuard};
use crate::session::{FileStore, SessionManager, SessionOutcome};

#[derive(Clone)]
pub struct ContextData {
    config: AppConfig,
    butter: ButterClient,
    notify: NotifyClient,
    session: Arc<SessionManager>,
    selection: Arc<SelectionGuard>,
}

#[derive(Deserialize)]
struct SessionQuery {
    jwt: Option<String>,
}

#[get("/ok")]
async fn ok() -> BusNotifyResult<impl Responder> {
    Ok(HttpResponse::Ok().finish())
}

#[get("/vehicles")]
async fn get_vehicles(ctx: web::Data<ContextData>) -> BusNotifyResult<impl Responder> {
    let entities = ctx
        .butter
        .get_positions_near(ctx.config.default_lat, ctx.config.default_lon)
        .await?;

    // Only vehicles that reported a position can be drawn
    let total = entities.len();
    let vehicles: Vec<_> = entities
        .into_iter()
        .filter(|e| {
            e.vehicle
                .as_ref()
                .map(|v| v.position.is_some())
                .unwrap_or(false)
        })
        .collect();

    log::debug!("{} of {} vehicles have a position", vehicles.len(), total);

    let response = web::Json(json!({
        "vehicles": vehicles,
    }));
    Ok(response)
}

#[get("/trips/{trip_id}/stops")]
async fn get_trip_stops(
    params: web::Path<(String,)>,
    ctx: web::Data<ContextData>,
) -> BusNotifyResult<impl Responder> {
    let (trip_id,) = params.into_inner();

    // Anything already in flight for an older selection loses to this one
    let token = ctx.selection.begin();

    let gtfs_id = &ctx.config.gtfs_id;
    let version_id = ctx.butter.get_version_id(gtfs_id).await?;
    let stop_times = ctx.butter.get_stop_times(gtfs_id, &version_id).await?;
    let stops = ctx.butter.get_stops(gtfs_id, &version_id).await?;

    let resolved = resolve_upcoming_stops(&trip_id, &stop_times, &stops, TimeOfDay::now_local());
    if resolved.is_empty() {
        log::info!("No upcoming stops for trip {}", trip_id);
    }

    let selected = SelectedTrip {
        trip_id,
        stops: resolved,
    };
    if !ctx.selection.commit(token, selected.clone()) {
        log::debug!(
            "Resolution for trip {} was superseded by a newer selection",
            selected.trip_id
        );
    }

    let response = web::Json(json!({
        "stops": selected.stops,
    }));
    Ok(response)
}

#[get("/selection")]
async fn get_selection(ctx: web::Data<ContextData>) -> BusNotifyResult<impl Responder> {
    let response = web::Json(json!({
        "selection": ctx.selection.current(),
        "email": ctx.session.current().map(|s| s.email),
    }));
    Ok(response)
}

#[get("/session")]
async fn get_session(
    query: web::Query<SessionQuery>,
    ctx: web::Data<ContextData>,
) -> BusNotifyResult<impl Responder> {
    let response = match ctx.session.initialize(query.jwt.as_deref()) {
        SessionOutcome::Active(session) => HttpResponse::Ok().json(json!({
            "email": session.email,
        })),
        SessionOutcome::RedirectRequired { login_url } => HttpResponse::Unauthorized().json(json!({
            "login": login_url,
        })),
    };
    Ok(response)
}

#[derive(Deserialize)]
struct NotificationRequest {
    trip_id: String,
    stop_id: String,
}

#[post("/notifications")]
async fn post_notification(
    query: web::Query<SessionQuery>,
    body: web::Json<NotificationRequest>,
    ctx: web::Data<ContextData>,
) -> BusNotifyResult<impl Responder> {
    let session = match ctx.session.initialize(query.jwt.as_deref()) {
        SessionOutcome::Active(session) => session,
        SessionOutcome::RedirectRequired { login_url } => {
            return Ok(HttpResponse::Unauthorized().json(json!({ "login": login_url })));
        }
    };

    if body.trip_id.is_empty() || body.stop_id.is_empty() {
        return Err(BusNotifyError::Response(
            400,
            "trip_id and stop_id are required".to_string(),
        ));
    }

    let detail = TriggerDetail {
        gtfs_id: ctx.config.gtfs_id.clone(),
        trip_id: body.trip_id.clone(),
        stop_id: body.stop_id.clone(),
    };

    ctx.notify.register(&session, &detail).await?;

    Ok(HttpResponse::Ok().json(json!({ "status": "registered" })))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::try_init().ok();

    log::debug!("Debug logging enabled");

    dotenvy::from_filename(".env").ok();

    let config = AppConfig::from_env()
        .map_err(BusNotifyError::Config)
        .unwrap();

    let butter = ButterClient::new(&config.butter_base_url, config.request_timeout)
        .map_err(BusNotifyError::Butter)
        .unwrap();
    let notify = NotifyClient::new(
        &config.notify_endpoint,
        config.notify_dry_run,
        config.request_timeout,
    )
    .map_err(BusNotifyError::Notify)
    .unwrap();

    let session = Arc::new(SessionManager::new(
        config.login_url.clone(),
        Box::new(FileStore::new(&config.credential_store_path)),
    ));
    let selection = Arc::new(SelectionGuard::default());

    let ctx = ContextData {
        config,
        butter,
        notify,
        session,
        selection,
    };

    let listen_address = ctx.config.listen_address.clone();

    log::info!("Starting server at {}", listen_address);

    HttpServer::new(move || {
        let logger = Logger::default();

        let mut cors = actix_cors::Cors::default()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec!["accept", "content-type"]);

        if let Ok(allowed_origin) = env::var("ALLOW_ORIGIN") {
            if allowed_origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(&allowed_origin);
            }
        }

        App::new()
            .wrap(logger)
            .wrap(cors)
            .app_data(web::Data::new(ctx.clone()))
            .service(ok)
            .service(get_vehicles)
            .service(get_trip_stops)
            .service(get_selection)
            .service(get_session)
            .service(post_notification)
    })
    .bind(listen_address)?
    .run()
    .await
}
