//! OpenAPI schema for the admin/webhook surface.

use utoipa::OpenApi;

use crate::rest::dto::{ConfigResponse, HealthResponse, SessionListResponse, WebhookAcceptedResponse};
use crate::session::{Session, SessionMetadata, SessionStatus, SecurityContext, TriggerEventType};
use crate::session::manager::SessionStats;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::rest::routes::health::health,
        crate::rest::routes::health::config,
        crate::rest::routes::health::stats,
        crate::rest::routes::sessions::list,
        crate::rest::routes::sessions::list_active,
        crate::rest::routes::sessions::get_one,
        crate::rest::routes::sessions::cancel,
        crate::rest::routes::webhooks::linear,
        crate::rest::routes::webhooks::codegen,
    ),
    components(schemas(
        HealthResponse,
        ConfigResponse,
        SessionListResponse,
        WebhookAcceptedResponse,
        SessionStats,
        Session,
        SessionStatus,
        SessionMetadata,
        SecurityContext,
        TriggerEventType,
    )),
    tags(
        (name = "Health", description = "Liveness and sanitized configuration"),
        (name = "Config", description = "Sanitized configuration"),
        (name = "Stats", description = "Session counters"),
        (name = "Sessions", description = "Session inspection and cancellation"),
        (name = "Webhooks", description = "Inbound tracker and runner events"),
    )
)]
pub struct ApiDoc;
