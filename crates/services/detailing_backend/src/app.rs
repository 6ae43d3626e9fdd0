// --- File: crates/services/detailing_backend/src/app.rs ---
use axum::Router;
use detailing_admin::SessionGuard;
use detailing_common::DetailingError;
use detailing_config::AppConfig;
use detailing_square::SquareApi;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Every feature router, nested under `/api`.
pub fn build_router(
    config: &AppConfig,
    square: Arc<dyn SquareApi>,
    guard: Arc<SessionGuard>,
) -> Result<Router, DetailingError> {
    let api = Router::new()
        .merge(detailing_common::routes())
        .merge(detailing_admin::routes(guard.clone()))
        .merge(detailing_square::routes(square.clone(), guard.clone()))
        .merge(detailing_booking::routes(square, guard, config)?);

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = Router::new().nest("/api", api);

    #[cfg(feature = "openapi")]
    {
        use detailing_admin::doc::AdminApiDoc;
        use detailing_booking::doc::BookingApiDoc;
        use detailing_square::doc::SquareApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Detailing API",
                version = "0.1.0",
                description = "Booking, payment and admin endpoints of the detailing backend",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers((url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(AdminApiDoc::openapi());
        openapi_doc.merge(SquareApiDoc::openapi());
        openapi_doc.merge(BookingApiDoc::openapi());
        tracing::info!("Adding Swagger UI at /api/docs");

        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    Ok(app.layer(TraceLayer::new_for_http()))
}
