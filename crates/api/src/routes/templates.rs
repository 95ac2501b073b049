//! Template endpoint handlers.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_render, record_template_created, record_version_recorded};
use crate::response::ApiResponse;
use domain::models::{
    CreateTemplateRequest, ListTemplatesQuery, RenderTemplateRequest, RenderedTemplate, Template,
    TemplateVersion, UpdateTemplateRequest,
};

/// List templates.
///
/// GET /templates?page=&limit=&language=&query=
pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<ListTemplatesQuery>,
) -> Result<Json<ApiResponse<Vec<Template>>>, ApiError> {
    let page = state
        .service
        .list_templates(query.filter(), query.page_request())
        .await?;

    Ok(Json(
        ApiResponse::ok(page.items)
            .with_message("Templates fetched successfully")
            .with_meta(page.meta),
    ))
}

/// Get a template by id.
///
/// GET /templates/:id
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Template>>, ApiError> {
    let template = state.service.get_template(&id).await?;
    Ok(Json(
        ApiResponse::ok(template).with_message("Template fetched successfully"),
    ))
}

/// Create a template and record its first version.
///
/// POST /templates
pub async fn create_template(
    State(state): State<AppState>,
    payload: Result<Json<CreateTemplateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Template>>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let template = state.service.create_template(request).await?;
    record_template_created(&template.language);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(template).with_message("Template created successfully")),
    ))
}

/// Partially update a template.
///
/// PATCH /templates/:id
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTemplateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Template>>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let versioned = request.touches_content();
    let template = state.service.update_template(&id, request).await?;
    if versioned {
        record_version_recorded();
    }

    Ok(Json(
        ApiResponse::ok(template).with_message("Template updated successfully"),
    ))
}

/// Version history of a template, newest first.
///
/// GET /templates/:id/versions
pub async fn list_template_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<TemplateVersion>>>, ApiError> {
    let versions = state.service.list_template_versions(&id).await?;
    Ok(Json(
        ApiResponse::ok(versions).with_message("Template versions fetched successfully"),
    ))
}

/// Render a template against caller-supplied variables.
///
/// POST /templates/:id/render
///
/// An empty body renders with no variables.
pub async fn render_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ApiResponse<RenderedTemplate>>, ApiError> {
    let request = parse_render_request(&body)?;

    let result = state.service.render_template(&id, &request.variables).await;
    record_render(if result.is_ok() { "ok" } else { "error" });
    let rendered = result?;

    info!(template_id = %id, version = rendered.version, "Template rendered");

    Ok(Json(
        ApiResponse::ok(rendered).with_message("Template rendered successfully"),
    ))
}

fn parse_render_request(body: &[u8]) -> Result<RenderTemplateRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RenderTemplateRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::validation(format!("Invalid request body: {}", e)))
}
