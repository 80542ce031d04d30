use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::Json;

use crate::context::RequestContext;
use crate::error::AppError;
use crate::models::{CreateUserInput, UpdateUserInput, User, UserFilter};
use crate::state::SharedState;

/// Raw query string values; numbers that do not parse fall back to defaults.
#[derive(Debug, Default)]
pub struct SearchParams {
    pub nom: Option<String>,
    pub email: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl SearchParams {
    /// Unknown keys are ignored; a repeated key keeps its last value.
    pub fn from_query(raw: Option<&str>) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            let slot = match key.as_ref() {
                "nom" => &mut params.nom,
                "email" => &mut params.email,
                "limit" => &mut params.limit,
                "offset" => &mut params.offset,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }
        params
    }

    pub fn into_filter(self) -> UserFilter {
        UserFilter {
            email: self.email.filter(|v| !v.is_empty()),
            nom: self.nom.filter(|v| !v.is_empty()),
            offset: parse_number(self.offset.as_deref()),
            limit: parse_number(self.limit.as_deref()),
        }
    }
}

fn parse_number(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(0)
}

fn path_id(path: Result<Path<String>, PathRejection>) -> Result<String, AppError> {
    path.map(|Path(id)| id)
        .map_err(|e| AppError::BadRequest(format!("Invalid id parameter: {}", e.body_text())))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e.body_text())))
}

pub async fn create(
    ctx: RequestContext,
    State(state): State<SharedState>,
    payload: Result<Json<CreateUserInput>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let input = json_body(payload)?;
    let user = state.users.create_user(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get(
    ctx: RequestContext,
    State(state): State<SharedState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<User>, AppError> {
    let id = path_id(path)?;
    if id.trim().is_empty() {
        return Err(AppError::BadRequest("Missing id parameter".to_string()));
    }
    let user = state.users.get_user(&ctx, &id).await?;
    Ok(Json(user))
}

pub async fn search(
    ctx: RequestContext,
    State(state): State<SharedState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<User>>, AppError> {
    let params = SearchParams::from_query(query.as_deref());
    let users = state
        .users
        .search_users(&ctx, params.into_filter())
        .await?;
    Ok(Json(users))
}

pub async fn update(
    ctx: RequestContext,
    State(state): State<SharedState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateUserInput>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let id = path_id(path)?;
    let input = json_body(payload)?;
    let user = state.users.update_user(&ctx, &id, input).await?;
    Ok(Json(user))
}

pub async fn delete(
    ctx: RequestContext,
    State(state): State<SharedState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = path_id(path)?;
    state.users.delete_user(&ctx, &id).await?;
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
