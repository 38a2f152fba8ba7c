use axum::{
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Local, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::export::export_resume;
use crate::models::resume::{EntryId, EntryList, ResumeData};
use crate::resume::controller::PersonalInfoPatch;
use crate::resume::validation::FieldError;
use crate::state::AppState;

/// Format of the "last saved" indicator shown next to the form.
const SAVED_LABEL_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
const PAGE_COUNT_HEADER: &str = "x-page-count";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub draft: ResumeData,
    pub dirty: bool,
    pub exporting: bool,
    pub last_saved: Option<DateTime<Utc>>,
    pub last_saved_label: Option<String>,
    /// Advisory only; nothing is blocked until commit or export.
    pub errors: Vec<FieldError>,
}

#[derive(Deserialize)]
pub struct TextBody {
    pub text: String,
}

fn entry_list(name: &str) -> Result<EntryList, AppError> {
    [
        EntryList::Education,
        EntryList::WorkExperience,
        EntryList::Qualifications,
    ]
    .into_iter()
    .find(|list| list.as_str() == name)
    .ok_or_else(|| AppError::BadRequest(format!("Unknown entry list '{name}'")))
}

fn parse_patch<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::BadRequest(format!("Invalid patch: {e}")))
}

/// GET /resume
pub async fn handle_get_resume(State(state): State<AppState>) -> Json<SessionView> {
    let controller = state.session.lock().await;
    let last_saved = controller.last_saved();
    Json(SessionView {
        draft: controller.draft().clone(),
        dirty: controller.is_dirty(),
        exporting: controller.is_exporting(),
        last_saved,
        last_saved_label: last_saved
            .map(|at| at.with_timezone(&Local).format(SAVED_LABEL_FORMAT).to_string()),
        errors: controller.advisory().errors,
    })
}

/// PATCH /resume/personal-info
pub async fn handle_update_personal_info(
    State(state): State<AppState>,
    Json(patch): Json<PersonalInfoPatch>,
) -> StatusCode {
    state.session.lock().await.update_personal_info(patch);
    StatusCode::NO_CONTENT
}

/// PUT /resume/motivation
pub async fn handle_set_motivation(
    State(state): State<AppState>,
    Json(body): Json<TextBody>,
) -> StatusCode {
    state.session.lock().await.set_motivation(body.text);
    StatusCode::NO_CONTENT
}

/// PUT /resume/self-pr
pub async fn handle_set_self_pr(
    State(state): State<AppState>,
    Json(body): Json<TextBody>,
) -> StatusCode {
    state.session.lock().await.set_self_pr(body.text);
    StatusCode::NO_CONTENT
}

/// POST /resume/:list/entries
pub async fn handle_add_entry(
    State(state): State<AppState>,
    Path(list): Path<String>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let list = entry_list(&list)?;
    let id = state.session.lock().await.add_entry(list);
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// PATCH /resume/:list/entries/:id
pub async fn handle_update_entry(
    State(state): State<AppState>,
    Path((list, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<StatusCode, AppError> {
    let list = entry_list(&list)?;
    let id = EntryId::from(id);
    let mut controller = state.session.lock().await;
    let found = match list {
        EntryList::Education => controller.update_education(&id, parse_patch(body)?),
        EntryList::WorkExperience => controller.update_work_experience(&id, parse_patch(body)?),
        EntryList::Qualifications => controller.update_qualification(&id, parse_patch(body)?),
    };
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Entry {id} not found in {}", list.as_str())))
    }
}

/// DELETE /resume/:list/entries/:id
///
/// Removing an id that is not present is a no-op.
pub async fn handle_remove_entry(
    State(state): State<AppState>,
    Path((list, id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let list = entry_list(&list)?;
    state
        .session
        .lock()
        .await
        .remove_entry(list, &EntryId::from(id));
    Ok(StatusCode::NO_CONTENT)
}

/// POST /resume/commit
pub async fn handle_commit(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let updated_at = state.session.lock().await.commit()?;
    Ok(Json(json!({ "updatedAt": updated_at })))
}

/// POST /resume/export
pub async fn handle_export(State(state): State<AppState>) -> Result<Response, AppError> {
    let artifact = export_resume(state.session.clone(), state.page_config.clone()).await?;
    let headers = [
        (header::CONTENT_TYPE, artifact.content_type.to_string()),
        (header::CONTENT_DISPOSITION, artifact.content_disposition()),
        (HeaderName::from_static(PAGE_COUNT_HEADER), artifact.page_count.to_string()),
    ];
    Ok((headers, artifact.body).into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
        Router,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::layout::default_page_config;
    use crate::resume::controller::FormController;
    use crate::routes::build_router;
    use crate::store::{MemoryStore, ResumeRepository};

    fn app() -> (Arc<MemoryStore>, Router) {
        let store = Arc::new(MemoryStore::new());
        let controller = FormController::open(ResumeRepository::new(store.clone()));
        let state = AppState::new(controller, default_page_config());
        (store, build_router(state))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        app.clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn fill_valid_personal_info(app: &Router) {
        let response = send(
            app,
            Method::PATCH,
            "/resume/personal-info",
            Some(json!({
                "name": "山田太郎",
                "nameKana": "ヤマダタロウ",
                "birthDate": "1990年1月1日",
                "gender": "male",
                "address": "東京都千代田区",
                "phone": "03-1234-5678",
                "email": "taro@example.com"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_get_blank_session() {
        let (_, app) = app();
        let response = send(&app, Method::GET, "/resume", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["dirty"], false);
        assert_eq!(body["exporting"], false);
        assert!(body["lastSaved"].is_null());
        assert_eq!(body["draft"]["personalInfo"]["name"], "");
        assert!(!body["errors"].as_array().unwrap().is_empty(), "blank draft has advisories");
    }

    #[tokio::test]
    async fn test_edits_mark_session_dirty() {
        let (store, app) = app();
        let response = send(
            &app,
            Method::PUT,
            "/resume/motivation",
            Some(json!({ "text": "御社を志望します" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let body = json_body(send(&app, Method::GET, "/resume", None).await).await;
        assert_eq!(body["dirty"], true);
        assert_eq!(body["draft"]["motivation"], "御社を志望します");
        assert_eq!(store.write_count(), 0, "edits never write through");
    }

    #[tokio::test]
    async fn test_entry_lifecycle() {
        let (_, app) = app();
        let response = send(&app, Method::POST, "/resume/workExperience/entries", None).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = json_body(response).await["id"].as_str().unwrap().to_string();

        let uri = format!("/resume/workExperience/entries/{id}");
        let response = send(
            &app,
            Method::PATCH,
            &uri,
            Some(json!({ "company": "B社", "status": "current" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let body = json_body(send(&app, Method::GET, "/resume", None).await).await;
        assert_eq!(body["draft"]["workExperience"][0]["company"], "B社");
        assert_eq!(body["draft"]["workExperience"][0]["status"], "current");

        assert_eq!(send(&app, Method::DELETE, &uri, None).await.status(), StatusCode::NO_CONTENT);
        assert_eq!(send(&app, Method::DELETE, &uri, None).await.status(), StatusCode::NO_CONTENT);
        let body = json_body(send(&app, Method::GET, "/resume", None).await).await;
        assert!(body["draft"]["workExperience"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_patch_unknown_entry_is_not_found() {
        let (_, app) = app();
        let response = send(
            &app,
            Method::PATCH,
            "/resume/education/entries/missing",
            Some(json!({ "institution": "A大学" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_list_is_bad_request() {
        let (_, app) = app();
        let response = send(&app, Method::POST, "/resume/hobbies/entries", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_commit_invalid_draft_returns_field_errors() {
        let (store, app) = app();
        let response = send(&app, Method::POST, "/resume/commit", None).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        let fields = body["error"]["fields"].as_array().unwrap();
        assert!(fields
            .iter()
            .any(|f| f["field"] == "personalInfo.email" && f["message"] == "メールアドレスは必須です"));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_commit_valid_draft_saves() {
        let (store, app) = app();
        fill_valid_personal_info(&app).await;

        let response = send(&app, Method::POST, "/resume/commit", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(json_body(response).await["updatedAt"].is_string());
        assert_eq!(store.write_count(), 1);

        let body = json_body(send(&app, Method::GET, "/resume", None).await).await;
        assert_eq!(body["dirty"], false);
        assert!(body["lastSavedLabel"].is_string());
    }

    #[tokio::test]
    async fn test_export_returns_pdf_attachment() {
        let (store, app) = app();
        fill_valid_personal_info(&app).await;

        let response = send(&app, Method::POST, "/resume/export", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment;"));
        assert_eq!(response.headers()[PAGE_COUNT_HEADER], "1");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(store.write_count(), 1, "export saves through");
    }

    #[tokio::test]
    async fn test_export_invalid_draft_is_unprocessable() {
        let (_, app) = app();
        let response = send(&app, Method::POST, "/resume/export", None).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_export_conflict_while_in_flight() {
        let store = Arc::new(MemoryStore::new());
        let mut controller = FormController::open(ResumeRepository::new(store));
        controller.update_personal_info(PersonalInfoPatch {
            name: Some("山田太郎".to_string()),
            name_kana: Some("ヤマダタロウ".to_string()),
            birth_date: Some("1990年1月1日".to_string()),
            address: Some("東京都".to_string()),
            phone: Some("090-0000-0000".to_string()),
            email: Some("taro@example.com".to_string()),
            ..Default::default()
        });
        let state = AppState::new(controller, default_page_config());
        let ticket = state.session.lock().await.begin_export().unwrap();
        let app = build_router(state);

        let response = send(&app, Method::POST, "/resume/export", None).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "EXPORT_IN_PROGRESS");

        drop(ticket);
        let response = send(&app, Method::POST, "/resume/export", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
