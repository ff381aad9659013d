use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use pena_shared::models::{now_str, GalleryImage, Visibility};
use pena_shared::store::PortalStore;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::handlers::{clean_list, record_action, require_admin, require_staff};
use crate::models::{CreateImageRequest, GalleryQuery, GalleryResponse};

fn filter_by_tag(images: Vec<GalleryImage>, tag: Option<&str>) -> Vec<GalleryImage> {
    match tag.map(str::trim).filter(|t| !t.is_empty()) {
        Some(tag) => images.into_iter().filter(|i| i.has_tag(tag)).collect(),
        None => images,
    }
}

// GET /gallery
pub async fn list_public_images<S>(
    State(store): State<Arc<S>>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<GalleryResponse>>
where
    S: PortalStore,
{
    let images: Vec<GalleryImage> = store
        .list_images()
        .await?
        .into_iter()
        .filter(|i| i.visibility == Visibility::Public)
        .collect();

    Ok(Json(GalleryResponse {
        images: filter_by_tag(images, query.tag.as_deref()),
    }))
}

// GET /admin/gallery
pub async fn list_all_images<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<GalleryResponse>>
where
    S: PortalStore,
{
    require_staff(&*store, &user_id).await?;
    let images = store.list_images().await?;
    Ok(Json(GalleryResponse {
        images: filter_by_tag(images, query.tag.as_deref()),
    }))
}

// POST /gallery
pub async fn create_image<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<CreateImageRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)>
where
    S: PortalStore,
{
    require_staff(&*store, &user_id).await?;

    let url = payload.url.trim().to_string();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(AppError::bad_request("Image url must be an http(s) URL"));
    }

    let image = GalleryImage {
        id: Uuid::new_v4().to_string(),
        url,
        tags: clean_list(payload.tags),
        visibility: payload.visibility,
        metadata: payload.metadata,
        uploaded_by: user_id.clone(),
        created_at: now_str(),
    };

    let created = store.create_image(image).await?;

    record_action(
        &*store,
        &user_id,
        "create_image",
        serde_json::json!({ "imageId": created.id, "url": created.url }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "image": created })),
    ))
}

// DELETE /gallery/:id
pub async fn delete_image<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    require_admin(&*store, &user_id).await?;

    store.delete_image(&id).await?;

    record_action(
        &*store,
        &user_id,
        "delete_image",
        serde_json::json!({ "imageId": id }),
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Image deleted successfully." })))
}
