use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::blog::{BlogPostList, CreateBlogPostRequest, UpdateBlogPostRequest},
    entity::{
        BlogPosts,
        blog_posts::{ActiveModel as PostActive, Column as PostCol},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::BlogPost,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    slug::slugify,
    state::AppState,
};

pub async fn list_published(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<BlogPostList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = BlogPosts::find()
        .filter(PostCol::Published.eq(true))
        .order_by_desc(PostCol::PublishedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(BlogPost::from)
        .collect();

    Ok(ApiResponse::success(
        "Posts",
        BlogPostList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_by_slug(state: &AppState, slug: &str) -> AppResult<ApiResponse<BlogPost>> {
    let post = BlogPosts::find()
        .filter(PostCol::Slug.eq(slug))
        .filter(PostCol::Published.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Post", post.into(), None))
}

/// Drafts included.
pub async fn list_all(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<BlogPostList>> {
    ensure_admin(state, user).await?;
    let (page, limit, offset) = pagination.normalize();
    let finder = BlogPosts::find().order_by_desc(PostCol::UpdatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(BlogPost::from)
        .collect();
    Ok(ApiResponse::success(
        "Posts",
        BlogPostList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

fn post_slug(title: &str, slug: Option<&str>) -> AppResult<String> {
    let slug = slugify(slug.filter(|s| !s.trim().is_empty()).unwrap_or(title));
    if slug.is_empty() {
        return Err(AppError::BadRequest("slug must contain letters or digits".into()));
    }
    Ok(slug)
}

pub async fn create_post(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBlogPostRequest,
) -> AppResult<ApiResponse<BlogPost>> {
    ensure_admin(state, user).await?;
    if payload.title.trim().is_empty() || payload.content.trim().is_empty() {
        return Err(AppError::BadRequest("title and content are required".into()));
    }
    let slug = post_slug(&payload.title, payload.slug.as_deref())?;

    let post = PostActive {
        id: Set(Uuid::new_v4()),
        author_id: Set(Some(user.user_id)),
        title: Set(payload.title.trim().to_string()),
        slug: Set(slug),
        excerpt: Set(payload.excerpt),
        content: Set(payload.content),
        cover_image_url: Set(payload.cover_image_url),
        published: Set(payload.published),
        published_at: Set(payload.published.then(|| Utc::now().into())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        user.user_id,
        "blog_create",
        "blog_posts",
        serde_json::json!({ "post_id": post.id, "slug": post.slug }),
    )
    .await;

    Ok(ApiResponse::success(
        "Post created",
        post.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_post(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBlogPostRequest,
) -> AppResult<ApiResponse<BlogPost>> {
    ensure_admin(state, user).await?;
    let existing = BlogPosts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let first_publish = payload.published == Some(true) && existing.published_at.is_none();
    let mut active: PostActive = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(slug) = payload.slug {
        active.slug = Set(post_slug("", Some(&slug))?);
    }
    if let Some(excerpt) = payload.excerpt {
        active.excerpt = Set(Some(excerpt));
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    if let Some(cover) = payload.cover_image_url {
        active.cover_image_url = Set(Some(cover));
    }
    if let Some(published) = payload.published {
        active.published = Set(published);
    }
    // Keep the original date when a post is unpublished and published again.
    if first_publish {
        active.published_at = Set(Some(Utc::now().into()));
    }
    active.updated_at = Set(Utc::now().into());
    let post = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "blog_update",
        "blog_posts",
        serde_json::json!({ "post_id": post.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        post.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_post(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(state, user).await?;
    let result = BlogPosts::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        user.user_id,
        "blog_delete",
        "blog_posts",
        serde_json::json!({ "post_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_falls_back_to_title() {
        assert_eq!(
            post_slug("Triphala for Digestion", None).unwrap(),
            "triphala-for-digestion"
        );
        assert_eq!(post_slug("Ignored", Some("  ")).unwrap(), "ignored");
        assert_eq!(post_slug("x", Some("Custom Slug")).unwrap(), "custom-slug");
        assert!(post_slug("!!!", None).is_err());
    }
}
