use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::BlogPost;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBlogPostRequest {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBlogPostRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub cover_image_url: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct BlogPostList {
    #[schema(value_type = Vec<BlogPost>)]
    pub items: Vec<BlogPost>,
}
