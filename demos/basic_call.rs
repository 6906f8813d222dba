//! Basic example describing a small API as a target and calling it.
//!
//! This example shows how to:
//! - Describe endpoints as an enum implementing `Target`
//! - Attach URL parameters and JSON bodies through `Task`
//! - Inspect a request before it is sent
//! - Send requests through a `Provider` and read the responses
//!
//! Run with: `cargo run --example basic_call`

use bytes::Bytes;
use http::Method;
use moya::encoding::UrlEncoding;
use moya::{MoyaError, Provider, ReqwestTransport, Target, Task, ValidationType};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use url::Url;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Clone, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[derive(Clone)]
enum JsonPlaceholder {
    Post(u32),
    PostsByUser(u32),
    CreatePost(NewPost),
    Missing,
}

impl Target for JsonPlaceholder {
    fn base_url(&self) -> Url {
        Url::parse("https://jsonplaceholder.typicode.com").expect("valid base URL")
    }

    fn path(&self) -> String {
        match self {
            JsonPlaceholder::Post(id) => format!("/posts/{id}"),
            JsonPlaceholder::PostsByUser(_) | JsonPlaceholder::CreatePost(_) => {
                "/posts".to_string()
            }
            JsonPlaceholder::Missing => "/posts/999999".to_string(),
        }
    }

    fn method(&self) -> Method {
        match self {
            JsonPlaceholder::CreatePost(_) => Method::POST,
            _ => Method::GET,
        }
    }

    fn sample_data(&self) -> Bytes {
        Bytes::from_static(br#"{"userId": 1, "id": 1, "title": "sample", "body": "sample"}"#)
    }

    fn task(&self) -> Task {
        match self {
            JsonPlaceholder::PostsByUser(user_id) => Task::parameters(
                json!({ "userId": user_id })
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
                UrlEncoding::default(),
            ),
            JsonPlaceholder::CreatePost(post) => Task::json(post.clone()),
            JsonPlaceholder::Post(_) | JsonPlaceholder::Missing => Task::Plain,
        }
    }

    fn validation_type(&self) -> ValidationType {
        ValidationType::SuccessCodes
    }

    fn headers(&self) -> Option<HashMap<String, String>> {
        None
    }
}

#[tokio::main]
async fn main() -> Result<(), MoyaError> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("moya=debug,basic_call=info")
        .init();

    let provider = Provider::new(ReqwestTransport::new()?);

    println!("=== GET Request Example ===");
    let response = provider.request(JsonPlaceholder::Post(1)).await?;
    let post: Post = serde_json::from_slice(&response.data).map_err(MoyaError::underlying)?;

    println!("Post ID: {}", post.id);
    println!("Title: {}", post.title);
    println!("Status: {}", response.status_code);

    println!("\n=== URL Parameters Example ===");
    let request = provider
        .build_request(&JsonPlaceholder::PostsByUser(1))
        .await?;
    println!("Request URL: {}", request.url);

    let response = provider.request(JsonPlaceholder::PostsByUser(1)).await?;
    let posts: Vec<Post> =
        serde_json::from_slice(&response.data).map_err(MoyaError::underlying)?;
    println!("User 1 has {} posts", posts.len());

    println!("\n=== POST Request Example ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post".to_string(),
        user_id: 1,
    };
    let response = provider
        .request(JsonPlaceholder::CreatePost(new_post))
        .await?;
    println!("Created with status {}", response.status_code);
    println!("{}", String::from_utf8_lossy(&response.data));

    println!("\n=== Validation Example ===");
    match provider.request(JsonPlaceholder::Missing).await {
        Ok(response) => println!("Unexpected success: {}", response.status_code),
        Err(MoyaError::StatusCode(response)) => {
            println!("Rejected status {}", response.status_code);
        }
        Err(e) => return Err(e),
    }

    Ok(())
}
