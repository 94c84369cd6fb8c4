mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{MultipartForm, TestApp, PUBLIC_URL};

#[tokio::test]
async fn test_create_post_without_token_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .create_post(None, MultipartForm::post("Hike", "Saturday 9am", "event"))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(app.store.post_count().await, 0);
}

#[tokio::test]
async fn test_create_post_with_bad_token_is_rejected() {
    let app = TestApp::new();

    let form = MultipartForm::post("Hike", "Saturday 9am", "event").image("a.png", b"png");
    let (status, _) = app.create_post(Some("definitely.not.valid"), form).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.post_count().await, 0);
    assert_eq!(app.stored_upload_count(), 0);
}

#[tokio::test]
async fn test_create_post_returns_inert_counters() {
    let app = TestApp::new();
    let token = app.signed_in("grace").await;

    let (status, body) = app
        .create_post(Some(&token), MultipartForm::post("Carpool", "Leaving 8am", "carpool"))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["message"].is_string());
    let post = &body["post"];
    assert_eq!(post["title"], "Carpool");
    assert_eq!(post["type"], "carpool");
    assert_eq!(post["views"], 0);
    assert_eq!(post["likes"], 0);
    assert!(post["images"].as_array().unwrap().is_empty());
    assert!(post["comments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_three_images_are_stored_and_served() {
    let app = TestApp::new();
    let token = app.signed_in("heidi").await;

    let images: [&[u8]; 3] = [b"first image", b"second image", b"third image"];
    let form = MultipartForm::post("Team", "Looking for a designer", "recruitment")
        .image("one.png", images[0])
        .image("two.jpg", images[1])
        .image("three.gif", images[2]);

    let (status, body) = app.create_post(Some(&token), form).await;
    assert_eq!(status, StatusCode::CREATED);

    let urls: Vec<&str> = body["post"]["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u.as_str().unwrap())
        .collect();
    assert_eq!(urls.len(), 3);
    assert!(urls[1].ends_with(".jpg"));

    for (url, expected) in urls.iter().zip(images) {
        let path = url.strip_prefix(PUBLIC_URL).expect("absolute upload url");
        assert!(path.starts_with("/uploads/"));
        let (status, bytes) = app.get(path).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, expected);
    }
}

#[tokio::test]
async fn test_fourth_image_rejects_whole_request() {
    let app = TestApp::new();
    let token = app.signed_in("ivan").await;

    let form = MultipartForm::post("Too many", "pictures", "event")
        .image("1.png", b"1")
        .image("2.png", b"2")
        .image("3.png", b"3")
        .image("4.png", b"4");

    let (status, body) = app.create_post(Some(&token), form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(app.store.post_count().await, 0);
    assert_eq!(app.stored_upload_count(), 0);
}

#[tokio::test]
async fn test_missing_title_stores_nothing() {
    let app = TestApp::new();
    let token = app.signed_in("judy").await;

    let form = MultipartForm::new()
        .text("content", "no title here")
        .text("type", "event")
        .image("a.png", b"a");

    let (status, _) = app.create_post(Some(&token), form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.post_count().await, 0);
    assert_eq!(app.stored_upload_count(), 0);
}

#[tokio::test]
async fn test_list_filters_paginates_and_resolves_authors() {
    let app = TestApp::new();
    let token = app.signed_in("mallory").await;

    for i in 0..12 {
        let (status, _) = app
            .create_post(Some(&token), MultipartForm::post(&format!("event {i}"), "x", "event"))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    for i in 0..4 {
        app.create_post(Some(&token), MultipartForm::post(&format!("ride {i}"), "x", "carpool"))
            .await;
    }

    let (status, bytes) = app.get("/api/posts?type=event&page=2&limit=5").await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["currentPage"], 2);

    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 5);
    assert!(posts.iter().all(|p| p["type"] == "event"));
    let titles: Vec<&str> = posts.iter().map(|p| p["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["event 6", "event 5", "event 4", "event 3", "event 2"]);

    let created: Vec<&str> = posts.iter().map(|p| p["createdAt"].as_str().unwrap()).collect();
    let mut sorted = created.clone();
    sorted.sort_by(|a, b| {
        let a = chrono::DateTime::parse_from_rfc3339(a).unwrap();
        let b = chrono::DateTime::parse_from_rfc3339(b).unwrap();
        b.cmp(&a)
    });
    assert_eq!(created, sorted);

    assert_eq!(posts[0]["author"]["username"], "mallory");
    assert_eq!(posts[0]["author"]["avatar"], "");
}

#[tokio::test]
async fn test_list_defaults_and_out_of_range_page() {
    let app = TestApp::new();
    let token = app.signed_in("niaj").await;
    for i in 0..11 {
        app.create_post(Some(&token), MultipartForm::post(&format!("p{i}"), "x", "event"))
            .await;
    }

    let (_, bytes) = app.get("/api/posts").await;
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["posts"].as_array().unwrap().len(), 10);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["currentPage"], 1);

    let (status, bytes) = app.get("/api/posts?page=9").await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["posts"].as_array().unwrap().is_empty());
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["currentPage"], 9);
}

#[tokio::test]
async fn test_empty_type_filter_matches_all() {
    let app = TestApp::new();
    let token = app.signed_in("olivia").await;
    app.create_post(Some(&token), MultipartForm::post("a", "x", "event")).await;
    app.create_post(Some(&token), MultipartForm::post("b", "x", "carpool")).await;

    let (_, bytes) = app.get("/api/posts?type=").await;
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["posts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_non_numeric_page_is_bad_request() {
    let app = TestApp::new();

    let (status, bytes) = app.get("/api/posts?page=two").await;
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_create_post_requires_multipart_body() {
    let app = TestApp::new();
    let token = app.signed_in("pete").await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/posts")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"title":"Hike"}"#))
        .unwrap();

    let (status, body) = app.send_json(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(app.store.post_count().await, 0);
}

#[tokio::test]
async fn test_unsupported_method_is_not_gated_by_auth() {
    let app = TestApp::new();

    for method in [Method::PUT, Method::DELETE] {
        let request = Request::builder()
            .method(method.clone())
            .uri("/api/posts")
            .body(Body::empty())
            .unwrap();
        let (status, _) = app.send(request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
    }
}
