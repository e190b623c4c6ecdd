#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use regex::Regex;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::tests::support::{api, multipart_body, multipart_content_type, setup_test_app, PNG_BYTES};

    #[tokio::test]
    async fn test_create_article_builds_slug() {
        let t = setup_test_app().await;
        let (user_id, token) = t.seed_user("alice", &["ROLE_USER"]).await;

        let article = t
            .create_article(
                &token,
                json!({ "title": "Hello World", "content": "Body", "tags": "[\"rust\",\"web\"]" }),
            )
            .await;

        let slug = article["slug"].as_str().unwrap();
        assert!(Regex::new(r"^hello-world-\d{4}$").unwrap().is_match(slug), "slug: {}", slug);
        assert_eq!(article["id_user"], user_id);
        assert_eq!(article["author_name"], "alice");
        assert_eq!(article["tags"], json!(["rust", "web"]));
        assert!(article["published_at"].is_string());
    }

    #[tokio::test]
    async fn test_create_article_same_title_gets_distinct_slug() {
        let t = setup_test_app().await;
        let (_, token) = t.seed_user("alice", &["ROLE_USER"]).await;

        let a = t.create_article(&token, json!({ "title": "Twin", "content": "1" })).await;
        let b = t.create_article(&token, json!({ "title": "Twin", "content": "2" })).await;
        assert_ne!(a["slug"], b["slug"]);
    }

    #[tokio::test]
    async fn test_create_article_requires_token() {
        let t = setup_test_app().await;

        let req = api(Method::POST, "/api/articles").json(json!({ "title": "T", "content": "C" }));
        let (status, json) = t.send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Token non fourni");

        let req = api(Method::POST, "/api/articles").bearer("a.b.c").json(json!({ "title": "T", "content": "C" }));
        let (status, json) = t.send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Token invalide");
        assert_eq!(t.article_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_article_requires_title_and_content() {
        let t = setup_test_app().await;
        let (_, token) = t.seed_user("alice", &["ROLE_USER"]).await;

        let req = api(Method::POST, "/api/articles").bearer(&token).json(json!({ "title": "Only a title" }));
        let (status, json) = t.send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Titre et contenu requis");
    }

    #[tokio::test]
    async fn test_create_article_rejects_bad_json() {
        let t = setup_test_app().await;
        let (_, token) = t.seed_user("alice", &["ROLE_USER"]).await;

        let req = api(Method::POST, "/api/articles").bearer(&token).raw("application/json", "{not json");
        let (status, json) = t.send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "JSON invalide");
    }

    #[tokio::test]
    async fn test_get_article_by_id_and_slug() {
        let t = setup_test_app().await;
        let (_, token) = t.seed_user("alice", &["ROLE_USER"]).await;
        let created = t.create_article(&token, json!({ "title": "Lookup", "content": "C" })).await;
        let id = created["id_article"].as_i64().unwrap();
        let slug = created["slug"].as_str().unwrap();

        let (status, json) = t.send(api(Method::GET, &format!("/api/articles/id/{}", id)).empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["slug"], slug);

        let (status, json) = t.send(api(Method::GET, &format!("/api/articles/{}", slug)).empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["id_article"], id);
    }

    #[tokio::test]
    async fn test_get_missing_article_is_404() {
        let t = setup_test_app().await;

        let (status, json) = t.send(api(Method::GET, "/api/articles/id/9999").empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, json!({ "success": false, "error": "Article non trouvé" }));

        let (status, json) = t.send(api(Method::GET, "/api/articles/no-such-slug").empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Article non trouvé");
    }

    #[tokio::test]
    async fn test_list_articles_paginates_and_caps() {
        let t = setup_test_app().await;
        let (_, token) = t.seed_user("alice", &["ROLE_USER"]).await;
        for i in 0..3 {
            t.create_article(&token, json!({ "title": format!("Post {}", i), "content": "C" })).await;
        }

        let (status, json) = t.send(api(Method::GET, "/api/articles?page=2&per_page=2").empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total"], 3);
        assert_eq!(json["data"]["page"], 2);
        assert_eq!(json["data"]["articles"].as_array().unwrap().len(), 1);

        let (_, json) = t.send(api(Method::GET, "/api/articles?per_page=1000").empty()).await;
        assert_eq!(json["data"]["per_page"], 100);
        assert_eq!(json["data"]["articles"].as_array().unwrap().len(), 3);

        let (status, _) = t.send(api(Method::GET, "/api/articles?date=yesterday").empty()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_articles_filters() {
        let t = setup_test_app().await;
        let (_, alice) = t.seed_user("alice", &["ROLE_USER"]).await;
        let (_, bob) = t.seed_user("bob", &["ROLE_USER"]).await;
        sqlx::query("INSERT INTO categories (name) VALUES ('news')").execute(&t.state.db).await.unwrap();

        t.create_article(&alice, json!({ "title": "A", "content": "C", "tags": ["rust"], "categories": [1] }))
            .await;
        t.create_article(&bob, json!({ "title": "B", "content": "C", "tags": ["go"] })).await;

        let (_, json) = t.send(api(Method::GET, "/api/articles?author=bo").empty()).await;
        assert_eq!(json["data"]["total"], 1);
        assert_eq!(json["data"]["articles"][0]["author_name"], "bob");

        let (_, json) = t.send(api(Method::GET, "/api/articles?tag=rust").empty()).await;
        assert_eq!(json["data"]["total"], 1);
        assert_eq!(json["data"]["articles"][0]["title"], "A");

        let (_, json) = t.send(api(Method::GET, "/api/articles?category=1").empty()).await;
        assert_eq!(json["data"]["total"], 1);
        assert_eq!(json["data"]["articles"][0]["categories"], json!([1]));
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden() {
        let t = setup_test_app().await;
        let (_, alice) = t.seed_user("alice", &["ROLE_USER"]).await;
        let (_, mallory) = t.seed_user("mallory", &["ROLE_USER"]).await;
        let created = t.create_article(&alice, json!({ "title": "Mine", "content": "Original" })).await;
        let id = created["id_article"].as_i64().unwrap();

        let req = api(Method::PUT, &format!("/api/articles/{}", id))
            .bearer(&mallory)
            .json(json!({ "content": "Defaced" }));
        let (status, json) = t.send(req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["success"], false);

        let (_, json) = t.send(api(Method::GET, &format!("/api/articles/id/{}", id)).empty()).await;
        assert_eq!(json["data"]["content"], "Original");
    }

    #[tokio::test]
    async fn test_update_by_owner_and_admin() {
        let t = setup_test_app().await;
        let (_, alice) = t.seed_user("alice", &["ROLE_USER"]).await;
        let (_, admin) = t.seed_user("root", &["ROLE_USER", "ROLE_ADMIN"]).await;
        let created = t.create_article(&alice, json!({ "title": "First", "content": "C" })).await;
        let id = created["id_article"].as_i64().unwrap();
        let uri = format!("/api/articles/{}", id);

        let req = api(Method::PUT, &uri).bearer(&alice).json(json!({ "introduction": "Intro" }));
        let (status, json) = t.send(req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["introduction"], "Intro");
        assert_eq!(json["data"]["slug"], created["slug"]);

        let req = api(Method::PUT, &uri).bearer(&admin).json(json!({ "title": "Renamed", "tags": ["x"] }));
        let (status, json) = t.send(req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["title"], "Renamed");
        assert!(json["data"]["slug"].as_str().unwrap().starts_with("renamed-"));
        assert_eq!(json["data"]["tags"], json!(["x"]));
        assert_eq!(json["data"]["content"], "C");
    }

    #[tokio::test]
    async fn test_update_missing_article_is_404() {
        let t = setup_test_app().await;
        let (_, alice) = t.seed_user("alice", &["ROLE_USER"]).await;
        let req = api(Method::PUT, "/api/articles/4242").bearer(&alice).json(json!({ "title": "X" }));
        let (status, json) = t.send(req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Article non trouvé");
    }

    #[tokio::test]
    async fn test_delete_article() {
        let t = setup_test_app().await;
        let (_, alice) = t.seed_user("alice", &["ROLE_USER"]).await;
        let (_, bob) = t.seed_user("bob", &["ROLE_USER"]).await;
        let created = t.create_article(&alice, json!({ "title": "Doomed", "content": "C" })).await;
        let uri = format!("/api/article-delete/{}", created["id_article"]);

        let (status, _) = t.send(api(Method::DELETE, &uri).bearer(&bob).empty()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(t.article_count().await, 1);

        let (status, json) = t.send(api(Method::DELETE, &uri).bearer(&alice).empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(t.article_count().await, 0);

        let (status, _) = t.send(api(Method::DELETE, &uri).bearer(&alice).empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_cover_image_and_serve_it() {
        let t = setup_test_app().await;
        let (_, alice) = t.seed_user("alice", &["ROLE_USER"]).await;
        let created = t.create_article(&alice, json!({ "title": "Pic", "content": "C" })).await;
        let uri = format!("/api/articles/{}/image", created["id_article"]);

        let body = multipart_body("image", "cover.png", "image/png", PNG_BYTES);
        let req = api(Method::POST, &uri).bearer(&alice).raw(&multipart_content_type(), body);
        let (status, json) = t.send(req).await;
        assert_eq!(status, StatusCode::OK, "{}", json);
        let first = json["data"]["path"].as_str().unwrap().to_string();
        assert!(first.starts_with("/uploads/articles/article_"));
        assert!(first.ends_with(".png"));

        let served = t
            .app
            .clone()
            .oneshot(Request::builder().uri(&first).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(served.status(), StatusCode::OK);

        // A second upload replaces the file on disk
        let body = multipart_body("image", "cover.png", "image/png", PNG_BYTES);
        let req = api(Method::POST, &uri).bearer(&alice).raw(&multipart_content_type(), body);
        let (status, json) = t.send(req).await;
        assert_eq!(status, StatusCode::OK);
        let second = json["data"]["path"].as_str().unwrap();
        assert_ne!(first, second);

        let first_file = first.trim_start_matches("/uploads/");
        assert!(!t.uploads.path().join(first_file).exists());
        let (_, json) = t.send(api(Method::GET, &format!("/api/articles/id/{}", created["id_article"])).empty()).await;
        assert_eq!(json["data"]["cover_image"], second);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_images_and_missing_field() {
        let t = setup_test_app().await;
        let (_, alice) = t.seed_user("alice", &["ROLE_USER"]).await;
        let created = t.create_article(&alice, json!({ "title": "Pic", "content": "C" })).await;
        let uri = format!("/api/articles/{}/image", created["id_article"]);

        let body = multipart_body("image", "shell.png", "image/png", b"<?php system($_GET['c']); ?>");
        let req = api(Method::POST, &uri).bearer(&alice).raw(&multipart_content_type(), body);
        let (status, _) = t.send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let body = multipart_body("avatar", "cover.png", "image/png", PNG_BYTES);
        let req = api(Method::POST, &uri).bearer(&alice).raw(&multipart_content_type(), body);
        let (status, json) = t.send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Aucune image fournie");

        let mut oversized = PNG_BYTES.to_vec();
        oversized.resize(t.state.config.uploads.max_bytes as usize + 1, 0);
        let body = multipart_body("image", "big.png", "image/png", &oversized);
        let req = api(Method::POST, &uri).bearer(&alice).raw(&multipart_content_type(), body);
        let (status, _) = t.send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, json) = t.send(api(Method::GET, &format!("/api/articles/id/{}", created["id_article"])).empty()).await;
        assert!(json["data"]["cover_image"].is_null());
    }

    #[tokio::test]
    async fn test_upload_requires_ownership() {
        let t = setup_test_app().await;
        let (_, alice) = t.seed_user("alice", &["ROLE_USER"]).await;
        let (_, bob) = t.seed_user("bob", &["ROLE_USER"]).await;
        let created = t.create_article(&alice, json!({ "title": "Pic", "content": "C" })).await;
        let uri = format!("/api/articles/{}/image", created["id_article"]);

        let body = multipart_body("image", "cover.png", "image/png", PNG_BYTES);
        let req = api(Method::POST, &uri).bearer(&bob).raw(&multipart_content_type(), body);
        let (status, _) = t.send(req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
