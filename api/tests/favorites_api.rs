mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{ranks, setup, token};

#[tokio::test]
async fn create_requires_authentication() {
    let t = setup();
    let comic = t.comic("Vagabond");

    let (status, body) = t
        .send(axum::http::Method::POST, "/api/v1/favorites", None, Some(json!({ "comic": comic })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["detail"].is_string());

    let (status, _) = t
        .post("/api/v1/favorites", "not-a-jwt", json!({ "comic": comic }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_move_delete_keeps_ranks_dense() {
    let t = setup();
    let alice = token(1, "alice", false);
    let comics = [t.comic("Ten"), t.comic("Twenty"), t.comic("Thirty")];

    let mut ids = Vec::new();
    for (i, comic) in comics.iter().enumerate() {
        let (status, body) = t.post("/api/v1/favorites", &alice, json!({ "comic": comic })).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["rank"], json!(i + 1));
        ids.push(body["id"].as_i64().unwrap());
    }

    let (status, body) = t
        .patch(&format!("/api/v1/favorites/{}", ids[1]), &alice, json!({ "rank": 1 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rank"], json!(1));

    let (_, list) = t.get("/api/v1/favorites", Some(&alice)).await;
    assert_eq!(ranks(&list), vec![(ids[1], 1), (ids[0], 2), (ids[2], 3)]);

    let (status, _) = t.delete(&format!("/api/v1/favorites/{}", ids[2]), &alice).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = t.get("/api/v1/favorites?type=comic", Some(&alice)).await;
    assert_eq!(ranks(&list), vec![(ids[1], 1), (ids[0], 2)]);
}

#[tokio::test]
async fn error_statuses() {
    let t = setup();
    let alice = token(1, "alice", false);
    let bob = token(2, "bob", false);
    let comic = t.comic("Monster");

    let (_, created) = t.post("/api/v1/favorites", &alice, json!({ "comic": comic })).await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = t.post("/api/v1/favorites", &alice, json!({ "comic": comic })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = t.post("/api/v1/favorites", &alice, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.post("/api/v1/favorites", &alice, json!({ "novel": 404 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t
        .patch(&format!("/api/v1/favorites/{}", id), &bob, json!({ "rank": 1 }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.delete(&format!("/api/v1/favorites/{}", id + 1), &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = t.post("/api/v1/favorites", &alice, json!({ "comic": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn listing_by_username_and_anonymous() {
    let t = setup();
    let alice = token(1, "alice", false);
    let comic = t.comic("Pluto");
    let novel = t.novel("Spice and Wolf");

    t.post("/api/v1/favorites", &alice, json!({ "comic": comic })).await;
    t.post("/api/v1/favorites", &alice, json!({ "novel": novel })).await;

    let (status, list) = t.get("/api/v1/favorites?username=alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["target_type"], json!("comic"));
    assert_eq!(list[0]["target_id"], json!(comic));
    assert_eq!(list[0]["target_detail"]["title"], json!("Pluto"));
    assert_eq!(list[1]["target_type"], json!("novel"));
    assert_eq!(list[1]["target_detail"]["title"], json!("Spice and Wolf"));
    assert_eq!(list[1]["target_detail"]["average_rating"], json!(0.0));
    // each media type has its own ranking
    assert_eq!(
        list.as_array().unwrap().iter().map(|f| f["rank"].as_i64().unwrap()).collect::<Vec<_>>(),
        vec![1, 1]
    );

    let (_, list) = t.get("/api/v1/favorites", None).await;
    assert_eq!(list, json!([]));

    let (status, _) = t.get("/api/v1/favorites?username=nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reorder() {
    let t = setup();
    let alice = token(1, "alice", false);
    let bob = token(2, "bob", false);

    let mut ids = Vec::new();
    for title in ["A", "B", "C"] {
        let comic = t.comic(title);
        let (_, body) = t.post("/api/v1/favorites", &alice, json!({ "comic": comic })).await;
        ids.push(body["id"].as_i64().unwrap());
    }
    let other = t.comic("D");
    let (_, foreign) = t.post("/api/v1/favorites", &bob, json!({ "comic": other })).await;

    let (status, body) = t
        .post(
            "/api/v1/favorites/reorder",
            &alice,
            json!({ "favorites": [{ "id": ids[0], "rank": 3 }, { "id": ids[2], "rank": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(2));

    let (_, list) = t.get("/api/v1/favorites", Some(&alice)).await;
    assert_eq!(ranks(&list), vec![(ids[2], 1), (ids[1], 2), (ids[0], 3)]);

    let (status, body) = t
        .post(
            "/api/v1/favorites/reorder",
            &alice,
            json!({ "favorites": [{ "id": foreign["id"], "rank": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains(&foreign["id"].to_string()));

    let (status, body) = t
        .post("/api/v1/favorites/reorder", &alice, json!({ "favorites": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (_, list) = t.get("/api/v1/favorites", Some(&alice)).await;
    assert_eq!(ranks(&list), vec![(ids[2], 1), (ids[1], 2), (ids[0], 3)]);
}

#[tokio::test]
async fn content_deletion_cascades() {
    let t = setup();
    let admin = token(9, "admin", true);
    let alice = token(1, "alice", false);
    let first = t.comic("First");
    let second = t.comic("Second");

    t.post("/api/v1/favorites", &alice, json!({ "comic": first })).await;
    t.post("/api/v1/favorites", &alice, json!({ "comic": second })).await;

    let (status, _) = t.delete(&format!("/api/v1/comics/{}", first), &alice).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.delete(&format!("/api/v1/comics/{}", first), &admin).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = t.get("/api/v1/favorites", Some(&alice)).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["target"], json!({ "comic": second }));
    assert_eq!(list[0]["rank"], json!(1));
}

#[tokio::test]
async fn token_username_change_is_mirrored() {
    let t = setup();
    let comic = t.comic("Blame!");

    t.post("/api/v1/favorites", &token(1, "alice", false), json!({ "comic": comic })).await;
    let (status, _) = t.get("/api/v1/favorites", Some(&token(1, "alice", false))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t.get("/api/v1/favorites", Some(&token(1, "alicia", false))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, list) = t.get("/api/v1/favorites?username=alicia", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    let (status, _) = t.get("/api/v1/favorites?username=alice", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
