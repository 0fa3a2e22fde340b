// tests/store_supabase.rs
// SupabaseStore against a local PostgREST stand-in.
mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use common::{fast_client, idea, serve};
use idea_inbox::ingest::persist::BatchPersister;
use idea_inbox::retry::Backoff;
use idea_inbox::store::{IdeaStore, SupabaseStore};
use idea_inbox::Source;

#[derive(Clone, Copy, PartialEq)]
enum InsertReply {
    Echo,
    Fail,
    Empty,
}

#[derive(Clone)]
struct Rest {
    rows: Arc<Vec<Value>>,
    /// Server-side `max-rows`.
    cap: usize,
    insert: InsertReply,
    gets: Arc<Mutex<Vec<(HashMap<String, String>, HeaderMap)>>>,
    posts: Arc<Mutex<Vec<(Vec<Value>, HeaderMap)>>>,
}

impl Rest {
    fn new(rows: Vec<Value>) -> Self {
        Self {
            rows: Arc::new(rows),
            cap: 1000,
            insert: InsertReply::Echo,
            gets: Arc::default(),
            posts: Arc::default(),
        }
    }

    fn gets(&self) -> Vec<(HashMap<String, String>, HeaderMap)> {
        self.gets.lock().unwrap().clone()
    }

    fn posts(&self) -> Vec<(Vec<Value>, HeaderMap)> {
        self.posts.lock().unwrap().clone()
    }
}

async fn rest_get(
    State(rest): State<Rest>,
    Query(q): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    rest.gets.lock().unwrap().push((q.clone(), headers));

    if q.get("select").map(String::as_str) == Some("normalized_link") {
        let known: Vec<Value> = rest
            .rows
            .iter()
            .filter(|r| q.get("source") == Some(&format!("eq.{}", r["source"].as_str().unwrap())))
            .filter(|r| {
                let link = r["normalized_link"].as_str().unwrap();
                q["normalized_link"].contains(&format!("\"{link}\""))
            })
            .map(|r| json!({ "normalized_link": r["normalized_link"] }))
            .collect();
        return Json(Value::Array(known));
    }

    let offset: usize = q["offset"].parse().unwrap();
    let limit: usize = q["limit"].parse().unwrap();
    let page: Vec<Value> = rest
        .rows
        .iter()
        .filter(|r| match q.get("source") {
            Some(f) => *f == format!("eq.{}", r["source"].as_str().unwrap()),
            None => true,
        })
        .skip(offset)
        .take(limit.min(rest.cap))
        .cloned()
        .collect();
    Json(Value::Array(page))
}

async fn rest_post(
    State(rest): State<Rest>,
    headers: HeaderMap,
    Json(body): Json<Vec<Value>>,
) -> (StatusCode, Json<Value>) {
    rest.posts.lock().unwrap().push((body.clone(), headers));
    match rest.insert {
        InsertReply::Echo => (StatusCode::CREATED, Json(Value::Array(body))),
        InsertReply::Empty => (StatusCode::CREATED, Json(json!([]))),
        InsertReply::Fail => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "connection refused" })),
        ),
    }
}

async fn store_for(rest: Rest) -> SupabaseStore {
    let app = Router::new()
        .route("/rest/v1/ideas", get(rest_get).post(rest_post))
        .with_state(rest);
    let base = serve(app).await;
    SupabaseStore::new(fast_client(), &base, "anon-key", "ideas")
}

fn row(id: u32, source: &str, link: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Idea {id}"),
        "description": "d",
        "link": link,
        "votes": 1.0,
        "source": source,
        "normalized_link": link,
        "ingested_at": format!("2024-05-01T10:00:{id:02}Z"),
    })
}

fn header<'a>(h: &'a HeaderMap, name: &str) -> Option<&'a str> {
    h.get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn existence_query_filters_by_source_and_link_list() {
    let rest = Rest::new(vec![
        row(1, "hackernews", "https://a.com/x"),
        row(2, "reddit", "https://b.com/y"),
    ]);
    let store = store_for(rest.clone()).await;

    let asked = vec!["https://a.com/x".to_string(), "https://b.com/y".to_string()];
    let found = store.existing_links(Source::HackerNews, &asked).await.unwrap();
    assert_eq!(found.len(), 1);
    assert!(found.contains("https://a.com/x"));

    let gets = rest.gets();
    assert_eq!(gets.len(), 1, "one round trip");
    let (q, h) = &gets[0];
    assert_eq!(q["select"], "normalized_link");
    assert_eq!(q["source"], "eq.hackernews");
    assert_eq!(q["normalized_link"], r#"in.("https://a.com/x","https://b.com/y")"#);
    assert_eq!(header(h, "apikey"), Some("anon-key"));
    assert_eq!(header(h, "authorization"), Some("Bearer anon-key"));
}

#[tokio::test]
async fn empty_existence_query_makes_no_request() {
    let rest = Rest::new(vec![]);
    let store = store_for(rest.clone()).await;
    assert!(store.existing_links(Source::Reddit, &[]).await.unwrap().is_empty());
    assert!(rest.gets().is_empty());
}

#[tokio::test]
async fn insert_asks_for_the_written_rows() {
    let rest = Rest::new(vec![]);
    let store = Arc::new(store_for(rest.clone()).await);
    let persister = BatchPersister::new(store, Backoff::None);

    let batch = vec![
        idea(Source::Reddit, "One", "https://www.reddit.com/r/startups/comments/1/One/"),
        idea(Source::Reddit, "Two", "https://www.reddit.com/r/startups/comments/2/two"),
    ];
    let res = persister.commit(&batch, Source::Reddit, 3).await;
    assert!(res.ok);
    assert_eq!(res.inserted_count, 2);
    assert_eq!(res.attempts, 1);

    let posts = rest.posts();
    assert_eq!(posts.len(), 1);
    let (body, h) = &posts[0];
    assert_eq!(header(h, "prefer"), Some("return=representation"));
    assert_eq!(header(h, "apikey"), Some("anon-key"));
    assert_eq!(body[0]["source"], "reddit");
    assert_eq!(
        body[0]["normalized_link"],
        "https://www.reddit.com/r/startups/comments/1/one"
    );
    assert!(body[1]["ingested_at"].is_string());
}

#[tokio::test]
async fn server_error_is_retried_until_the_bound() {
    let mut rest = Rest::new(vec![]);
    rest.insert = InsertReply::Fail;
    let store = Arc::new(store_for(rest.clone()).await);

    let err = store
        .insert_batch(&[common::stored(Source::HackerNews, "https://a.com/x")])
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("500"), "{err:#}");

    let persister = BatchPersister::new(store, Backoff::None);
    let res = persister
        .commit(&[idea(Source::HackerNews, "A", "https://a.com/x")], Source::HackerNews, 3)
        .await;
    assert!(!res.ok);
    assert_eq!(res.inserted_count, 0);
    assert_eq!(res.attempts, 3);
    assert_eq!(rest.posts().len(), 1 + 3);
}

#[tokio::test]
async fn empty_acknowledgement_is_a_failed_attempt() {
    let mut rest = Rest::new(vec![]);
    rest.insert = InsertReply::Empty;
    let store = Arc::new(store_for(rest.clone()).await);
    let persister = BatchPersister::new(store, Backoff::None);

    let res = persister
        .commit(&[idea(Source::ProductHunt, "A", "https://a.com/x")], Source::ProductHunt, 2)
        .await;
    assert!(!res.ok);
    assert_eq!(res.attempts, 2);
    assert_eq!(rest.posts().len(), 2);
}

#[tokio::test]
async fn list_pages_past_the_server_row_cap() {
    let rows: Vec<Value> = (1..=7)
        .map(|i| {
            let source = if i % 2 == 0 { "hackernews" } else { "reddit" };
            row(i, source, &format!("https://x.com/{i}"))
        })
        .collect();
    let mut rest = Rest::new(rows);
    rest.cap = 2;
    let store = store_for(rest.clone()).await.with_page_size(3);

    let all = store.list(None).await.unwrap();
    let titles: Vec<&str> = all.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        ["Idea 1", "Idea 2", "Idea 3", "Idea 4", "Idea 5", "Idea 6", "Idea 7"]
    );

    let gets = rest.gets();
    let offsets: Vec<&str> = gets.iter().map(|(q, _)| q["offset"].as_str()).collect();
    assert_eq!(offsets, ["0", "2", "4", "6", "7"]);
    assert!(gets.iter().all(|(q, _)| q["limit"] == "3"));
    assert!(gets.iter().all(|(q, _)| q["order"].starts_with("ingested_at.asc")));
    assert!(gets.iter().all(|(q, _)| !q.contains_key("source")));
}

#[tokio::test]
async fn list_by_source_sends_the_source_filter() {
    let rows: Vec<Value> = (1..=5)
        .map(|i| {
            let source = if i <= 3 { "reddit" } else { "indiehackers" };
            row(i, source, &format!("https://x.com/{i}"))
        })
        .collect();
    let rest = Rest::new(rows);
    let store = store_for(rest.clone()).await;

    let only = store.list(Some(Source::IndieHackers)).await.unwrap();
    assert_eq!(only.len(), 2);
    assert!(only.iter().all(|r| r.source == Source::IndieHackers));
    assert!(rest.gets().iter().all(|(q, _)| q["source"] == "eq.indiehackers"));
}
