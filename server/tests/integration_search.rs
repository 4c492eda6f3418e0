use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use newswire_core::docstore::FsDocStore;
use newswire_core::indexer::build_index;
use newswire_core::persist::{
    save_doc_lengths, save_docnos, save_inverted_index, save_lexicon, save_meta, IndexMeta,
    IndexPaths, INDEX_FORMAT_VERSION,
};
use serde_json::Value;
use std::io::Cursor;
use tower::ServiceExt;

const CORPUS: &str = "\
<DOC>
<DOCNO> LA010190-0001 </DOCNO>
<HEADLINE>
Dog Show Opens
</HEADLINE>
<TEXT>
The happy dog met another brown dog downtown this very morning.
</TEXT>
</DOC>
<DOC>
<DOCNO> LA010290-0002 </DOCNO>
<TEXT>
City council debated the harbor budget for six long hours yesterday.
</TEXT>
</DOC>
<DOC>
<DOCNO> LA010390-0003 </DOCNO>
<TEXT>
Rain fell across the basin through most of the afternoon commute.
</TEXT>
</DOC>
<DOC>
<DOCNO> LA010490-0004 </DOCNO>
<TEXT>
A dog appeared briefly near the harbor wall and wandered away.
Nobody at the scene could say where the animal had come from.
</TEXT>
</DOC>
<DOC>
<DOCNO> LA010590-0005 </DOCNO>
<TEXT>
The orchestra rehearsed a new program of early romantic works downtown.
</TEXT>
</DOC>
";

fn build_tiny_index(dir: &std::path::Path) {
    let mut store = FsDocStore::new(dir);
    let built = build_index(Cursor::new(CORPUS), false, &mut store).unwrap();
    let paths = IndexPaths::new(dir);
    save_lexicon(&paths, &built.lexicon).unwrap();
    save_inverted_index(&paths, &built.index).unwrap();
    save_docnos(&paths, &built.docnos).unwrap();
    save_doc_lengths(&paths, &built.doc_lengths).unwrap();
    save_meta(
        &paths,
        &IndexMeta {
            version: INDEX_FORMAT_VERSION,
            num_docs: built.docnos.len() as u32,
            stemmed: false,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        },
    )
    .unwrap();
}

fn app_over_tiny_index(dir: &std::path::Path) -> Router {
    build_tiny_index(dir);
    newswire_server::build_app(dir.to_string_lossy().to_string()).unwrap()
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let resp = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, body)
}

#[tokio::test]
async fn health_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over_tiny_index(dir.path());
    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over_tiny_index(dir.path());

    let (status, body) = get(app, "/search?q=dog").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"].as_u64(), Some(2));

    let results = json["results"].as_array().unwrap();
    // higher tf and shorter document must outrank the single mention
    assert_eq!(results[0]["docno"].as_str(), Some("LA010190-0001"));
    assert_eq!(results[0]["rank"].as_u64(), Some(1));
    assert_eq!(results[0]["headline"].as_str(), Some("Dog Show Opens"));
    assert_eq!(results[0]["date"].as_str(), Some("January 1, 1990"));
    assert!(results[0]["snippet"].as_str().unwrap().contains("dog"));
    assert_eq!(results[1]["docno"].as_str(), Some("LA010490-0004"));
}

#[tokio::test]
async fn search_without_hits_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over_tiny_index(dir.path());

    let (status, body) = get(app, "/search?q=zebra").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"].as_u64(), Some(0));
    assert!(json["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn article_returns_stored_document() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over_tiny_index(dir.path());

    let (status, body) = get(app, "/article/LA010290-0002").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["date"].as_str(), Some("January 2, 1990"));
    assert_eq!(json["headline"].as_str(), Some("NO HEADLINE"));
    assert!(json["content"].as_str().unwrap().starts_with("<DOC>"));
}

#[tokio::test]
async fn unknown_article_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over_tiny_index(dir.path());
    let (status, _) = get(app, "/article/LA010190-9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_docno_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over_tiny_index(dir.path());
    let (status, _) = get(app, "/article/garbage").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
