use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use newswire_core::bm25::{rank_bm25, INTERACTIVE_TOP_K};
use newswire_core::docstore::{docno_partition, fetch_by_id, DocumentStore, FsDocStore, NO_HEADLINE};
use newswire_core::persist::{load_index, IndexPaths, SearchIndex};
use newswire_core::snippet::summarize;
use newswire_core::tokenizer::{analyze, tokenize};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub rank: usize,
    pub docno: String,
    pub headline: String,
    pub date: String,
    pub score: f64,
    pub snippet: String,
}

/// Shared read-only state. The index is immutable after load, so concurrent
/// requests need no locking.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<SearchIndex>,
    pub store: Arc<FsDocStore>,
}

pub fn build_app(index_dir: String) -> Result<Router> {
    let paths = IndexPaths::new(&index_dir);
    let index = load_index(&paths)?;
    tracing::info!(
        num_docs = index.meta.num_docs,
        stemmed = index.meta.stemmed,
        "index loaded"
    );
    let state = AppState {
        index: Arc::new(index),
        store: Arc::new(FsDocStore::new(&paths.root)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/article/:docno", get(article_handler))
        .with_state(state)
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let index = &state.index;

    let rank_tokens = analyze(&params.q, index.meta.stemmed);
    // Snippets match the raw stored text, so they use unstemmed tokens.
    let raw_tokens = tokenize(&params.q);
    let ranked = rank_bm25(
        &rank_tokens,
        &index.lexicon,
        &index.index,
        &index.doc_lengths,
        INTERACTIVE_TOP_K,
    );

    let mut results = Vec::with_capacity(ranked.len());
    for (i, (doc_id, score)) in ranked.iter().enumerate() {
        let doc = fetch_by_id(state.store.as_ref(), &index.docnos, *doc_id)
            .map_err(internal_error)?
            .ok_or_else(|| {
                internal_error(anyhow::anyhow!("ranked document {doc_id} missing from store"))
            })?;
        let summary = summarize(&doc, &raw_tokens);
        results.push(SearchHit {
            rank: i + 1,
            docno: doc.meta.docno,
            headline: summary.headline,
            date: doc.meta.date,
            score: *score,
            snippet: summary.snippet,
        });
    }

    Ok(Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        total_hits: results.len(),
        results,
    }))
}

pub async fn article_handler(
    State(state): State<AppState>,
    Path(docno): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    if let Err(err) = docno_partition(&docno) {
        return Err((StatusCode::BAD_REQUEST, err.to_string()));
    }
    let doc = state
        .store
        .get_by_docno(&docno)
        .map_err(internal_error)?
        .ok_or((
            StatusCode::NOT_FOUND,
            format!("no article with docno {docno}"),
        ))?;

    Ok(Json(serde_json::json!({
        "docno": doc.meta.docno,
        "internal_id": doc.meta.internal_id,
        "date": doc.meta.date,
        "headline": doc.meta.headline.as_deref().unwrap_or(NO_HEADLINE),
        "content": doc.content.join("\n"),
    })))
}

fn internal_error(err: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
