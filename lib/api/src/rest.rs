use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use reelsim_core::{pair_count, parse_top_n, Catalog, Entity, SimilarityPair};
use reelsim_storage::CatalogManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

const DEFAULT_TOP_N: i64 = 10;
/// Largest `top_n` one request may ask for.
pub const MAX_TOP_N: usize = 1_000;

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct SimilarQuery {
    top_n: Option<i64>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    entities: usize,
    vocabulary: usize,
}

#[derive(Serialize)]
struct TitleRef {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<String>,
}

impl TitleRef {
    fn lookup(catalog: &Catalog, id: &str) -> Self {
        let entity = catalog.entity(id);
        Self {
            id: id.to_string(),
            name: entity.and_then(|e| e.primary_name.clone()),
            year: entity.and_then(|e| e.release_year.clone()),
        }
    }
}

#[derive(Serialize)]
struct PairResult {
    first: TitleRef,
    second: TitleRef,
    score: f32,
}

impl PairResult {
    fn from_pair(catalog: &Catalog, pair: SimilarityPair) -> Self {
        Self {
            first: TitleRef::lookup(catalog, &pair.first),
            second: TitleRef::lookup(catalog, &pair.second),
            score: pair.score,
        }
    }
}

#[derive(Serialize)]
struct NeighborResult {
    title: TitleRef,
    score: f32,
}

fn error_json(message: impl std::fmt::Display) -> serde_json::Value {
    serde_json::json!({ "error": message.to_string() })
}

/// Validate a requested count and clamp it to what `available` can supply.
fn bounded_top_n(requested: Option<i64>, available: usize) -> Result<usize, HttpResponse> {
    let top_n = parse_top_n(requested.unwrap_or(DEFAULT_TOP_N))
        .map_err(|e| HttpResponse::BadRequest().json(error_json(e)))?;
    if top_n > MAX_TOP_N {
        return Err(HttpResponse::BadRequest().json(error_json(format!(
            "top_n must be at most {}, got {}",
            MAX_TOP_N, top_n
        ))));
    }
    Ok(top_n.min(available))
}

pub struct RestApi;

impl RestApi {
    pub async fn start(manager: Arc<CatalogManager>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(manager.clone()))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Route table, shared by the server and tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/titles/search", web::get().to(search_titles))
        .route("/titles/similar", web::get().to(similar_pairs))
        .route("/titles/{id}", web::get().to(get_title))
        .route("/titles/{id}/similar", web::get().to(similar_to_title))
        .route("/catalog/reload", web::post().to(reload_catalog))
        .route("/catalog/snapshot", web::post().to(snapshot_catalog));
}

async fn health(manager: web::Data<Arc<CatalogManager>>) -> ActixResult<HttpResponse> {
    let catalog = manager.current();
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        entities: catalog.len(),
        vocabulary: catalog.space().vocabulary().len(),
    }))
}

async fn search_titles(
    manager: web::Data<Arc<CatalogManager>>,
    query: web::Query<SearchQuery>,
) -> ActixResult<HttpResponse> {
    let catalog = manager.current();
    let limit = query.limit.unwrap_or(usize::MAX);
    let found: Vec<&Entity> = catalog
        .search_by_name(&query.q)
        .into_iter()
        .take(limit)
        .collect();
    Ok(HttpResponse::Ok().json(found))
}

async fn similar_pairs(
    manager: web::Data<Arc<CatalogManager>>,
    query: web::Query<SimilarQuery>,
) -> ActixResult<HttpResponse> {
    let catalog = manager.current();
    let top_n = match bounded_top_n(query.top_n, pair_count(catalog.len())) {
        Ok(top_n) => top_n,
        Err(resp) => return Ok(resp),
    };

    let results = web::block(move || {
        catalog
            .rank_similar_pairs(top_n)
            .into_iter()
            .map(|pair| PairResult::from_pair(&catalog, pair))
            .collect::<Vec<_>>()
    })
    .await?;
    Ok(HttpResponse::Ok().json(results))
}

async fn get_title(
    manager: web::Data<Arc<CatalogManager>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    let catalog = manager.current();
    match catalog.entity(&id) {
        Some(entity) => Ok(HttpResponse::Ok().json(entity)),
        None => Ok(HttpResponse::NotFound().json(error_json("Title not found"))),
    }
}

async fn similar_to_title(
    manager: web::Data<Arc<CatalogManager>>,
    path: web::Path<String>,
    query: web::Query<SimilarQuery>,
) -> ActixResult<HttpResponse> {
    let catalog = manager.current();
    let k = match bounded_top_n(query.top_n, catalog.len().saturating_sub(1)) {
        Ok(k) => k,
        Err(resp) => return Ok(resp),
    };
    let id = path.into_inner();

    match catalog.similar_to(&id, k) {
        Ok(neighbors) => {
            let results: Vec<NeighborResult> = neighbors
                .into_iter()
                .map(|n| NeighborResult {
                    title: TitleRef::lookup(&catalog, &n.id),
                    score: n.score,
                })
                .collect();
            Ok(HttpResponse::Ok().json(results))
        }
        Err(e) => Ok(HttpResponse::NotFound().json(error_json(e))),
    }
}

async fn reload_catalog(manager: web::Data<Arc<CatalogManager>>) -> ActixResult<HttpResponse> {
    let manager = manager.get_ref().clone();
    match web::block(move || manager.reload()).await? {
        Ok(catalog) => {
            info!("Catalog reloaded: {} entities", catalog.len());
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "status": "reloaded",
                "entities": catalog.len(),
            })))
        }
        Err(e) => {
            error!("Catalog reload failed: {:#}", e);
            Ok(HttpResponse::InternalServerError().json(error_json(format!("{:#}", e))))
        }
    }
}

async fn snapshot_catalog(manager: web::Data<Arc<CatalogManager>>) -> ActixResult<HttpResponse> {
    let manager = manager.get_ref().clone();
    match web::block(move || manager.snapshot()).await? {
        Ok(Some(desc)) => Ok(HttpResponse::Ok().json(desc)),
        Ok(None) => Ok(HttpResponse::BadRequest().json(error_json("No snapshot directory configured"))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(error_json(format!("{:#}", e)))),
    }
}
