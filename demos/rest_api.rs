//! A small article API showing the pieces fitting together: an entity, a
//! resource with hooks and constraints, and per-operation middleware.
//!
//! Run with `cargo run --example rest_api`, then:
//!
//! ```text
//! curl 'localhost:3000/articles?sort=title&order=desc'
//! curl -X POST localhost:3000/articles \
//!     -H 'content-type: application/json' -H 'x-api-key: secret' \
//!     -d '{"title": "Hello"}'
//! ```

use axum::extract::Request;
use axum::middleware::{Next, from_fn};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use restkit::prelude::*;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Article {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    title: String,
    #[serde(default)]
    draft: bool,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl Entity for Article {
    type Id = Uuid;

    fn resource_name() -> &'static str {
        "articles"
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

struct Articles {
    store: MemoryStore<Article>,
}

#[async_trait]
impl Resource for Articles {
    type Entity = Article;

    fn store(&self) -> &dyn EntityStore<Article> {
        &self.store
    }

    fn count_metadata(&self) -> bool {
        true
    }

    fn constraints(&self, operation: Operation) -> Constraints<Article> {
        match operation {
            // drafts are invisible to readers but still mutable
            Operation::List | Operation::One => Constraints::new().filter("draft", false),
            _ => Constraints::default(),
        }
    }

    async fn before_create(&self, request: &RequestContext) -> MutationOutcome {
        match request.body.get("title").and_then(Value::as_str) {
            Some(title) if !title.trim().is_empty() => {
                MutationOutcome::Proceed(request.body.clone())
            }
            _ => MutationOutcome::Avoid,
        }
    }
}

async fn require_api_key(request: Request, next: Next) -> Response {
    if request.headers().contains_key("x-api-key") {
        next.run(request).await
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let store = MemoryStore::new();
    for title in ["Alpha", "Beta", "Gamma"] {
        store.put(Article {
            id: Uuid::new_v4(),
            title: title.to_string(),
            draft: false,
            created_at: Utc::now(),
        })?;
    }

    let config = RouteConfig::new()
        .rule(MiddlewareRule::on(
            "create,update,delete",
            vec![layer_fn(|router| router.layer(from_fn(require_api_key)))],
        )?)
        .fallback(vec![layer_fn(|router| {
            router.layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive()),
            )
        })]);

    let app = resource_routes("articles", Arc::new(Articles { store }), config);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
