use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{actors, transactions, wallets};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Resolves Basic credentials to an actor row and attaches it to the request.
///
/// A missing or wrong credential is 401; a known but deactivated actor is
/// 403. Everything behind this layer can rely on the extension being present,
/// while the engine still re-checks the actor it is handed.
async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let actor: Option<actors::Model> = actors::Entity::find()
        .filter(actors::Column::Email.eq(auth_header.username().to_lowercase()))
        .filter(actors::Column::Password.eq(auth_header.password().to_string()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(actor) = actor else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if !actor.is_active {
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/wallet", get(wallets::get_my))
        .route("/wallets", get(wallets::list))
        .route("/wallets/{id}/block", post(wallets::block))
        .route("/transactions", get(transactions::list_mine))
        .route("/transactions/all", get(transactions::list_all))
        .route("/add", post(transactions::add_money))
        .route("/withdraw", post(transactions::withdraw))
        .route("/send", post(transactions::send_money))
        .route("/cash-in", post(transactions::cash_in))
        .route("/cash-out", post(transactions::cash_out))
        .route("/actors", get(actors::list))
        .route("/actors/{id}/approve", post(actors::approve))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        // Registration stays outside the auth layer.
        .route("/auth/register", post(actors::register))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::transaction::MovementCreated;
    use api_types::wallet::WalletView;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, header};
    use base64::Engine as _;
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::Database;
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder().database(db.clone()).build().await.unwrap();
        router(ServerState {
            engine: Arc::new(engine),
            db,
        })
    }

    fn basic(email: &str, password: &str) -> String {
        let raw = format!("{email}:{password}");
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw)
        )
    }

    fn json_request(method: &str, uri: &str, auth: Option<&str>, body: &str) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn register(app: &Router, name: &str, email: &str, role: &str) {
        let body = format!(
            r#"{{"name":"{name}","email":"{email}","password":"pw","role":"{role}"}}"#
        );
        let res = app
            .clone()
            .oneshot(json_request("POST", "/auth/register", None, &body))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn register_provisions_a_wallet() {
        let app = test_router().await;
        register(&app, "Alice", "alice@example.com", "user").await;

        let res = app
            .clone()
            .oneshot(json_request(
                "GET",
                "/wallet",
                Some(&basic("alice@example.com", "pw")),
                "",
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let wallet: WalletView = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(wallet.balance_minor, 0);
        assert!(wallet.active);
    }

    #[tokio::test]
    async fn add_money_returns_entry_and_balance() {
        let app = test_router().await;
        register(&app, "Alice", "alice@example.com", "user").await;

        let res = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/add",
                Some(&basic("alice@example.com", "pw")),
                r#"{"amount_minor":5000}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let created: MovementCreated = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(created.new_balance, 5000);
        assert_eq!(created.transaction.amount_minor, 5000);
        assert_eq!(created.transaction.fee_minor, 0);
    }

    #[tokio::test]
    async fn missing_credentials_are_unauthorized() {
        let app = test_router().await;
        let res = app
            .clone()
            .oneshot(json_request("POST", "/add", None, r#"{"amount_minor":1}"#))
            .await
            .unwrap();
        // axum-extra rejects the missing typed header before the handler.
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = test_router().await;
        register(&app, "Alice", "alice@example.com", "user").await;

        let res = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/add",
                Some(&basic("alice@example.com", "nope")),
                r#"{"amount_minor":1}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unapproved_agent_cash_in_is_forbidden() {
        let app = test_router().await;
        register(&app, "Agent", "agent@example.com", "agent").await;
        register(&app, "Alice", "alice@example.com", "user").await;

        let res = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/cash-in",
                Some(&basic("agent@example.com", "pw")),
                r#"{"amount_minor":1000,"user_email":"alice@example.com"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let app = test_router().await;
        register(&app, "Alice", "alice@example.com", "user").await;

        let res = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth/register",
                None,
                r#"{"name":"Alice","email":"alice@example.com","password":"pw","role":"user"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }
}
