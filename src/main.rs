// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use academia_backend::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::{auth::auth_guard, authz::route_guard},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas públicas de autenticação
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Camadas: a mais externa roda primeiro, então auth_guard vem por
    // último na cadeia de .layer() para popular o usuário antes do
    // route_guard consultar a política.
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            route_guard,
        ))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let crm_routes = Router::new()
        .route(
            "/leads",
            post(handlers::crm::create_lead).get(handlers::crm::list_leads),
        )
        .route("/leads/{id}/convert", post(handlers::crm::convert_lead))
        .route(
            "/leads/{id}/follow-ups",
            post(handlers::crm::schedule_follow_up),
        )
        .route("/leads/{id}/stage", patch(handlers::crm::update_lead_stage))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            route_guard,
        ))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let member_routes = Router::new()
        .route("/", get(handlers::members::list_members))
        .route("/{id}", get(handlers::members::get_member))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            route_guard,
        ))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/crm", crm_routes)
        .nest("/api/members", member_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
