use std::sync::Arc;
use std::time::Duration;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};

use pirdesk::auth::middleware::{require_auth, require_json_content_type};
use pirdesk::auth::password::hash_password;
use pirdesk::db;
use pirdesk::debounce::{SaveFuture, SaveScheduler};
use pirdesk::handlers::{
    auth_handlers, component_handlers, pir_handlers, question_handlers, response_handlers,
    review_handlers, section_handlers, tag_handlers,
};
use pirdesk::models::{pir, response};
use pirdesk::notify::{Dispatcher, LogDispatcher};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let database_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| "data/pirdesk.db".to_string());
    if let Some(parent) = std::path::Path::new(&database_path).parent() {
        std::fs::create_dir_all(parent).expect("Failed to create data directory");
    }

    let pool = db::init_pool(&database_path);
    db::run_migrations(&pool);

    let admin_hash = hash_password(
        &std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
    )
    .expect("Failed to hash default password");
    db::seed_base(&pool, &admin_hash);

    // Session encryption key — load from SESSION_KEY env var for persistent sessions across restarts
    let secret_key = match std::env::var("SESSION_KEY") {
        Ok(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Ok(val) => {
            log::warn!(
                "SESSION_KEY too short ({} bytes, need 64+) — generating random key",
                val.len()
            );
            Key::generate()
        }
        Err(_) => {
            log::warn!("No SESSION_KEY set — generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    let debounce_ms: u64 = std::env::var("SAVE_DEBOUNCE_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(800);

    let scheduler_pool = pool.clone();
    let scheduler = SaveScheduler::new(
        Duration::from_millis(debounce_ms),
        move |(pir_id, question_id): (i64, i64), answer: serde_json::Value| {
            let pool = scheduler_pool.clone();
            let fut: SaveFuture = Box::pin(async move {
                let conn = pool.get().map_err(|e| e.to_string())?;
                let pir = pir::queries::require_by_id(&conn, pir_id).map_err(|e| e.to_string())?;
                response::queries::save_answer(&conn, &pir, question_id, &answer)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            });
            fut
        },
    );

    let dispatcher: Arc<dyn Dispatcher> = Arc::new(LogDispatcher);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    log::info!("Starting server at http://{bind_addr}");

    HttpServer::new(move || {
        let session_mw =
            SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                .cookie_secure(false)
                .cookie_http_only(true)
                .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(scheduler.clone()))
            .app_data(web::Data::from(dispatcher.clone()))
            .service(
                web::scope("/api/v1")
                    .wrap(actix_web::middleware::from_fn(require_json_content_type))
                    .route("/auth/login", web::post().to(auth_handlers::login))
                    .service(
                        web::scope("")
                            .wrap(actix_web::middleware::from_fn(require_auth))
                            .route("/auth/logout", web::post().to(auth_handlers::logout))
                            .route("/auth/me", web::get().to(auth_handlers::me))
                            // Question bank (admin)
                            .route("/sections", web::get().to(section_handlers::list))
                            .route("/sections", web::post().to(section_handlers::create))
                            .route("/sections/{id}", web::put().to(section_handlers::update))
                            .route("/sections/{id}", web::delete().to(section_handlers::delete))
                            .route("/questions", web::get().to(question_handlers::list))
                            .route("/questions", web::post().to(question_handlers::create))
                            .route("/questions/{id}", web::get().to(question_handlers::read))
                            .route("/questions/{id}", web::put().to(question_handlers::update))
                            .route("/questions/{id}", web::delete().to(question_handlers::delete))
                            .route("/tags", web::get().to(tag_handlers::list))
                            .route("/tags", web::post().to(tag_handlers::create))
                            .route("/tags/{id}", web::put().to(tag_handlers::update))
                            .route("/tags/{id}", web::delete().to(tag_handlers::delete))
                            // PIR lifecycle
                            .route("/pirs", web::get().to(pir_handlers::list))
                            .route("/pirs", web::post().to(pir_handlers::create))
                            .route("/pirs/{id}", web::get().to(pir_handlers::read))
                            .route("/pirs/{id}/submit", web::post().to(pir_handlers::submit))
                            .route("/pirs/{id}/questions", web::get().to(pir_handlers::questions))
                            // Review workflow
                            .route("/pirs/{id}/review", web::get().to(review_handlers::read))
                            .route("/pirs/{id}/review/open", web::post().to(review_handlers::open))
                            .route(
                                "/pirs/{id}/review/submit",
                                web::post().to(review_handlers::submit),
                            )
                            // Responses
                            .route("/pirs/{id}/responses", web::get().to(response_handlers::list))
                            .route(
                                "/pirs/{id}/responses/{question_id}",
                                web::put().to(response_handlers::save),
                            )
                            .route(
                                "/pirs/{id}/responses/{question_id}/ensure",
                                web::post().to(response_handlers::ensure),
                            )
                            .route(
                                "/responses/{id}/comments",
                                web::get().to(response_handlers::list_comments),
                            )
                            .route(
                                "/responses/{id}/comments",
                                web::post().to(response_handlers::create_comment),
                            )
                            .route(
                                "/responses/{id}/flags",
                                web::get().to(response_handlers::list_flags),
                            )
                            .route("/flags/{id}", web::put().to(response_handlers::update_flag))
                            // Components and materials
                            .route(
                                "/responses/{id}/components",
                                web::get().to(component_handlers::list),
                            )
                            .route(
                                "/responses/{id}/components",
                                web::post().to(component_handlers::create),
                            )
                            .route("/components/{id}", web::put().to(component_handlers::update))
                            .route(
                                "/components/{id}",
                                web::delete().to(component_handlers::delete),
                            )
                            .route(
                                "/components/{id}/materials",
                                web::post().to(component_handlers::create_material),
                            )
                            .route(
                                "/materials/{id}",
                                web::put().to(component_handlers::update_material),
                            )
                            .route(
                                "/materials/{id}",
                                web::delete().to(component_handlers::delete_material),
                            ),
                    ),
            )
            .default_service(web::to(|| async {
                actix_web::HttpResponse::NotFound()
                    .json(serde_json::json!({ "error": "Not found" }))
            }))
    })
    .bind(bind_addr.as_str())?
    .run()
    .await
}
