use crate::controller::{InteractionState, SearchSession};
use crate::format::{format, render_html};
use crate::messages;
use askama::Template;
use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use include_dir::{Dir, include_dir};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info};

type SharedState = Arc<AppState>;

static STATIC_DIR: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/static");

#[derive(Clone)]
pub struct AppState {
    pub session: SearchSession,
    pub theme: WebTheme,
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum WebTheme {
    #[default]
    Tailwind,
    Bootstrap,
}

impl fmt::Display for WebTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebTheme::Tailwind => write!(f, "tailwind"),
            WebTheme::Bootstrap => write!(f, "bootstrap"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Chrome {
    use_tailwind: bool,
    use_bootstrap: bool,
    body_class: &'static str,
    main_class: &'static str,
    card_class: &'static str,
    headline_class: &'static str,
    lede_class: &'static str,
    form_class: &'static str,
    input_class: &'static str,
    button_class: &'static str,
    notice_class: &'static str,
    error_class: &'static str,
    result_class: &'static str,
    term_class: &'static str,
    toggle_class: &'static str,
    footer_class: &'static str,
}

impl Chrome {
    fn new(theme: WebTheme) -> Self {
        match theme {
            WebTheme::Tailwind => Self {
                use_tailwind: true,
                use_bootstrap: false,
                body_class: "min-h-screen bg-gray-900 text-gray-100",
                main_class: "flex flex-col items-center p-4 sm:p-6 lg:p-8",
                card_class: "w-full max-w-3xl mx-auto",
                headline_class: "text-4xl sm:text-5xl font-extrabold text-transparent bg-clip-text bg-gradient-to-r from-blue-400 to-teal-300",
                lede_class: "mt-4 text-lg text-gray-400",
                form_class: "flex gap-2 sticky top-4 z-10 bg-gray-900/80 backdrop-blur-sm py-4",
                input_class: "flex-grow w-full px-4 py-3 bg-gray-800 border border-gray-700 rounded-lg focus:outline-none focus:ring-2 focus:ring-blue-500 disabled:opacity-50",
                button_class: "px-5 py-3 font-semibold text-white bg-blue-600 rounded-lg hover:bg-blue-700 disabled:bg-blue-800 disabled:cursor-not-allowed",
                notice_class: "flex flex-col items-center justify-center p-12 text-gray-400",
                error_class: "text-center p-8 bg-red-900/30 border border-red-700 rounded-lg text-red-300",
                result_class: "bg-gray-800/50 p-6 sm:p-8 rounded-xl shadow-lg border border-gray-700",
                term_class: "text-2xl sm:text-3xl font-bold text-blue-300 mb-4",
                toggle_class: "px-4 py-2 font-semibold text-blue-300 hover:text-blue-200 hover:bg-blue-900/50 rounded-lg",
                footer_class: "text-center mt-12 text-gray-500 text-sm",
            },
            WebTheme::Bootstrap => Self {
                use_tailwind: false,
                use_bootstrap: true,
                body_class: "bg-dark text-light",
                main_class: "container py-5",
                card_class: "mx-auto col-lg-8",
                headline_class: "display-5 fw-bold text-info text-center",
                lede_class: "lead text-secondary text-center mb-4",
                form_class: "d-flex gap-2 mb-4",
                input_class: "form-control form-control-lg",
                button_class: "btn btn-primary btn-lg",
                notice_class: "text-center text-secondary p-5",
                error_class: "alert alert-danger text-center",
                result_class: "card card-body bg-secondary bg-opacity-25 border-secondary",
                term_class: "h2 text-info mb-3",
                toggle_class: "btn btn-outline-info",
                footer_class: "text-center text-secondary small mt-5",
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Labels {
    title: &'static str,
    tagline: &'static str,
    placeholder: &'static str,
    search: &'static str,
    search_busy: &'static str,
    welcome_heading: &'static str,
    welcome_body: &'static str,
    loading: &'static str,
    error_heading: &'static str,
    footer: &'static str,
}

const LABELS: Labels = Labels {
    title: messages::APP_TITLE,
    tagline: messages::APP_TAGLINE,
    placeholder: messages::SEARCH_PLACEHOLDER,
    search: messages::SEARCH_BUTTON,
    search_busy: messages::SEARCH_BUTTON_BUSY,
    welcome_heading: messages::WELCOME_HEADING,
    welcome_body: messages::WELCOME_BODY,
    loading: messages::LOADING,
    error_heading: messages::ERROR_HEADING,
    footer: messages::FOOTER,
};

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub theme: WebTheme,
    pub base_url: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            theme: WebTheme::default(),
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

pub async fn serve(config: WebConfig, session: SearchSession) -> Result<(), WebError> {
    let state = Arc::new(AppState {
        session,
        theme: config.theme,
        base_url: config.base_url.clone(),
    });
    let router = build_router(state);
    info!(
        %config.addr,
        theme = ?config.theme,
        base = %config.base_url,
        "Binding HTTP listener"
    );
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }

    fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/search", post(search_form))
        .route("/toggle", post(toggle_form))
        .route("/api/state", get(api_state))
        .route("/api/search", post(api_search))
        .route("/api/toggle", post(api_toggle))
        .route("/healthz", get(health))
        .route("/static/*path", get(static_asset))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    term: String,
}

async fn home(State(state): State<SharedState>) -> impl IntoResponse {
    Html(render_page(state.theme, &state.session.snapshot()))
}

async fn search_form(
    State(state): State<SharedState>,
    Form(params): Form<SearchParams>,
) -> impl IntoResponse {
    if let Some(pending) = state.session.begin(&params.term) {
        let session = state.session.clone();
        tokio::spawn(async move {
            session.run(pending).await;
        });
    }
    Redirect::to("/")
}

async fn toggle_form(State(state): State<SharedState>) -> impl IntoResponse {
    state.session.toggle_expand();
    Redirect::to("/")
}

async fn api_state(State(state): State<SharedState>) -> Json<InteractionState> {
    Json(state.session.snapshot())
}

async fn api_search(
    State(state): State<SharedState>,
    Json(params): Json<SearchParams>,
) -> Result<Json<InteractionState>, ApiError> {
    let pending = state
        .session
        .begin(&params.term)
        .ok_or_else(|| ApiError::bad_request(messages::EMPTY_TERM))?;
    match state.session.run(pending).await {
        None => Err(ApiError::conflict("superseded by a newer search")),
        Some(InteractionState::Failed { message, .. }) => Err(ApiError::bad_gateway(message)),
        Some(applied) => Ok(Json(applied)),
    }
}

async fn api_toggle(State(state): State<SharedState>) -> Json<InteractionState> {
    Json(state.session.toggle_expand())
}

async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "findict-web",
        "base_url": state.base_url,
    }))
}

async fn static_asset(Path(path): Path<String>) -> Response {
    let Some(file) = STATIC_DIR.get_file(&path) else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };
    let content_type = match file.path().extension().and_then(|ext| ext.to_str()) {
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("js") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("svg") => mime::IMAGE_SVG,
        _ => mime::APPLICATION_OCTET_STREAM,
    };
    (
        [(header::CONTENT_TYPE, content_type.to_string())],
        file.contents(),
    )
        .into_response()
}

/// Everything the page template needs, derived from one state snapshot.
struct PageView {
    term: String,
    loading: bool,
    error_message: Option<String>,
    body_html: Option<String>,
    show_toggle: bool,
    expanded: bool,
}

impl PageView {
    fn from_state(state: &InteractionState) -> Self {
        let mut view = Self {
            term: String::new(),
            loading: false,
            error_message: None,
            body_html: None,
            show_toggle: false,
            expanded: false,
        };
        match state {
            InteractionState::Idle => {}
            InteractionState::Loading { term } => {
                view.term = term.clone();
                view.loading = true;
            }
            InteractionState::Failed { term, message } => {
                view.term = term.clone();
                view.error_message = Some(message.clone());
            }
            InteractionState::Success { result, expanded } => {
                view.term = result.term.clone();
                view.body_html = Some(render_html(&format(result.visible_text(*expanded))));
                view.show_toggle = result.has_summary();
                view.expanded = *expanded;
            }
        }
        view
    }
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="ko">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    {% if view.loading %}
    <meta http-equiv="refresh" content="1" />
    {% endif %}
    <title>{{ labels.title }}{% if !view.term.is_empty() %} • {{ view.term }}{% endif %}</title>
    {% if chrome.use_tailwind %}
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
    {% endif %}
    {% if chrome.use_bootstrap %}
    <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.8/dist/css/bootstrap.min.css" rel="stylesheet" integrity="sha384-sRIl4kxILFvY47J16cr9ZwB07vP4J8+LH7qKQnuqkuIAvNWLzeN8tE5YBujZqJLB" crossorigin="anonymous">
    {% endif %}
    <link rel="stylesheet" href="/static/app.css" />
  </head>
  <body class="{{ chrome.body_class }}">
    <main class="{{ chrome.main_class }}">
      <div class="{{ chrome.card_class }}">
        <header class="text-center my-8">
          <h1 class="{{ chrome.headline_class }}">{{ labels.title }}</h1>
          <p class="{{ chrome.lede_class }}">{{ labels.tagline }}</p>
        </header>

        <form method="post" action="/search" class="{{ chrome.form_class }}">
          <input type="text" name="term" value="{{ view.term }}" placeholder="{{ labels.placeholder }}" class="{{ chrome.input_class }}"{% if view.loading %} disabled{% endif %} />
          <button type="submit" class="{{ chrome.button_class }}"{% if view.loading %} disabled{% endif %}>
            {% if view.loading %}{{ labels.search_busy }}{% else %}{{ labels.search }}{% endif %}
          </button>
        </form>

        <section id="result" class="mt-8">
          {% if view.loading %}
          <div class="{{ chrome.notice_class }}">
            <p class="mt-4 animate-pulse">{{ labels.loading }}</p>
          </div>
          {% else if view.error_message.is_some() %}
          <div class="{{ chrome.error_class }}">
            <h3 class="text-xl font-semibold">{{ labels.error_heading }}</h3>
            <p class="mt-2">{{ view.error_message.as_ref().unwrap() }}</p>
          </div>
          {% else if view.body_html.is_some() %}
          <article class="{{ chrome.result_class }} animate-fade-in">
            <h2 class="{{ chrome.term_class }}">{{ view.term }}</h2>
            <p class="definition-body">{{ view.body_html.as_ref().unwrap()|safe }}</p>
            {% if view.show_toggle %}
            <form method="post" action="/toggle" class="text-right text-end mt-6">
              <button type="submit" class="{{ chrome.toggle_class }}" aria-expanded="{{ view.expanded }}">{{ toggle_label }}</button>
            </form>
            {% endif %}
          </article>
          {% else %}
          <div class="text-center p-8 border-2 border-dashed border-gray-700 rounded-lg">
            <h3 class="text-xl font-semibold text-gray-300">{{ labels.welcome_heading }}</h3>
            <p class="mt-2 text-gray-500">{{ labels.welcome_body }}</p>
          </div>
          {% endif %}
        </section>

        <footer class="{{ chrome.footer_class }}">
          <p>{{ labels.footer }}</p>
        </footer>
      </div>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct PageTemplate {
    chrome: Chrome,
    labels: Labels,
    view: PageView,
    toggle_label: &'static str,
}

fn render_page(theme: WebTheme, state: &InteractionState) -> String {
    let view = PageView::from_state(state);
    let template = PageTemplate {
        chrome: Chrome::new(theme),
        labels: LABELS,
        toggle_label: messages::toggle_label(view.expanded),
        view,
    };
    template.render().unwrap_or_else(|err| {
        error!(error = %err, "page render failed");
        render_error_page(err.to_string())
    })
}

fn render_error_page(message: impl Into<String>) -> String {
    let message = message.into().replace('&', "&amp;").replace('<', "&lt;");
    format!(
        r#"<!DOCTYPE html>
<html lang="ko">
  <head>
    <meta charset="utf-8" />
    <title>{title} • {heading}</title>
  </head>
  <body>
    <h1>{heading}</h1>
    <p>{message}</p>
    <a href="/">{title}</a>
  </body>
</html>"#,
        title = messages::APP_TITLE,
        heading = messages::ERROR_HEADING,
        message = message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::service::DefinitionService;
    use crate::service::testing::ScriptedGenerator;
    use axum::{body, body::Body, http::Request};
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_router(generator: Arc<ScriptedGenerator>) -> Router {
        let state = Arc::new(AppState {
            session: SearchSession::new(DefinitionService::new(generator)),
            theme: WebTheme::Tailwind,
            base_url: "http://127.0.0.1:8080".to_string(),
        });
        build_router(state)
    }

    async fn body_text(response: Response) -> String {
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn get_page(router: &Router, uri: &str) -> Response {
        router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_json(router: &Router, uri: &str, payload: Value) -> Response {
        router
            .clone()
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn idle_page_shows_welcome() {
        let router = test_router(ScriptedGenerator::new(vec![]));
        let response = get_page(&router, "/").await;
        assert!(response.status().is_success());
        let html = body_text(response).await;
        assert!(html.contains(messages::WELCOME_HEADING));
        assert!(html.contains(messages::SEARCH_PLACEHOLDER));
        assert!(html.contains("/static/app.css"));
    }

    #[tokio::test]
    async fn api_search_then_toggle() {
        let generator = ScriptedGenerator::succeeding(
            "**인플레이션**은 물가가 오르는 현상\n둘째 줄",
            "**물가** 상승",
        );
        let router = test_router(generator.clone());

        let response = post_json(&router, "/api/search", json!({ "term": " 인플레이션 " })).await;
        assert_eq!(response.status(), StatusCode::OK);
        let state: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(state["status"], "success");
        assert_eq!(state["expanded"], false);
        assert_eq!(state["result"]["term"], "인플레이션");
        assert_eq!(state["result"]["summary_text"], "**물가** 상승");

        let html = body_text(get_page(&router, "/").await).await;
        assert!(html.contains(r#"<strong class="term-emphasis">물가</strong> 상승"#));
        assert!(html.contains(messages::SHOW_MORE));

        let response = post_json(&router, "/api/toggle", json!({})).await;
        let state: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(state["expanded"], true);

        let html = body_text(get_page(&router, "/").await).await;
        assert!(html.contains("은 물가가 오르는 현상<br>둘째 줄"));
        assert!(html.contains(messages::SHOW_LESS));
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn api_search_rejects_blank_term() {
        let generator = ScriptedGenerator::new(vec![]);
        let router = test_router(generator.clone());
        let response = post_json(&router, "/api/search", json!({ "term": "   " })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(payload["error"], messages::EMPTY_TERM);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn api_search_summary_failure_is_bad_gateway() {
        let generator = ScriptedGenerator::new(vec![
            Ok("full".to_string()),
            Err(GenerationError::EmptyResponse),
        ]);
        let router = test_router(generator);
        let response = post_json(&router, "/api/search", json!({ "term": "ESG" })).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let payload: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(payload["error"], messages::SUMMARY_UNAVAILABLE);

        let html = body_text(get_page(&router, "/").await).await;
        assert!(html.contains(messages::ERROR_HEADING));
        assert!(!html.contains("definition-body"));
    }

    #[tokio::test]
    async fn blank_form_submit_redirects_to_error() {
        let router = test_router(ScriptedGenerator::new(vec![]));
        let response = router
            .clone()
            .oneshot(
                Request::post("/search")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("term=+"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let html = body_text(get_page(&router, "/").await).await;
        assert!(html.contains(messages::EMPTY_TERM));
    }

    #[tokio::test]
    async fn toggle_before_search_keeps_idle() {
        let router = test_router(ScriptedGenerator::new(vec![]));
        let response = post_json(&router, "/api/toggle", json!({})).await;
        let state: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(state["status"], "idle");
    }

    #[tokio::test]
    async fn stylesheet_is_served() {
        let router = test_router(ScriptedGenerator::new(vec![]));
        let response = get_page(&router, "/static/app.css").await;
        assert!(response.status().is_success());
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/css; charset=utf-8"
        );
        assert!(body_text(response).await.contains("@keyframes fadeIn"));

        let missing = get_page(&router, "/static/missing.js").await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let router = test_router(ScriptedGenerator::new(vec![]));
        let response = get_page(&router, "/healthz").await;
        let payload: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(payload["status"], "ok");
    }

    #[test]
    fn loading_page_refreshes_and_disables_input() {
        let html = render_page(
            WebTheme::Bootstrap,
            &InteractionState::Loading {
                term: "ESG".to_string(),
            },
        );
        assert!(html.contains(r#"http-equiv="refresh""#));
        assert!(html.contains(messages::LOADING));
        assert!(html.contains(messages::SEARCH_BUTTON_BUSY));
        assert!(html.contains(" disabled"));
        assert!(html.contains("bootstrap.min.css"));
    }

    #[test]
    fn term_is_escaped_in_page() {
        let html = render_page(
            WebTheme::Tailwind,
            &InteractionState::Failed {
                term: "<script>".to_string(),
                message: messages::DEFINITION_UNAVAILABLE.to_string(),
            },
        );
        assert!(html.contains(r#"value="&lt;script&gt;""#));
        assert!(!html.contains(r#"value="<script>""#));
    }
}
