use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../../static/index.html");

/// Operator page: key validation, model browser and the endpoints to paste into clients.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
