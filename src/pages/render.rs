//! HTML shells for page and not-found responses.

use axum::response::Html;

use crate::config::AppConfig;
use crate::pages::Page;

/// Application shell that boots the client bundle on `page`.
pub fn render_page(app: &AppConfig, page: Page) -> Html<String> {
    Html(format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html lang=\"en\">\n",
            "<head>\n",
            "<meta charset=\"utf-8\">\n",
            "<meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\n",
            "<title>{title} | {page_title}</title>\n",
            "</head>\n",
            "<body>\n",
            "<div id=\"app\" data-page=\"{page}\" data-component=\"{component}\"></div>\n",
            "<script src=\"{bundle}\" defer></script>\n",
            "</body>\n",
            "</html>\n",
        ),
        title = escape(&app.title),
        page_title = page.title(),
        page = page,
        component = page.component(),
        bundle = escape(&app.bundle_path),
    ))
}

/// Minimal document served with 404 responses.
pub fn render_not_found(app: &AppConfig, path: &str) -> Html<String> {
    Html(format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html lang=\"en\">\n",
            "<head><meta charset=\"utf-8\"><title>{title} | Not found</title></head>\n",
            "<body><h1>Not found</h1><p>No page is bound to <code>{path}</code>.</p></body>\n",
            "</html>\n",
        ),
        title = escape(&app.title),
        path = escape(path),
    ))
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
