use crate::block::RequestBlock;
use crate::http::HttpResponse;

use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Version};

/// Builds the result document: request echo, status line, headers, body.
pub fn render_response(method_url: &str, res: &HttpResponse, pretty: bool) -> String {
    let mut out = String::new();
    out.push_str(method_url);
    out.push('\n');
    out.push_str(&status_line(res.version(), res.status()));
    out.push('\n');
    out.push_str(&render_headers(res.headers()));
    out.push('\n');

    let body = if pretty && is_json(res.content_type()) {
        pretty_json(res.body()).unwrap_or_else(|| res.body().to_string())
    } else {
        res.body().to_string()
    };
    out.push_str(&body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
    out
}

pub fn status_line(version: Version, status: StatusCode) -> String {
    format!("{version:?} {status}")
}

pub fn render_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            format!(
                "{}: {}\n",
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes())
            )
        })
        .collect()
}

pub fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .map(|c| c.to_ascii_lowercase().contains("json"))
        .unwrap_or(false)
}

fn pretty_json(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    serde_json::to_string_pretty(&value).ok()
}

/// The parsed request as JSON, for `--dry-run`.
pub fn render_dry_run(block: &RequestBlock, target_url: &str) -> serde_json::Result<String> {
    let mut value = serde_json::to_value(block)?;
    value["target_url"] = serde_json::Value::String(target_url.to_string());
    serde_json::to_string_pretty(&value)
}

#[cfg(test)]
mod test {
    use super::*;
    use reqwest::header::HeaderValue;

    fn response(content_type: &str, body: &str) -> HttpResponse {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_str(content_type).unwrap());
        HttpResponse::new(StatusCode::CREATED, Version::HTTP_11, headers, body.to_string())
    }

    #[test]
    fn render_response_should_lay_out_result_document() {
        let res = response("application/json", "{\"id\":7}");
        let rendered = render_response("POST http://localhost/users", &res, true);
        assert_eq!(
            rendered,
            "POST http://localhost/users\n\
             HTTP/1.1 201 Created\n\
             content-type: application/json\n\
             \n\
             {\n  \"id\": 7\n}\n"
        );
    }

    #[test]
    fn render_response_should_keep_raw_body_when_asked() {
        let res = response("application/json", "{\"id\":7}");
        let rendered = render_response("GET /", &res, false);
        assert!(rendered.ends_with("\n{\"id\":7}\n"));

        let res = response("text/plain", "{\"id\":7}");
        let rendered = render_response("GET /", &res, true);
        assert!(rendered.ends_with("\n{\"id\":7}\n"));
    }

    #[test]
    fn status_line_should_look_like_http() {
        assert_eq!(
            status_line(Version::HTTP_11, StatusCode::OK),
            "HTTP/1.1 200 OK"
        );
        assert_eq!(
            status_line(Version::HTTP_2, StatusCode::NOT_FOUND),
            "HTTP/2.0 404 Not Found"
        );
    }

    #[test]
    fn render_headers_should_print_one_per_line() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        let rendered = render_headers(&headers);
        assert!(rendered.contains("content-type: text/plain\n"));
        assert!(rendered.contains("set-cookie: a=1\n"));
        assert!(rendered.contains("set-cookie: b=2\n"));
        assert_eq!(rendered.lines().count(), 3);
    }

    #[test]
    fn is_json_should_match_json_media_types() {
        assert!(is_json(Some("application/json")));
        assert!(is_json(Some("application/problem+JSON; charset=utf-8")));
        assert!(!is_json(Some("text/html")));
        assert!(!is_json(None));
    }

    #[test]
    fn pretty_json_should_indent_and_reject_garbage() {
        assert_eq!(
            pretty_json("{\"a\":1}").as_deref(),
            Some("{\n  \"a\": 1\n}")
        );
        assert_eq!(pretty_json("not json"), None);
    }
}
