use emr_viewer_core::ViewerConfig;
use emr_viewer_core::request::{Method, RequestError, StudyRequest, csrf_token};
use gloo_net::http::{Request, RequestBuilder};
use wasm_bindgen::JsCast;

fn document_cookies() -> String {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.dyn_into::<web_sys::HtmlDocument>().ok())
        .and_then(|d| d.cookie().ok())
        .unwrap_or_default()
}

/// Perform `request` and return the response body.
///
/// State-changing requests carry the CSRF token from the page cookie.
pub async fn send(config: &ViewerConfig, request: StudyRequest) -> Result<Vec<u8>, RequestError> {
    let mut builder: RequestBuilder = match request.method {
        Method::Get => Request::get(&request.path),
        Method::Post => Request::post(&request.path),
    };
    builder = builder.header("Content-Type", "application/json");
    if request.method.is_mutating() {
        let token = csrf_token(&document_cookies(), &config.csrf_cookie)
            .ok_or_else(|| RequestError::MissingCsrfToken(config.csrf_cookie.clone()))?;
        builder = builder.header(&config.csrf_header, &token);
    }

    let network = |e: gloo_net::Error| RequestError::Network(e.to_string());
    let response = match request.body {
        Some(body) => builder.body(body).map_err(network)?.send().await,
        None => builder.send().await,
    }
    .map_err(network)?;

    if !response.ok() {
        return Err(RequestError::Http {
            status: response.status(),
            message: response.status_text(),
        });
    }
    response.binary().await.map_err(network)
}
