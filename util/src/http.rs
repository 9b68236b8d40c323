use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Returns true if the API host answers.
///  - HEAD first; a 2xx/3xx answer is alive.
///  - Otherwise GET, where any answer below 500 is alive (an API root usually
///    answers 401 or 404).
///  - `timeout_secs` caps each request.
pub async fn is_url_alive(url: &str, timeout_secs: u64) -> Result<bool, reqwest::Error> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()?;

    // Try HEAD
    let head = client.head(url).send().await;
    match head {
        Ok(resp) => {
            let code = resp.status();
            if code.is_success() || code.is_redirection() || code == StatusCode::NOT_MODIFIED {
                return Ok(true);
            }
            // Some hosts disallow HEAD → use GET fallback
            tracing::debug!(%url, status = %code, "HEAD not conclusive, falling back to GET");
        }
        Err(e) => {
            tracing::debug!(%url, error = %e, "HEAD failed, falling back to GET");
        }
    }

    // Fallback: GET
    let get = client.get(url).send().await?;
    let code = get.status();
    Ok(code.is_success() || code.is_redirection() || code.is_client_error())
}
