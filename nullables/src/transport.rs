//! Nullable HTTP transport: scripted responses, recorded requests.

use std::sync::Mutex;
use watchdog_client::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

type Reply = Result<HttpResponse, TransportError>;

/// A scripted reply queue for every request whose key contains `pattern`.
struct Route {
    pattern: String,
    replies: Vec<Reply>,
    /// Index of the next reply; the last reply repeats once the queue is spent.
    next: usize,
}

/// A test transport that answers from a script instead of the network.
///
/// Requests are matched on a key made of the URL followed by the form fields
/// as `?name=value&...` (or `&name=value` if the URL already has a query), so a
/// multipart page request can be matched as `poll/list?option_id=7&page=2`.
/// The first route registered whose pattern is a substring of the key wins.
/// Unmatched requests get a 404.
pub struct NullTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl NullTransport {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Key a request is matched on.
    pub fn request_key(request: &HttpRequest) -> String {
        let mut key = request.url.clone();
        let mut separator = if key.contains('?') { '&' } else { '?' };
        for (name, value) in &request.form {
            key.push(separator);
            key.push_str(name);
            key.push('=');
            key.push_str(value);
            separator = '&';
        }
        key
    }

    fn push(&self, pattern: &str, reply: Reply) {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        match routes.iter_mut().find(|r| r.pattern == pattern) {
            Some(route) => route.replies.push(reply),
            None => routes.push(Route {
                pattern: pattern.to_string(),
                replies: vec![reply],
                next: 0,
            }),
        }
    }

    /// Queue a response for requests matching `pattern`.
    pub fn respond(self, pattern: &str, response: HttpResponse) -> Self {
        self.push(pattern, Ok(response));
        self
    }

    /// Queue a 200 response with a JSON body.
    pub fn respond_json(self, pattern: &str, body: serde_json::Value) -> Self {
        self.respond(pattern, HttpResponse::new(200, body.to_string()))
    }

    /// Queue a bare status code.
    pub fn respond_status(self, pattern: &str, status: u16) -> Self {
        self.respond(pattern, HttpResponse::new(status, Vec::new()))
    }

    /// Queue a transport-level failure.
    pub fn fail(self, pattern: &str, error: TransportError) -> Self {
        self.push(pattern, Err(error));
        self
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of requests whose key contains `pattern`.
    pub fn count_matching(&self, pattern: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| Self::request_key(r).contains(pattern))
            .count()
    }

    /// Number of GET requests sent.
    pub fn get_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == HttpMethod::Get)
            .count()
    }

    fn reply_for(&self, request: &HttpRequest) -> Reply {
        let key = Self::request_key(request);
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        let Some(route) = routes.iter_mut().find(|r| key.contains(&r.pattern)) else {
            return Ok(HttpResponse::new(404, Vec::new()));
        };
        let index = route.next.min(route.replies.len().saturating_sub(1));
        route.next += 1;
        route
            .replies
            .get(index)
            .cloned()
            .unwrap_or_else(|| Ok(HttpResponse::new(404, Vec::new())))
    }
}

impl Default for NullTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for NullTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        self.reply_for(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unmatched_request_is_not_found() {
        let transport = NullTransport::new();
        let response = transport.send(&HttpRequest::get("http://x/y")).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn replies_are_consumed_in_order_and_last_repeats() {
        let transport = NullTransport::new()
            .respond_status("/a", 503)
            .respond_status("/a", 200);
        let req = HttpRequest::get("http://x/a");
        assert_eq!(transport.send(&req).await.unwrap().status, 503);
        assert_eq!(transport.send(&req).await.unwrap().status, 200);
        assert_eq!(transport.send(&req).await.unwrap().status, 200);
    }

    #[tokio::test]
    async fn form_fields_take_part_in_matching() {
        let transport = NullTransport::new()
            .respond_status("list?option_id=7&page=1", 200)
            .respond_status("list?option_id=7&page=2", 500);
        let page = |n: &str| {
            HttpRequest::post_multipart("http://x/poll/list")
                .field("option_id", "7")
                .field("page", n.to_string())
        };
        assert_eq!(transport.send(&page("1")).await.unwrap().status, 200);
        assert_eq!(transport.send(&page("2")).await.unwrap().status, 500);
        assert_eq!(transport.count_matching("page=2"), 1);
    }

    #[tokio::test]
    async fn scripted_failures_are_returned() {
        let transport = NullTransport::new().fail("/down", TransportError::Connect("refused".into()));
        let err = transport.send(&HttpRequest::get("http://x/down")).await.unwrap_err();
        assert_eq!(err, TransportError::Connect("refused".into()));
    }
}
