//! Typed access to the governance forum (Metaforo) API.
//!
//! Every response is wrapped in `{"status": bool, "code": 20000, "data": ..., "description": ..}`;
//! anything but `code == 20000` is an API error.

use crate::client::{FetchOutcome, RateLimitedRetryingClient};
use crate::error::ForumError;
use crate::transport::{HttpRequest, HttpTransport};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use watchdog_types::{AddressBinding, ReportedWeight, VoteOption, VoterBallot};

/// Success code of the forum API envelope.
const CODE_OK: i64 = 20_000;

/// Upper bound on ballot pages for one option.
const MAX_BALLOT_PAGES: u32 = 10_000;

#[derive(Clone, Debug)]
pub struct ForumConfig {
    /// e.g. `https://dao.ckb.community/api`
    pub api_base: String,
    /// Forum group the poll lives in, e.g. `neurontest`.
    pub group: String,
    pub api_key: String,
    pub origin: String,
    pub user_agent: String,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            api_base: "https://dao.ckb.community/api".into(),
            group: "neurontest".into(),
            api_key: "metaforo_website".into(),
            origin: "https://dao.ckb.community".into(),
            user_agent: concat!("dao-watchdog/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    code: i64,
    data: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThreadData {
    thread: ThreadBody,
}

#[derive(Debug, Deserialize)]
struct ThreadBody {
    #[serde(default)]
    polls: Vec<PollBody>,
}

#[derive(Debug, Deserialize)]
struct PollBody {
    #[serde(default)]
    options: Vec<OptionBody>,
}

#[derive(Debug, Deserialize)]
struct OptionBody {
    id: Value,
    #[serde(default)]
    html: String,
    #[serde(default)]
    voters: Value,
    #[serde(default)]
    weights: Value,
}

#[derive(Debug, Deserialize)]
struct BallotListData {
    #[serde(default)]
    list: Vec<BallotBody>,
}

#[derive(Debug, Deserialize)]
struct BallotBody {
    #[serde(default)]
    user_id: Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    weight: Value,
    #[serde(default)]
    last_time: Value,
}

#[derive(Debug, Deserialize)]
struct ProfileData {
    user: ProfileUser,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileUser {
    #[serde(default)]
    neuron_addresses: Option<Vec<Value>>,
    #[serde(default)]
    web3_public_key: Option<String>,
}

/// Numbers arrive as JSON numbers or numeric strings depending on the endpoint.
fn value_as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct ForumApi<T> {
    client: Arc<RateLimitedRetryingClient<T>>,
    config: ForumConfig,
    headers: Vec<(String, String)>,
}

impl<T: HttpTransport> ForumApi<T> {
    pub fn new(client: Arc<RateLimitedRetryingClient<T>>, config: ForumConfig) -> Self {
        let headers = vec![
            ("accept".to_string(), "application/json, text/plain, */*".to_string()),
            ("api_key".to_string(), config.api_key.clone()),
            ("origin".to_string(), config.origin.clone()),
            ("user-agent".to_string(), config.user_agent.clone()),
        ];
        Self {
            client,
            config,
            headers,
        }
    }

    pub fn config(&self) -> &ForumConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn call<D: DeserializeOwned>(&self, request: HttpRequest) -> Result<D, ForumError> {
        let request = request.headers(&self.headers);
        let response = match self.client.execute(&request).await? {
            FetchOutcome::Success(response) => response,
            FetchOutcome::NotFound => return Err(ForumError::NotFound(request.url)),
        };
        let envelope: Envelope<D> = response
            .json()
            .map_err(|e| ForumError::Malformed(format!("{}: {e}", request.url)))?;
        if !envelope.status || envelope.code != CODE_OK {
            return Err(ForumError::Api {
                code: envelope.code,
                description: envelope.description.unwrap_or_default(),
            });
        }
        envelope
            .data
            .ok_or_else(|| ForumError::Malformed(format!("{}: missing data", request.url)))
    }

    /// Options of the first poll in a thread.
    pub async fn vote_options(&self, thread_id: u64) -> Result<Vec<VoteOption>, ForumError> {
        let url = self.url(&format!(
            "get_thread/{thread_id}?sort=old&group_name={}",
            self.config.group
        ));
        let data: ThreadData = self.call(HttpRequest::get(url)).await?;
        let poll = data
            .thread
            .polls
            .into_iter()
            .next()
            .ok_or_else(|| ForumError::NotFound(format!("thread {thread_id} has no poll")))?;

        let mut options = Vec::with_capacity(poll.options.len());
        for opt in poll.options {
            let option_id = value_as_u64(&opt.id)
                .ok_or_else(|| ForumError::Malformed(format!("option id {}", opt.id)))?;
            options.push(VoteOption {
                option_id,
                label: opt.html,
                vote_count: value_as_u64(&opt.voters).unwrap_or(0),
                total_reported_weight: value_as_f64(&opt.weights).map(ReportedWeight::new),
            });
        }
        info!(thread_id, options = options.len(), "fetched poll options");
        Ok(options)
    }

    /// One page (1-based) of ballots cast for an option.
    pub async fn ballots_page(&self, option_id: u64, page: u32) -> Result<Vec<VoterBallot>, ForumError> {
        let request = HttpRequest::post_multipart(self.url("poll/list"))
            .field("option_id", option_id.to_string())
            .field("page", page.to_string())
            .field("group_name", self.config.group.clone());
        let data: BallotListData = self.call(request).await?;
        Ok(data
            .list
            .into_iter()
            .map(|b| {
                let user_id = value_as_u64(&b.user_id).filter(|id| *id != 0);
                let weight = value_as_f64(&b.weight).unwrap_or_else(|| {
                    warn!(option_id, ?user_id, weight = %b.weight, "unreadable ballot weight, using 0");
                    0.0
                });
                VoterBallot {
                    user_id,
                    nickname: b.name.unwrap_or_else(|| "N/A".into()),
                    reported_weight: ReportedWeight::new(weight),
                    vote_timestamp: value_as_text(&b.last_time),
                }
            })
            .collect())
    }

    /// Every ballot for an option. The listing ends on the first empty page.
    pub async fn all_ballots(&self, option_id: u64) -> Result<Vec<VoterBallot>, ForumError> {
        let mut ballots = Vec::new();
        for page in 1..=MAX_BALLOT_PAGES {
            let batch = self.ballots_page(option_id, page).await?;
            debug!(option_id, page, count = batch.len(), "fetched ballot page");
            if batch.is_empty() {
                return Ok(ballots);
            }
            ballots.extend(batch);
        }
        Err(ForumError::Malformed(format!(
            "ballot listing for option {option_id} exceeded {MAX_BALLOT_PAGES} pages"
        )))
    }

    /// Raw address bindings on a user's profile, in profile order.
    ///
    /// Neuron addresses come first, then the web3 key if one is set.
    pub async fn profile_bindings(&self, user_id: u64) -> Result<Vec<AddressBinding>, ForumError> {
        let url = self.url(&format!("profile/{user_id}/{}", self.config.group));
        let data: ProfileData = self.call(HttpRequest::get(url)).await?;

        let mut bindings: Vec<AddressBinding> = data
            .user
            .neuron_addresses
            .unwrap_or_default()
            .iter()
            .map(|v| AddressBinding::Native(value_as_text(v)))
            .collect();
        if let Some(key) = data.user.web3_public_key.filter(|k| !k.trim().is_empty()) {
            bindings.push(AddressBinding::Derived(key));
        }
        Ok(bindings)
    }
}
