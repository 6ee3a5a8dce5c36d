use crate::error::AppError;
use serde_json::Value;
use std::thread;
use std::time::Duration;

const USER_AGENT: &str = "dalton_rankings/0.1.0";

/// Pacing and retry settings for every call to the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Waited before every attempt, successful or not.
    pub request_delay: Duration,
    /// Backoff after a 429 is `backoff_base * 2^attempt`.
    pub backoff_base: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt)
    }
}

/// What came back from one HTTP attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpReply {
    Body(String),
    Status(u16),
}

pub trait HttpTransport {
    fn get(&self, url: &str) -> Result<HttpReply, AppError>;
}

/// Blocking transport backed by a `ureq` agent, carrying the bearer token
/// obtained at login.
pub struct UreqTransport {
    agent: ureq::Agent,
    bearer: Option<String>,
}

impl UreqTransport {
    pub fn new() -> Self {
        UreqTransport {
            agent: ureq::AgentBuilder::new()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(30))
                .build(),
            bearer: None,
        }
    }

    pub fn agent(&self) -> &ureq::Agent {
        &self.agent
    }

    pub fn set_bearer(&mut self, token: String) {
        self.bearer = Some(token);
    }
}

impl HttpTransport for UreqTransport {
    fn get(&self, url: &str) -> Result<HttpReply, AppError> {
        let mut request = self.agent.get(url);
        if let Some(token) = &self.bearer {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }

        match request.call() {
            Ok(resp) => resp
                .into_string()
                .map(HttpReply::Body)
                .map_err(|e| AppError::HttpError(e.to_string())),
            Err(ureq::Error::Status(code, _)) => Ok(HttpReply::Status(code)),
            Err(e) => Err(AppError::HttpError(e.to_string())),
        }
    }
}

/// Issues paced GET requests against `base_url`, backing off exponentially
/// on HTTP 429. Strictly sequential: one request in flight at a time.
pub struct RequestExecutor<T: HttpTransport> {
    transport: T,
    base_url: String,
    policy: RetryPolicy,
    sleep: Box<dyn Fn(Duration)>,
}

impl<T: HttpTransport> RequestExecutor<T> {
    pub fn new(transport: T, base_url: &str, policy: RetryPolicy) -> Self {
        RequestExecutor {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
            sleep: Box::new(thread::sleep),
        }
    }

    #[cfg(test)]
    fn with_sleep(mut self, sleep: impl Fn(Duration) + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn execute(&self, endpoint: &str) -> Result<Value, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));

        for attempt in 0..self.policy.max_attempts {
            (self.sleep)(self.policy.request_delay);

            match self.transport.get(&url)? {
                HttpReply::Body(body) => {
                    return serde_json::from_str(&body)
                        .map_err(|e| AppError::JsonError(format!("{}: {}", endpoint, e)));
                }
                HttpReply::Status(429) => {
                    if attempt + 1 == self.policy.max_attempts {
                        break;
                    }
                    let wait = self.policy.backoff_for(attempt);
                    log::warn!("Rate limited on {}, waiting {:?}", endpoint, wait);
                    (self.sleep)(wait);
                }
                HttpReply::Status(status) => {
                    return Err(AppError::HttpStatus {
                        status,
                        endpoint: endpoint.to_string(),
                    });
                }
            }
        }

        log::warn!(
            "Giving up on {} after {} attempts",
            endpoint,
            self.policy.max_attempts
        );
        Err(AppError::RateLimited {
            attempts: self.policy.max_attempts,
        })
    }
}
