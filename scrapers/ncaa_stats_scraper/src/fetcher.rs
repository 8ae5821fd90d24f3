use reqwest::{blocking::Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    config::ScrapingConfig,
    error::FetchError,
    pacing::{Pause, ThreadSleep},
};

/// Raw page as returned by the server, whatever its status.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

impl<F: PageFetcher + ?Sized> PageFetcher for &F {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        (**self).fetch(url)
    }
}

/// How a retried operation gave up.
#[derive(Debug)]
pub(crate) enum RetryFailure<E> {
    /// Every attempt failed with a transient error; holds the last one.
    Exhausted { attempts: u32, last: E },
    /// A non-transient error ended the loop early.
    Fatal(E),
}

/// Runs `operation` up to `max_attempts` times, pausing `delay` after each
/// transient failure except the last.
pub(crate) fn retry_with_backoff<T, E, F>(
    max_attempts: u32,
    delay: Duration,
    pause: &impl Pause,
    is_transient: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut(u32) -> Result<T, E>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if !is_transient(&e) => return Err(RetryFailure::Fatal(e)),
            Err(e) => {
                if attempt >= max_attempts {
                    return Err(RetryFailure::Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }
                pause.pause(delay);
                attempt += 1;
            }
        }
    }
}

/// True when the request died before any response arrived: refused or
/// timed-out connects, and sockets reset or closed by the server before it
/// answered. Read timeouts on a live connection are not included.
fn is_connection_failure(e: &reqwest::Error) -> bool {
    e.is_connect() || (e.is_request() && e.status().is_none() && !e.is_timeout())
}

pub struct HttpFetcher<P: Pause = ThreadSleep> {
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
    pause: P,
}

impl HttpFetcher<ThreadSleep> {
    pub fn new(config: &ScrapingConfig) -> Result<Self, FetchError> {
        Self::with_pause(config, ThreadSleep)
    }
}

impl<P: Pause> HttpFetcher<P> {
    pub fn with_pause(config: &ScrapingConfig, pause: P) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            max_attempts: config.max_attempts,
            retry_delay: config.retry_delay(),
            pause,
        })
    }
}

impl<P: Pause> PageFetcher for HttpFetcher<P> {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = retry_with_backoff(
            self.max_attempts,
            self.retry_delay,
            &self.pause,
            is_connection_failure,
            |attempt| {
                debug!("Fetching {} (attempt {})", url, attempt);
                self.client.get(url).send().map_err(|e| {
                    if is_connection_failure(&e) {
                        warn!(
                            "Connection to {} failed (attempt {}/{}). Retrying in {:?}...",
                            url, attempt, self.max_attempts, self.retry_delay
                        );
                    }
                    e
                })
            },
        )
        .map_err(|failure| match failure {
            RetryFailure::Exhausted { attempts, last } => FetchError::ConnectionExhausted {
                url: url.to_string(),
                attempts,
                source: last,
            },
            RetryFailure::Fatal(source) => FetchError::Request {
                url: url.to_string(),
                source,
            },
        })?;

        let status = response.status();
        let body = response.text().map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        debug!("Got {} from {} ({} bytes)", status, url, body.len());

        Ok(FetchedPage {
            url: url.to_string(),
            status,
            body,
        })
    }
}
