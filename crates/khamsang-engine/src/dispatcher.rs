//! Turns a parsed intent and its resolved target into exactly one capability
//! call, retried on transient failures.

use crate::backend::{Backend, CapabilityError};
use crate::config::KhamsangConfig;
use khamsang_common::protocol::{ActionId, ActionOutcome, ErrorKind, Intent, Point, ResolvedTarget};
use khamsang_parser::normalize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one, transient failures only.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay: Duration::from_millis(250),
        }
    }
}

/// A single capability invocation.
#[derive(Debug, Clone, PartialEq)]
enum Call {
    Navigate(String),
    Click(Point),
    Type(Point, String),
    Scroll(Point),
    Screenshot,
}

impl Call {
    fn name(&self) -> &'static str {
        match self {
            Call::Navigate(_) => "navigate",
            Call::Click(_) => "click_at",
            Call::Type(..) => "type_at",
            Call::Scroll(_) => "scroll_to",
            Call::Screenshot => "screenshot",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    policy: RetryPolicy,
    sites: HashMap<String, String>,
}

impl Dispatcher {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sites: HashMap::new(),
        }
    }

    pub fn from_config(config: &KhamsangConfig) -> Self {
        let policy = RetryPolicy {
            max_retries: config.dispatch.max_retries,
            retry_delay: config.dispatch.retry_delay(),
        };
        Self::new(policy).with_sites(config.sites.iter())
    }

    /// Register site aliases. Aliases are matched on normalized text.
    pub fn with_sites<I, K, V>(mut self, sites: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (alias, url) in sites {
            self.sites
                .insert(normalize(alias.as_ref()), url.as_ref().to_string());
        }
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn dispatch<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        intent: &Intent,
        target: &ResolvedTarget,
    ) -> ActionOutcome {
        let attempts = AtomicU32::new(0);
        self.dispatch_counted(backend, intent, target, &attempts).await
    }

    /// Dispatch while publishing the attempt count to `attempts`, so a caller
    /// that abandons the future can still report how many calls were made.
    pub async fn dispatch_counted<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        intent: &Intent,
        target: &ResolvedTarget,
        attempts: &AtomicU32,
    ) -> ActionOutcome {
        let call = match self.plan(intent, target) {
            Ok(call) => call,
            Err(outcome) => return outcome,
        };
        self.invoke_with_retry(backend, &call, attempts).await
    }

    fn plan(&self, intent: &Intent, target: &ResolvedTarget) -> Result<Call, ActionOutcome> {
        let Some(action) = intent.action else {
            return Err(ActionOutcome::failure(ErrorKind::NoActionRecognized, 0)
                .with_detail("no action phrase recognized"));
        };

        let point = if action.requires_target() {
            match target.coordinate.filter(|_| target.is_resolved()) {
                Some(point) => Some(point),
                None => {
                    return Err(ActionOutcome::failure(ErrorKind::TargetNotFound, 0).with_detail(
                        format!("no on-screen match for '{}'", intent.target_description),
                    ));
                }
            }
        } else {
            None
        };

        match (action, point) {
            (ActionId::Open | ActionId::Navigate, _) => {
                match self.url_for(&intent.target_description) {
                    Some(url) => Ok(Call::Navigate(url)),
                    None => Err(ActionOutcome::failure(ErrorKind::TargetNotFound, 0).with_detail(
                        format!("no site or URL in '{}'", intent.target_description),
                    )),
                }
            }
            (ActionId::Screenshot, _) => Ok(Call::Screenshot),
            (ActionId::Click, Some(point)) => Ok(Call::Click(point)),
            (ActionId::Scroll, Some(point)) => Ok(Call::Scroll(point)),
            (ActionId::Type, Some(point)) => match intent.payload.as_deref() {
                Some(text) if !text.is_empty() => Ok(Call::Type(point, text.to_string())),
                _ => Err(ActionOutcome::failure(ErrorKind::CapabilityFatalFailure, 0)
                    .with_detail("nothing to type")),
            },
            (ActionId::Click | ActionId::Scroll | ActionId::Type, None) => {
                Err(ActionOutcome::failure(ErrorKind::TargetNotFound, 0))
            }
        }
    }

    /// URL for an `open`/`navigate` description: a URL or domain as written,
    /// a configured site alias, or a single bare word as `www.<word>.com`.
    pub fn url_for(&self, description: &str) -> Option<String> {
        let description = description.trim();
        if description.is_empty() {
            return None;
        }
        if let Some(url) = self.sites.get(&normalize(description)) {
            return Some(url.clone());
        }
        if description.contains(char::is_whitespace) {
            return None;
        }

        if description.contains("://") || description.contains('.') {
            let candidate = if description.contains("://") {
                description.to_string()
            } else {
                format!("https://{}", description)
            };
            return is_web_url(&candidate).then_some(candidate);
        }

        let bare_word = description
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if bare_word {
            let candidate = format!("https://www.{}.com", description.to_ascii_lowercase());
            return is_web_url(&candidate).then_some(candidate);
        }
        None
    }

    async fn invoke_with_retry<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        call: &Call,
        attempts: &AtomicU32,
    ) -> ActionOutcome {
        loop {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            info!(call = call.name(), attempt, "dispatching");

            match invoke(backend, call).await {
                Ok(screenshot) => {
                    let outcome = ActionOutcome::success(attempt).with_detail(describe(call));
                    return match screenshot {
                        Some(bytes) => outcome.with_screenshot(bytes),
                        None => outcome,
                    };
                }
                Err(e) if e.is_transient() && attempt <= self.policy.max_retries => {
                    debug!(call = call.name(), attempt, error = %e, "transient failure, retrying");
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                Err(e) if e.is_transient() => {
                    warn!(call = call.name(), attempts = attempt, error = %e, "retries exhausted");
                    return ActionOutcome::failure(ErrorKind::CapabilityTransientFailure, attempt)
                        .with_detail(failure_detail(&e));
                }
                Err(e) => {
                    warn!(call = call.name(), attempt, error = %e, "fatal capability failure");
                    return ActionOutcome::failure(ErrorKind::CapabilityFatalFailure, attempt)
                        .with_detail(failure_detail(&e));
                }
            }
        }
    }
}

async fn invoke<B: Backend + ?Sized>(
    backend: &mut B,
    call: &Call,
) -> Result<Option<Vec<u8>>, CapabilityError> {
    match call {
        Call::Navigate(url) => backend.navigate(url).await.map(|_| None),
        Call::Click(point) => backend.click_at(*point).await.map(|_| None),
        Call::Type(point, text) => backend.type_at(*point, text).await.map(|_| None),
        Call::Scroll(point) => backend.scroll_to(*point).await.map(|_| None),
        Call::Screenshot => backend.screenshot().await.map(Some),
    }
}

fn describe(call: &Call) -> String {
    match call {
        Call::Navigate(url) => format!("navigated to {}", url),
        Call::Click(p) => format!("clicked at ({:.0}, {:.0})", p.x, p.y),
        Call::Type(p, text) => format!("typed '{}' at ({:.0}, {:.0})", text, p.x, p.y),
        Call::Scroll(p) => format!("scrolled to ({:.0}, {:.0})", p.x, p.y),
        Call::Screenshot => "captured screenshot".to_string(),
    }
}

fn failure_detail(error: &CapabilityError) -> String {
    format!("{} [{}] {}", error, error.code(), error.recovery_hint())
}

fn is_web_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> Dispatcher {
        Dispatcher::from_config(&KhamsangConfig::default())
    }

    #[test]
    fn test_url_for_alias() {
        let d = dispatcher();
        assert_eq!(d.url_for("google").as_deref(), Some("https://www.google.com"));
        assert_eq!(d.url_for("ยูทูบ").as_deref(), Some("https://www.youtube.com"));
    }

    #[test]
    fn test_url_for_domain_and_url() {
        let d = dispatcher();
        assert_eq!(d.url_for("example.com").as_deref(), Some("https://example.com"));
        assert_eq!(
            d.url_for("http://localhost:8080/x").as_deref(),
            Some("http://localhost:8080/x")
        );
        assert_eq!(d.url_for("ftp://example.com"), None);
    }

    #[test]
    fn test_url_for_bare_word() {
        assert_eq!(
            dispatcher().url_for("github").as_deref(),
            Some("https://www.github.com")
        );
    }

    #[test]
    fn test_url_for_rejects_phrases() {
        let d = dispatcher();
        assert_eq!(d.url_for(""), None);
        assert_eq!(d.url_for("the news page"), None);
        assert_eq!(d.url_for("หน้าแรก"), None);
    }

    #[test]
    fn test_default_policy() {
        let policy = dispatcher().policy();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.retry_delay, Duration::from_millis(250));
    }
}
