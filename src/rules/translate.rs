//! Rule → Route translation.

use std::time::Duration;

use crate::handlers::{BadGateway, ReverseProxyHandler, StaticFileHandler, UpstreamClient};
use crate::routing::{HostMatcher, Route};
use crate::rules::parser::{Action, Rule};

/// Turns parsed rules into routes. Translation never fails.
#[derive(Debug, Clone)]
pub struct Translator {
    client: UpstreamClient,
    upstream_timeout: Duration,
}

impl Translator {
    /// `client` is shared by every proxy route this translator builds.
    pub fn new(client: UpstreamClient, upstream_timeout: Duration) -> Self {
        Self {
            client,
            upstream_timeout,
        }
    }

    /// Build the route for one rule.
    ///
    /// A forward rule whose target is not a usable URL becomes a 502 route
    /// for its host instead of failing the whole table.
    pub fn translate(&self, rule: &Rule) -> Route {
        let matcher = HostMatcher::new(&rule.host);
        match rule.action {
            Action::Serve => Route::new(matcher, StaticFileHandler::new(&rule.target)),
            Action::Forward => match ReverseProxyHandler::new(
                &rule.target,
                self.client.clone(),
                self.upstream_timeout,
            ) {
                Ok(proxy) => Route::new(matcher, proxy),
                Err(e) => {
                    tracing::warn!(
                        host = %rule.host,
                        target = %rule.target,
                        error = %e,
                        "Unusable forward target, route will answer 502"
                    );
                    Route::new(matcher, BadGateway)
                }
            },
        }
    }

    /// Translate every rule, preserving order.
    pub fn translate_all(&self, rules: &[Rule]) -> Vec<Route> {
        rules.iter().map(|rule| self.translate(rule)).collect()
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(UpstreamClient::default(), Duration::from_secs(30))
    }
}
