//! Request classifier and bucket router.
//!
//! # Responsibilities
//! - Resolve the visitor identity from the request
//! - Assemble the decision context
//! - Ask the decision gateway for bucket and gate
//! - Produce a redirect or rewrite outcome
//!
//! # Design Decisions
//! - Holds only immutable, shared state; safe across concurrent requests
//! - Never errors: every request gets a routable outcome
//! - Flushing is the caller's job, after the outcome is known

use std::sync::Arc;

use axum::http::request::Parts;

use crate::config::AppConfig;
use crate::decision::{DecisionContext, DecisionGateway};
use crate::identity::{self, IdentityCookie};
use crate::observability::metrics;
use crate::routing::outcome::{decide, RoutingOutcome};
use crate::routing::signals::RequestSignals;

pub struct BucketRouter {
    gateway: Arc<DecisionGateway>,
    config: Arc<AppConfig>,
    cookie: IdentityCookie,
}

impl BucketRouter {
    pub fn new(gateway: Arc<DecisionGateway>, config: Arc<AppConfig>) -> Self {
        let cookie = IdentityCookie::new(config.identity.cookie_name.clone(), config.identity.max_age_secs);
        Self { gateway, config, cookie }
    }

    pub fn cookie(&self) -> &IdentityCookie {
        &self.cookie
    }

    pub fn gateway(&self) -> &Arc<DecisionGateway> {
        &self.gateway
    }

    /// Decide where this request goes.
    pub async fn route(&self, parts: &Parts) -> RoutingOutcome {
        let signals = RequestSignals::from_headers(&parts.headers, &self.config.geo, self.cookie.name());
        let identity = identity::resolve(signals.identity_cookie.as_deref());

        let context = DecisionContext::new(
            &identity.id,
            signals.country,
            signals.ip,
            self.config.deployment.tier,
        );

        let assignment = self.gateway.assign(&context, &self.config.experiment).await;
        let minted = identity.minted;
        let outcome = decide(&parts.uri, &assignment, identity, &self.config.experiment.fallback_bucket);

        metrics::record_routing(outcome.action.label(), minted);
        tracing::debug!(
            user_id = %context.user_id,
            country = %context.country,
            bucket = %outcome.bucket,
            gate = assignment.gate,
            degraded = assignment.degraded,
            minted,
            action = outcome.action.label(),
            "Routed visitor"
        );

        outcome
    }
}
