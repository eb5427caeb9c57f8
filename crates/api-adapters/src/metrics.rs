//! Prometheus counters exposed at `GET /metrics`.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

use domains::{ArticleStatus, EdgeKind, ToggleOutcome};

pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ToggleLabels {
    edge: String,
    action: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct DecisionLabels {
    status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct StatusLabels {
    status: String,
}

#[derive(Debug)]
pub struct Metrics {
    registry: Registry,
    toggles: Family<ToggleLabels, Counter>,
    decisions: Family<DecisionLabels, Counter>,
    http_errors: Family<StatusLabels, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let toggles = Family::<ToggleLabels, Counter>::default();
        let decisions = Family::<DecisionLabels, Counter>::default();
        let http_errors = Family::<StatusLabels, Counter>::default();

        registry.register(
            "pressroom_toggles",
            "Clap and follow toggles by outcome",
            toggles.clone(),
        );
        registry.register(
            "pressroom_moderation_decisions",
            "Article status changes applied by staff",
            decisions.clone(),
        );
        registry.register(
            "pressroom_http_errors",
            "HTTP responses with a 4xx or 5xx status",
            http_errors.clone(),
        );

        Self {
            registry,
            toggles,
            decisions,
            http_errors,
        }
    }

    pub fn record_toggle(&self, edge: EdgeKind, action: ToggleOutcome) {
        self.toggles
            .get_or_create(&ToggleLabels {
                edge: edge.as_str().to_string(),
                action: action.as_str().to_string(),
            })
            .inc();
    }

    pub fn record_decision(&self, status: ArticleStatus) {
        self.decisions
            .get_or_create(&DecisionLabels {
                status: status.as_str().to_string(),
            })
            .inc();
    }

    pub fn record_http_error(&self, status: u16) {
        self.http_errors
            .get_or_create(&StatusLabels {
                status: status.to_string(),
            })
            .inc();
    }

    /// OpenMetrics text exposition of every registered family.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
