//! Degree rules checked when the user starts dragging a connection.
//!
//! Rules are evaluated in registration order and the first violation wins.
//! Limits come from the node type registry; a tag the registry does not know
//! carries no limits.

use std::fmt;

use serde::Serialize;

use crate::config::Locale;

use super::registry;
use super::types::{ConnectionAttempt, Degree, GraphNode, NodeKind};

/// Which end of the attempted connection broke a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

/// Why a connection attempt was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub side: Side,
    pub kind: NodeKind,
    pub node_id: String,
    pub limit: usize,
}

impl Rejection {
    pub fn message(&self, locale: Locale) -> String {
        let title = self.kind.descriptor().title;
        match (self.side, locale) {
            (Side::Source, Locale::Vi) => {
                format!("{} chỉ được {} outgoing connection", title, self.limit)
            }
            (Side::Target, Locale::Vi) => {
                format!("{} chỉ nhận {} incoming connection", title, self.limit)
            }
            (Side::Source, Locale::En) => {
                format!("{} only allows {} outgoing connection", title, self.limit)
            }
            (Side::Target, Locale::En) => {
                format!("{} only accepts {} incoming connection", title, self.limit)
            }
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message(Locale::En))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(Rejection),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Verdict::Accept => None,
            Verdict::Reject(rejection) => Some(rejection),
        }
    }
}

/// One check in the validation pipeline
pub trait ConnectionRule {
    fn name(&self) -> &'static str;

    fn evaluate(&self, attempt: &ConnectionAttempt<'_>) -> Option<Rejection>;
}

/// Source may not exceed its declared outgoing degree
pub struct SourceOutgoingLimit;

impl ConnectionRule for SourceOutgoingLimit {
    fn name(&self) -> &'static str {
        "source-outgoing-limit"
    }

    fn evaluate(&self, attempt: &ConnectionAttempt<'_>) -> Option<Rejection> {
        let source = attempt.source?;
        let descriptor = registry::lookup(&source.type_tag)?;
        exhausted(descriptor.max_outgoing, source.outgoing_count()).map(|limit| Rejection {
            side: Side::Source,
            kind: descriptor.kind,
            node_id: source.id.clone(),
            limit,
        })
    }
}

/// Target may not exceed its declared incoming degree
pub struct TargetIncomingLimit;

impl ConnectionRule for TargetIncomingLimit {
    fn name(&self) -> &'static str {
        "target-incoming-limit"
    }

    fn evaluate(&self, attempt: &ConnectionAttempt<'_>) -> Option<Rejection> {
        let target = attempt.target?;
        let descriptor = registry::lookup(&target.type_tag)?;
        exhausted(descriptor.max_incoming, target.incoming_count()).map(|limit| Rejection {
            side: Side::Target,
            kind: descriptor.kind,
            node_id: target.id.clone(),
            limit,
        })
    }
}

fn exhausted(degree: Degree, current: usize) -> Option<usize> {
    match degree {
        Degree::Bounded(max) if degree.is_exhausted(current) => Some(max),
        _ => None,
    }
}

/// Ordered rule pipeline
pub struct ConnectionValidator {
    rules: Vec<Box<dyn ConnectionRule>>,
}

impl Default for ConnectionValidator {
    fn default() -> Self {
        Self::new()
            .with_rule(SourceOutgoingLimit)
            .with_rule(TargetIncomingLimit)
    }
}

impl ConnectionValidator {
    /// An empty pipeline that accepts everything.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: impl ConnectionRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn validate(&self, attempt: &ConnectionAttempt<'_>) -> Verdict {
        trace_inputs(attempt);

        for rule in &self.rules {
            if let Some(rejection) = rule.evaluate(attempt) {
                log::info!(
                    "Connection rejected by {} on {}: {}",
                    rule.name(),
                    rejection.node_id,
                    rejection
                );
                return Verdict::Reject(rejection);
            }
        }

        Verdict::Accept
    }
}

fn trace_inputs(attempt: &ConnectionAttempt<'_>) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let describe = |node: Option<&GraphNode>| match node {
        Some(n) => format!(
            "{} ({}, in={}, out={})",
            n.id,
            n.type_tag,
            n.incoming_count(),
            n.outgoing_count()
        ),
        None => "<none>".to_string(),
    };
    log::debug!(
        "Validating connection {} -> {}",
        describe(attempt.source),
        describe(attempt.target)
    );
}
