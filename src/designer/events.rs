//! Priority-ordered interceptor chain for the `connect.start` gesture.

use super::rules::{ConnectionValidator, Rejection, Verdict};
use super::types::ConnectionAttempt;

/// Priority used by the engine's own handlers
pub const DEFAULT_PRIORITY: i32 = 1000;

/// Connection rules run ahead of the engine defaults
pub const CONNECT_RULES_PRIORITY: i32 = 1500;

/// The `connect.start` event as seen by interceptors
#[derive(Debug)]
pub struct ConnectStartEvent<'a> {
    pub context: ConnectionAttempt<'a>,
    propagation_stopped: bool,
    default_prevented: bool,
    rejection: Option<Rejection>,
}

impl<'a> ConnectStartEvent<'a> {
    pub fn new(context: ConnectionAttempt<'a>) -> Self {
        Self {
            context,
            propagation_stopped: false,
            default_prevented: false,
            rejection: None,
        }
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Veto the gesture: both signals are raised together.
    pub fn reject(&mut self, rejection: Rejection) {
        self.stop_propagation();
        self.prevent_default();
        self.rejection = Some(rejection);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }
}

/// A handler subscribed to `connect.start`
pub trait ConnectInterceptor {
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    fn on_connect_start(&self, event: &mut ConnectStartEvent<'_>);
}

/// Runs the connection validator and vetoes on the first violation
pub struct ConnectRulesInterceptor {
    validator: ConnectionValidator,
}

impl ConnectRulesInterceptor {
    pub fn new(validator: ConnectionValidator) -> Self {
        Self { validator }
    }
}

impl Default for ConnectRulesInterceptor {
    fn default() -> Self {
        Self::new(ConnectionValidator::default())
    }
}

impl ConnectInterceptor for ConnectRulesInterceptor {
    fn priority(&self) -> i32 {
        CONNECT_RULES_PRIORITY
    }

    fn on_connect_start(&self, event: &mut ConnectStartEvent<'_>) {
        if let Verdict::Reject(rejection) = self.validator.validate(&event.context) {
            event.reject(rejection);
        }
    }
}

/// Outcome of dispatching one gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub verdict: Verdict,
    /// Set whenever a handler vetoed the engine default, with or without a
    /// rejection attached.
    pub default_prevented: bool,
    pub handlers_run: usize,
}

impl DispatchOutcome {
    /// True when the engine may go on and create the edge.
    pub fn allows_default(&self) -> bool {
        self.verdict.is_accept() && !self.default_prevented
    }
}

/// Interceptors sorted by descending priority; equal priorities keep
/// registration order.
#[derive(Default)]
pub struct ConnectPipeline {
    interceptors: Vec<Box<dyn ConnectInterceptor>>,
}

impl ConnectPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline with the standard connection rules installed.
    pub fn with_connect_rules() -> Self {
        let mut pipeline = Self::new();
        pipeline.register(ConnectRulesInterceptor::default());
        pipeline
    }

    pub fn register(&mut self, interceptor: impl ConnectInterceptor + 'static) {
        let priority = interceptor.priority();
        let index = self
            .interceptors
            .iter()
            .position(|existing| existing.priority() < priority)
            .unwrap_or(self.interceptors.len());
        self.interceptors.insert(index, Box::new(interceptor));
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn dispatch(&self, attempt: ConnectionAttempt<'_>) -> DispatchOutcome {
        let mut event = ConnectStartEvent::new(attempt);
        let mut handlers_run = 0;

        for interceptor in &self.interceptors {
            interceptor.on_connect_start(&mut event);
            handlers_run += 1;
            if event.is_propagation_stopped() {
                break;
            }
        }

        let default_prevented = event.is_default_prevented();
        let verdict = match event.rejection {
            Some(rejection) => Verdict::Reject(rejection),
            None => Verdict::Accept,
        };
        DispatchOutcome {
            verdict,
            default_prevented,
            handlers_run,
        }
    }
}
