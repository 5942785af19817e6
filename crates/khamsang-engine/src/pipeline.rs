//! Instruction → intent → target → one capability call.

use crate::backend::Backend;
use crate::config::KhamsangConfig;
use crate::dispatcher::Dispatcher;
use crate::evidence::{EvidenceCollector, Frame, TemplateLibrary};
use crate::resolution::resolve_in_frame;
use khamsang_common::protocol::{ActionOutcome, ErrorKind, Instruction, Intent, ResolvedTarget};
use khamsang_parser::{Analysis, Dictionary, IntentExtractor, Lexicon, LexiconError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{info, warn};

pub struct Pipeline {
    lexicon: Lexicon,
    dictionary: Dictionary,
    collector: Box<dyn EvidenceCollector>,
    templates: TemplateLibrary,
    dispatcher: Dispatcher,
    timeout: Duration,
}

impl Pipeline {
    /// Pipeline with the embedded lexicon and dictionary and the default
    /// configuration.
    pub fn new(collector: impl EvidenceCollector + 'static) -> Self {
        let config = KhamsangConfig::default();
        Self {
            lexicon: Lexicon::default_ref().clone(),
            dictionary: Dictionary::default_ref().clone(),
            collector: Box::new(collector),
            templates: TemplateLibrary::default(),
            dispatcher: Dispatcher::from_config(&config),
            timeout: config.dispatch.timeout(),
        }
    }

    pub fn from_config(
        config: &KhamsangConfig,
        collector: Box<dyn EvidenceCollector>,
    ) -> Result<Self, LexiconError> {
        Ok(Self {
            lexicon: config.build_lexicon()?,
            dictionary: config.build_dictionary(),
            collector,
            templates: TemplateLibrary::default(),
            dispatcher: Dispatcher::from_config(config),
            timeout: config.dispatch.timeout(),
        })
    }

    pub fn with_templates(mut self, templates: TemplateLibrary) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn extractor(&self) -> IntentExtractor<'_> {
        IntentExtractor::new(&self.lexicon, &self.dictionary)
    }

    pub fn parse(&self, instruction: &Instruction) -> Intent {
        self.extractor().parse(instruction)
    }

    pub fn analyze(&self, instruction: &Instruction) -> Analysis {
        self.extractor().analyze(instruction)
    }

    /// Process one instruction against an already captured frame.
    ///
    /// Evidence is collected only when the action needs a target. The whole
    /// resolve-then-dispatch step is bounded by the pipeline timeout; on
    /// expiry pending retries are dropped and the attempts made so far are
    /// reported.
    pub async fn process_instruction<B: Backend + ?Sized>(
        &self,
        instruction: &Instruction,
        frame: &Frame,
        backend: &mut B,
    ) -> ActionOutcome {
        let intent = self.parse(instruction);
        self.process_intent(&intent, Some(frame), backend).await
    }

    /// Parse, capture a screenshot when the action needs a target, then
    /// process. This is the interactive path; the capture counts against the
    /// same timeout as the rest of the instruction.
    pub async fn run_instruction<B: Backend + ?Sized>(
        &self,
        instruction: &Instruction,
        backend: &mut B,
    ) -> ActionOutcome {
        let intent = self.parse(instruction);
        self.process_intent(&intent, None, backend).await
    }

    async fn process_intent<B: Backend + ?Sized>(
        &self,
        intent: &Intent,
        frame: Option<&Frame>,
        backend: &mut B,
    ) -> ActionOutcome {
        info!(
            action = ?intent.action,
            category = ?intent.target_category,
            description = %intent.target_description,
            confidence = intent.confidence,
            "parsed instruction"
        );

        let attempts = AtomicU32::new(0);
        let work = self.capture_and_dispatch(intent, frame, backend, &attempts);
        match tokio::time::timeout(self.timeout, work).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let attempts = attempts.load(Ordering::SeqCst);
                warn!(attempts, timeout_ms = self.timeout.as_millis() as u64, "instruction timed out");
                ActionOutcome::failure(ErrorKind::Timeout, attempts).with_detail(format!(
                    "gave up after {} ms",
                    self.timeout.as_millis()
                ))
            }
        }
    }

    /// Use `frame` when given, otherwise capture one if the intent needs a
    /// target.
    async fn capture_and_dispatch<B: Backend + ?Sized>(
        &self,
        intent: &Intent,
        frame: Option<&Frame>,
        backend: &mut B,
        attempts: &AtomicU32,
    ) -> ActionOutcome {
        let captured;
        let frame = match frame {
            Some(frame) => frame,
            None if intent.requires_target() => match backend.screenshot().await {
                Ok(bytes) => {
                    captured = Frame::new(bytes);
                    &captured
                }
                Err(e) => {
                    warn!(error = %e, "could not capture frame");
                    let kind = if e.is_transient() {
                        ErrorKind::CapabilityTransientFailure
                    } else {
                        ErrorKind::CapabilityFatalFailure
                    };
                    return ActionOutcome::failure(kind, 0)
                        .with_detail(format!("screen capture failed: {}", e));
                }
            },
            None => {
                captured = Frame::new(Vec::new());
                &captured
            }
        };
        self.resolve_and_dispatch(intent, frame, backend, attempts).await
    }

    async fn resolve_and_dispatch<B: Backend + ?Sized>(
        &self,
        intent: &Intent,
        frame: &Frame,
        backend: &mut B,
        attempts: &AtomicU32,
    ) -> ActionOutcome {
        let target = if intent.requires_target() {
            match frame.collect(self.collector.as_ref(), &self.templates).await {
                Ok(evidence) => resolve_in_frame(&intent.target_description, &evidence, frame),
                Err(e) => {
                    warn!(error = %e, "evidence collection failed");
                    ResolvedTarget::not_found()
                }
            }
        } else {
            ResolvedTarget::not_found()
        };

        self.dispatcher
            .dispatch_counted(backend, intent, &target, attempts)
            .await
    }
}
