use super::classify::ResponseClassifier;
use super::engine::AiEngine;
use super::prompt::compose_prompt;
use super::report::{PatientSummary, TriageReport};
use super::validation::validate_request;
use super::TriageError;
use crate::config::TriageConfig;
use crate::models::{AnalysisRequest, ResponseLanguage};

/// Analyze pipeline orchestrator.
///
/// Coordinates: validate → compose → engine call → classify → report.
/// Holds no per-request state; one instance serves every request of a session.
pub struct TriagePipeline<'a, E: AiEngine + ?Sized> {
    engine: &'a E,
    classifier: ResponseClassifier,
    /// Used by callers that do not pick a response language themselves.
    language: ResponseLanguage,
}

impl<'a, E: AiEngine + ?Sized> TriagePipeline<'a, E> {
    pub fn new(engine: &'a E, classifier: ResponseClassifier) -> Self {
        Self {
            engine,
            classifier,
            language: ResponseLanguage::default(),
        }
    }

    pub fn from_config(engine: &'a E, config: &TriageConfig) -> Self {
        Self::new(engine, ResponseClassifier::from_config(config))
            .with_language(config.response_language)
    }

    pub fn with_language(mut self, language: ResponseLanguage) -> Self {
        self.language = language;
        self
    }

    pub fn language(&self) -> ResponseLanguage {
        self.language
    }

    pub fn classifier(&self) -> &ResponseClassifier {
        &self.classifier
    }

    /// Run one analysis. Validation failures return before the engine is
    /// touched; engine failures are returned typed, never retried.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<TriageReport, TriageError> {
        // Step 1: Validate profile + request
        let validated = validate_request(request).map_err(|e| {
            tracing::debug!(field = e.field(), "Analysis request rejected");
            e
        })?;

        // Step 2: Compose prompt
        let prompt = compose_prompt(&validated);
        let image = validated.image();

        // Step 3: Engine call
        let response_text = self.engine.send(&prompt, image).map_err(|e| {
            tracing::warn!(kind = ?e.kind(), "AI engine call failed");
            e
        })?;

        // Step 4: Classify
        let result = self.classifier.classify(&response_text);

        let report = TriageReport::new(
            PatientSummary::from(&validated.profile),
            validated.language(),
            image.is_some(),
            result,
        );

        tracing::info!(
            report_id = %report.id,
            status = %report.result.status,
            flag_count = report.result.emergency_flags.len(),
            has_image = report.had_image,
            "Triage analysis complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::models::{Gender, ImageBlob, PatientContext, PatientProfile, TriageStatus};
    use crate::pipeline::engine::{DemoEngine, EngineError};
    use crate::pipeline::prompt::PromptText;
    use crate::pipeline::ValidationError;

    /// Mock engine returning a canned reply and recording every call.
    pub(crate) struct MockEngine {
        reply: Result<String, EngineError>,
        pub calls: Cell<usize>,
        pub last_prompt: RefCell<Option<String>>,
        pub last_image: RefCell<Option<Vec<u8>>>,
    }

    impl MockEngine {
        pub(crate) fn replying(text: &str) -> Self {
            Self::with_result(Ok(text.to_string()))
        }

        pub(crate) fn failing(err: EngineError) -> Self {
            Self::with_result(Err(err))
        }

        fn with_result(reply: Result<String, EngineError>) -> Self {
            Self {
                reply,
                calls: Cell::new(0),
                last_prompt: RefCell::new(None),
                last_image: RefCell::new(None),
            }
        }
    }

    impl AiEngine for MockEngine {
        fn send(
            &self,
            prompt: &PromptText,
            image: Option<&ImageBlob>,
        ) -> Result<String, EngineError> {
            self.calls.set(self.calls.get() + 1);
            *self.last_prompt.borrow_mut() = Some(prompt.as_str().to_string());
            *self.last_image.borrow_mut() = image.map(|i| i.bytes().to_vec());
            self.reply.clone()
        }
    }

    fn pipeline(engine: &MockEngine) -> TriagePipeline<'_, MockEngine> {
        TriagePipeline::new(engine, ResponseClassifier::default())
    }

    #[test]
    fn empty_request_never_reaches_engine() {
        let engine = MockEngine::replying("unused");
        let request = AnalysisRequest::new(PatientProfile::default(), "");

        let err = pipeline(&engine).analyze(&request).unwrap_err();
        assert!(matches!(err, TriageError::Validation(ValidationError::EmptyRequest)));
        assert_eq!(engine.calls.get(), 0);
    }

    #[test]
    fn invalid_profile_never_reaches_engine() {
        let engine = MockEngine::replying("unused");
        let profile = PatientProfile {
            gender: Gender::Male,
            context: PatientContext::Pregnant,
            ..PatientProfile::default()
        };
        let err = pipeline(&engine)
            .analyze(&AnalysisRequest::new(profile, "nausea"))
            .unwrap_err();
        assert!(matches!(
            err,
            TriageError::Validation(ValidationError::InvalidContext { .. })
        ));
        assert_eq!(engine.calls.get(), 0);
    }

    #[test]
    fn successful_run_classifies_response() {
        let engine = MockEngine::replying("Chest pain reported.\nCONFIDENCE SCORE: 70%");
        let report = pipeline(&engine)
            .analyze(&AnalysisRequest::new(PatientProfile::default(), "pain in chest"))
            .unwrap();

        assert_eq!(engine.calls.get(), 1);
        assert_eq!(report.result.status, TriageStatus::Urgent);
        assert!(report.result.emergency_flags.contains("chest pain"));
        assert_eq!(report.result.confidence_score, Some(70));
        assert_eq!(report.patient.age, 25);
        assert!(!report.had_image);
    }

    #[test]
    fn engine_receives_composed_prompt() {
        let engine = MockEngine::replying("ok");
        let request = AnalysisRequest::new(PatientProfile::default(), "sore throat")
            .with_language(ResponseLanguage::Hindi);
        pipeline(&engine).analyze(&request).unwrap();

        let prompt = engine.last_prompt.borrow().clone().unwrap();
        assert!(prompt.contains("Query: \"sore throat\""));
        assert!(prompt.contains("Respond entirely in Hindi."));
    }

    #[test]
    fn image_bytes_pass_through_unmodified() {
        let bytes = vec![0xFF, 0xD8, 0xFF, 0x00, 0x7F, 0x80];
        let engine = MockEngine::replying("ok");
        let request = AnalysisRequest::new(PatientProfile::default(), "")
            .with_image(ImageBlob::new(bytes.clone()));

        let report = pipeline(&engine).analyze(&request).unwrap();
        assert_eq!(engine.last_image.borrow().as_deref(), Some(bytes.as_slice()));
        assert!(report.had_image);
    }

    #[test]
    fn engine_failure_is_typed_not_panicking() {
        for err in [
            EngineError::Auth("bad key".into()),
            EngineError::RateLimit("429".into()),
            EngineError::Transport("timeout".into()),
            EngineError::Unknown("?".into()),
        ] {
            let engine = MockEngine::failing(err.clone());
            let result = pipeline(&engine)
                .analyze(&AnalysisRequest::new(PatientProfile::default(), "cough"));
            match result {
                Err(TriageError::Engine(got)) => assert_eq!(got, err),
                other => panic!("expected engine error, got {other:?}"),
            }
            assert_eq!(engine.calls.get(), 1, "no retries");
        }
    }

    #[test]
    fn empty_engine_reply_is_unknown_not_error() {
        let engine = MockEngine::replying("   ");
        let report = pipeline(&engine)
            .analyze(&AnalysisRequest::new(PatientProfile::default(), "cough"))
            .unwrap();
        assert_eq!(report.result.status, TriageStatus::Unknown);
    }

    #[test]
    fn configured_threshold_applies() {
        let engine = MockEngine::replying("CONFIDENCE SCORE: 60%");
        let config = TriageConfig {
            confidence_caution_threshold: 75,
            ..TriageConfig::default()
        };
        let pipeline = TriagePipeline::from_config(&engine, &config);
        assert_eq!(pipeline.classifier().caution_threshold(), 75);
        assert_eq!(pipeline.language(), ResponseLanguage::English);
        let report = pipeline
            .analyze(&AnalysisRequest::new(PatientProfile::default(), "cough"))
            .unwrap();
        assert_eq!(report.result.status, TriageStatus::Caution);
    }

    #[test]
    fn works_with_boxed_dyn_engine() {
        let engine: Box<dyn AiEngine> = Box::new(DemoEngine::new());
        let pipeline = TriagePipeline::new(engine.as_ref(), ResponseClassifier::default());
        let report = pipeline
            .analyze(&AnalysisRequest::new(PatientProfile::default(), "paracetamol 500mg"))
            .unwrap();
        assert_eq!(report.result.status, TriageStatus::Stable);
    }

    #[test]
    fn configured_language_is_the_pipeline_default() {
        let engine = MockEngine::replying("ok");
        let config = TriageConfig {
            response_language: ResponseLanguage::Hindi,
            ..TriageConfig::default()
        };
        let pipeline = TriagePipeline::from_config(&engine, &config);
        assert_eq!(pipeline.language(), ResponseLanguage::Hindi);
        assert_eq!(
            TriagePipeline::new(&engine, ResponseClassifier::default()).language(),
            ResponseLanguage::English
        );
    }
}
