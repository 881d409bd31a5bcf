//! Narration pipeline contract.
//!
//! Script generators (an LLM endpoint, an uploaded transcript, a user typing)
//! are external collaborators. This module only fixes how they are driven:
//! slides in ascending ordinal order, a configurable pause between calls,
//! a bounded number of attempts, and no partial results on failure.

use crate::transcript::TranscriptSplitter;
use crate::{Error, Result, Slide};
use std::collections::BTreeMap;
use std::time::Duration;

/// A source of narration scripts for individual slides.
pub trait NarrationSource {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &str;

    /// Produce the narration script for one slide.
    fn narrate(&self, slide: &Slide) -> Result<String>;

    /// Suggestion shown to the user when this source fails for good,
    /// e.g. switching to another provider.
    fn fallback_hint(&self) -> Option<&str> {
        None
    }
}

/// Pacing policy for consecutive calls to an external source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Pause inserted between two consecutive calls.
    pub delay: Duration,
    /// Attempts per slide before the run fails. Always at least 1.
    pub max_attempts: u32,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1500),
            max_attempts: 2,
        }
    }
}

impl Pacing {
    /// Pacing with no pause and a single attempt, for local sources.
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
            max_attempts: 1,
        }
    }

    /// Set the pause between calls.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the number of attempts per slide.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }
}

/// Drives a [`NarrationSource`] over a deck's slides.
pub struct NarrationPipeline<S> {
    source: S,
    pacing: Pacing,
    overwrite: bool,
}

impl<S: NarrationSource> NarrationPipeline<S> {
    /// Create a pipeline with the default pacing.
    pub fn new(source: S) -> Self {
        Self {
            source,
            pacing: Pacing::default(),
            overwrite: false,
        }
    }

    /// Set the pacing policy.
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Replace scripts on slides that already have one.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Generate narration for every slide that needs it.
    ///
    /// Slides are visited in ascending ordinal order. Scripts are only stored
    /// once every call has succeeded; on failure `slides` is left untouched.
    /// Returns the number of slides that received a script.
    pub fn run(&self, slides: &mut [Slide]) -> Result<usize> {
        let mut order: Vec<usize> = (0..slides.len())
            .filter(|&i| self.overwrite || !slides[i].has_narration())
            .collect();
        order.sort_by_key(|&i| slides[i].ordinal);

        let mut scripts = Vec::with_capacity(order.len());
        let mut calls = 0u32;
        for &idx in &order {
            let script = self.narrate_with_retries(&slides[idx], &mut calls)?;
            scripts.push((idx, script));
        }

        let generated = scripts.len();
        for (idx, script) in scripts {
            slides[idx].narration = Some(script);
        }

        log::info!("{} produced {} narration scripts", self.source.name(), generated);
        Ok(generated)
    }

    fn narrate_with_retries(&self, slide: &Slide, calls: &mut u32) -> Result<String> {
        let mut attempt = 0;
        loop {
            if *calls > 0 && !self.pacing.delay.is_zero() {
                std::thread::sleep(self.pacing.delay);
            }
            *calls += 1;
            attempt += 1;

            match self.source.narrate(slide) {
                Ok(script) => return Ok(script),
                Err(e) if attempt < self.pacing.max_attempts => {
                    log::warn!(
                        "{} failed on slide {} (attempt {}/{}): {}",
                        self.source.name(),
                        slide.ordinal,
                        attempt,
                        self.pacing.max_attempts,
                        e
                    );
                }
                Err(e) => return Err(self.final_error(slide, e)),
            }
        }
    }

    fn final_error(&self, slide: &Slide, err: Error) -> Error {
        let err = match err {
            e @ Error::Narration { .. } => e,
            other => Error::narration(self.source.name(), slide.ordinal, other.to_string()),
        };
        let needs_hint = matches!(err, Error::Narration { hint: None, .. });
        match self.source.fallback_hint() {
            Some(hint) if needs_hint => err.with_hint(hint),
            _ => err,
        }
    }
}

/// Narration source backed by an uploaded transcript.
#[derive(Debug, Clone)]
pub struct TranscriptSource {
    scripts: BTreeMap<usize, String>,
}

impl TranscriptSource {
    /// Split `transcript` for a deck with `slide_count` slides.
    pub fn new(transcript: &str, slide_count: usize) -> Self {
        Self {
            scripts: TranscriptSplitter::new(slide_count).split(transcript),
        }
    }
}

impl NarrationSource for TranscriptSource {
    fn name(&self) -> &str {
        "transcript"
    }

    /// Slides the transcript does not cover get an empty script.
    fn narrate(&self, slide: &Slide) -> Result<String> {
        Ok(self.scripts.get(&slide.ordinal).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    struct ScriptedSource {
        failures_left: Cell<u32>,
        seen: RefCell<Vec<usize>>,
    }

    impl ScriptedSource {
        fn failing(times: u32) -> Self {
            Self {
                failures_left: Cell::new(times),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl NarrationSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        fn narrate(&self, slide: &Slide) -> Result<String> {
            self.seen.borrow_mut().push(slide.ordinal);
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(Error::XmlError("boom".into()));
            }
            Ok(format!("Script for {}", slide.title))
        }

        fn fallback_hint(&self) -> Option<&str> {
            Some("upload a transcript instead")
        }
    }

    fn slides() -> Vec<Slide> {
        vec![
            Slide::new(2).with_title("Second"),
            Slide::new(1).with_title("First"),
            Slide::new(3).with_title("Third").with_narration("Existing"),
        ]
    }

    #[test]
    fn test_run_in_ordinal_order_skipping_narrated() {
        let mut slides = slides();
        let pipeline = NarrationPipeline::new(ScriptedSource::failing(0)).with_pacing(Pacing::immediate());

        let generated = pipeline.run(&mut slides).unwrap();

        assert_eq!(generated, 2);
        assert_eq!(*pipeline.source.seen.borrow(), vec![1, 2]);
        assert_eq!(slides[0].narration_text(), "Script for Second");
        assert_eq!(slides[1].narration_text(), "Script for First");
        assert_eq!(slides[2].narration_text(), "Existing");
    }

    #[test]
    fn test_retry_within_bounds() {
        let mut slides = slides();
        let pacing = Pacing::immediate().with_max_attempts(2);
        let pipeline = NarrationPipeline::new(ScriptedSource::failing(1)).with_pacing(pacing);

        assert_eq!(pipeline.run(&mut slides).unwrap(), 2);
        assert_eq!(*pipeline.source.seen.borrow(), vec![1, 1, 2]);
    }

    #[test]
    fn test_failure_leaves_slides_untouched() {
        let mut slides = slides();
        let pacing = Pacing::immediate().with_max_attempts(3);
        let pipeline = NarrationPipeline::new(ScriptedSource::failing(10)).with_pacing(pacing);

        let err = pipeline.run(&mut slides).unwrap_err();

        assert_eq!(pipeline.source.seen.borrow().len(), 3);
        assert_eq!(slides, self::slides());
        match err {
            Error::Narration {
                provider,
                ordinal,
                hint,
                ..
            } => {
                assert_eq!(provider, "scripted");
                assert_eq!(ordinal, 1);
                assert_eq!(hint.as_deref(), Some("upload a transcript instead"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_max_attempts_never_zero() {
        assert_eq!(Pacing::default().with_max_attempts(0).max_attempts, 1);
    }

    #[test]
    fn test_transcript_source_overwrite() {
        let mut slides = slides();
        let source = TranscriptSource::new("Slide 3\nFresh\nSlide 1\nHello", 3);
        let pipeline = NarrationPipeline::new(source)
            .with_pacing(Pacing::immediate())
            .with_overwrite(true);

        assert_eq!(pipeline.run(&mut slides).unwrap(), 3);
        assert_eq!(slides[0].narration_text(), "");
        assert_eq!(slides[1].narration_text(), "Hello");
        assert_eq!(slides[2].narration_text(), "Fresh");
    }
}
