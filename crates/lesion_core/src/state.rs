use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::catalog::Sample;
use crate::result::PredictionResult;

/// Identifies the selection an inference request was started for. A result
/// may only be applied while its ticket's generation is still current, which
/// keeps a slow response for a previous selection from overwriting the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceTicket(u64);

/// Session-scoped state for the gallery → analysis flow.
///
/// All mutation goes through the named operations below so the selection,
/// prediction, and overlay flags can never be observed half-updated. The
/// state lives for one app session; nothing is persisted.
#[derive(Debug)]
pub struct ViewState {
    display_images: Vec<Sample>,
    selected_image: Option<Sample>,
    prediction: Option<PredictionResult>,
    is_loading: bool,
    show_analysis: bool,
    show_activation_map: bool,
    is_initialized: bool,
    generation: u64,
    rng: StdRng,
}

impl ViewState {
    pub fn new(seed: u64) -> Self {
        Self {
            display_images: Vec::new(),
            selected_image: None,
            prediction: None,
            is_loading: false,
            show_analysis: false,
            show_activation_map: false,
            is_initialized: false,
            generation: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn display_images(&self) -> &[Sample] {
        &self.display_images
    }

    pub fn selected_image(&self) -> Option<&Sample> {
        self.selected_image.as_ref()
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.prediction.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn show_analysis(&self) -> bool {
        self.show_analysis
    }

    pub fn show_activation_map(&self) -> bool {
        self.show_activation_map
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    /// Populate the gallery once per session with a shuffled draw of at most
    /// `count` samples. Later calls are no-ops; use
    /// [`reshuffle_gallery`](Self::reshuffle_gallery) to replace the set.
    pub fn initialize_gallery(&mut self, all_samples: &[Sample], count: usize) {
        if self.is_initialized {
            return;
        }
        self.display_images = self.draw(all_samples, count);
        self.is_initialized = true;
    }

    /// Replace the displayed set unconditionally. Selection, prediction, and
    /// the initialized flag are untouched.
    pub fn reshuffle_gallery(&mut self, all_samples: &[Sample], count: usize) {
        self.display_images = self.draw(all_samples, count);
    }

    fn draw(&mut self, all_samples: &[Sample], count: usize) -> Vec<Sample> {
        let mut shuffled = all_samples.to_vec();
        shuffled.shuffle(&mut self.rng);
        shuffled.truncate(count);
        shuffled
    }

    /// Switch the analysis view to `sample`. This is the only way prediction
    /// state is cleared when changing subjects; any in-flight request is
    /// invalidated.
    pub fn select_sample(&mut self, sample: Sample) {
        self.selected_image = Some(sample);
        self.prediction = None;
        self.show_analysis = true;
        self.show_activation_map = false;
        self.is_loading = false;
        self.generation += 1;
    }

    /// Back to the gallery: clears the selection, prediction, and all
    /// analysis flags, and invalidates any in-flight request.
    pub fn close_analysis(&mut self) {
        self.selected_image = None;
        self.prediction = None;
        self.show_analysis = false;
        self.show_activation_map = false;
        self.is_loading = false;
        self.generation += 1;
    }

    /// Mark an inference request as started for the current selection.
    /// Callers are expected not to start a second request while
    /// [`is_loading`](Self::is_loading) is set.
    pub fn begin_inference(&mut self) -> InferenceTicket {
        self.is_loading = true;
        InferenceTicket(self.generation)
    }

    /// Record a finished inference. `None` means the request failed: loading
    /// is cleared and whatever was displayed before stays untouched. Returns
    /// false when the ticket is stale because the selection changed while
    /// the request was in flight; stale results are dropped entirely.
    pub fn complete_inference(
        &mut self,
        ticket: InferenceTicket,
        result: Option<PredictionResult>,
    ) -> bool {
        if ticket.0 != self.generation {
            tracing::debug!("dropping stale inference result");
            return false;
        }
        if result.is_some() {
            self.prediction = result;
        }
        self.is_loading = false;
        true
    }

    /// Show or hide the activation-map overlay. Setting it without a
    /// prediction is allowed; the overlay only becomes visible once a
    /// prediction with an activation map arrives.
    pub fn toggle_activation_map(&mut self, visible: bool) {
        self.show_activation_map = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{sample_catalog, GALLERY_SIZE};
    use crate::mock::mock_prediction;
    use crate::taxonomy::LesionCode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn sample(name: &str, label: LesionCode) -> Sample {
        Sample {
            image_name: name.to_string(),
            true_label: label,
        }
    }

    fn some_prediction() -> PredictionResult {
        let mut rng = StdRng::seed_from_u64(7);
        mock_prediction(LesionCode::Bcc, &mut rng)
    }

    #[test]
    fn initialize_gallery_is_idempotent() {
        let catalog = sample_catalog();
        let mut state = ViewState::new(42);

        state.initialize_gallery(&catalog, GALLERY_SIZE);
        assert!(state.is_initialized());
        let first: Vec<Sample> = state.display_images().to_vec();
        assert_eq!(first.len(), GALLERY_SIZE);

        state.initialize_gallery(&catalog, GALLERY_SIZE);
        assert_eq!(state.display_images(), first.as_slice());
    }

    #[test]
    fn initialize_gallery_caps_at_catalog_size() {
        let catalog = vec![sample("1.jpg", LesionCode::Mel), sample("2.jpg", LesionCode::Nv)];
        let mut state = ViewState::new(1);
        state.initialize_gallery(&catalog, GALLERY_SIZE);
        assert_eq!(state.display_images().len(), 2);
    }

    #[test]
    fn reshuffle_draws_distinct_catalog_entries() {
        let catalog = sample_catalog();
        let mut state = ViewState::new(3);
        state.initialize_gallery(&catalog, GALLERY_SIZE);

        state.reshuffle_gallery(&catalog, GALLERY_SIZE);
        let names: HashSet<&str> = state
            .display_images()
            .iter()
            .map(|s| s.image_name.as_str())
            .collect();
        assert_eq!(names.len(), GALLERY_SIZE);
        for shown in state.display_images() {
            assert!(catalog.contains(shown));
        }
        // Reshuffling must not clear the initialized flag.
        assert!(state.is_initialized());
    }

    #[test]
    fn select_then_close_returns_to_empty_gallery_state() {
        let mut state = ViewState::new(0);
        state.select_sample(sample("3.jpg", LesionCode::Bcc));
        assert!(state.show_analysis());
        assert!(state.selected_image().is_some());

        let ticket = state.begin_inference();
        state.complete_inference(ticket, Some(some_prediction()));
        assert!(state.prediction().is_some());

        state.close_analysis();
        assert!(state.selected_image().is_none());
        assert!(state.prediction().is_none());
        assert!(!state.show_analysis());
        assert!(!state.show_activation_map());
        assert!(!state.is_loading());
    }

    #[test]
    fn selecting_a_new_sample_clears_the_previous_prediction() {
        let mut state = ViewState::new(0);
        state.select_sample(sample("3.jpg", LesionCode::Bcc));
        let ticket = state.begin_inference();
        assert!(state.complete_inference(ticket, Some(some_prediction())));

        state.toggle_activation_map(true);
        state.select_sample(sample("4.jpg", LesionCode::Akiec));
        assert!(state.prediction().is_none());
        assert!(!state.show_activation_map());
    }

    #[test]
    fn failed_inference_clears_loading_and_keeps_no_result() {
        let mut state = ViewState::new(0);
        state.select_sample(sample("3.jpg", LesionCode::Bcc));
        let ticket = state.begin_inference();
        assert!(state.is_loading());

        assert!(state.complete_inference(ticket, None));
        assert!(!state.is_loading());
        assert!(state.prediction().is_none());
    }

    #[test]
    fn stale_result_is_discarded_after_reselection() {
        let mut state = ViewState::new(0);
        state.select_sample(sample("3.jpg", LesionCode::Bcc));
        let stale = state.begin_inference();

        // User switches subjects while the request is in flight.
        state.select_sample(sample("5.jpg", LesionCode::Bkl));
        assert!(!state.complete_inference(stale, Some(some_prediction())));
        assert!(state.prediction().is_none());

        // The request for the new selection still completes normally.
        let fresh = state.begin_inference();
        assert!(state.complete_inference(fresh, Some(some_prediction())));
        assert!(state.prediction().is_some());
    }

    #[test]
    fn stale_result_is_discarded_after_close() {
        let mut state = ViewState::new(0);
        state.select_sample(sample("3.jpg", LesionCode::Bcc));
        let stale = state.begin_inference();

        state.close_analysis();
        assert!(!state.complete_inference(stale, Some(some_prediction())));
        assert!(state.prediction().is_none());
        assert!(!state.is_loading());
    }

    #[test]
    fn overlay_toggle_is_independent_of_prediction() {
        let mut state = ViewState::new(0);
        state.toggle_activation_map(true);
        assert!(state.show_activation_map());
        state.toggle_activation_map(false);
        assert!(!state.show_activation_map());
    }
}
