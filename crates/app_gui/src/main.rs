use eframe::{egui, App, Frame, NativeOptions};
use lesion_core::{
    display_code, is_correct, normalized_confidence, sample_catalog, sorted_class_probabilities,
    ActivationMap, ClientConfig, InferenceFailed, InferenceTicket, LesionCode, PredictionClient,
    PredictionResult, Sample, ViewState, GALLERY_SIZE,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc;

fn main() {
    tracing_subscriber::fmt::init();
    let config = load_config();
    let options = NativeOptions::default();
    if let Err(e) = eframe::run_native(
        "Skin Lesion Classifier",
        options,
        Box::new(move |_cc| {
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(Box::new(UiApp::new(config)?))
        }),
    ) {
        eprintln!("application exited with error: {e}");
    }
}

/// Optional TOML config next to the binary, with environment overrides for
/// the endpoint and the sample directory.
fn load_config() -> ClientConfig {
    let path =
        std::env::var("LESION_DEMO_CONFIG").unwrap_or_else(|_| "lesion_demo.toml".to_string());
    let mut config = match std::fs::read_to_string(&path) {
        Ok(text) => match ClientConfig::from_toml(&text) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring invalid config {path}: {e}");
                ClientConfig::default()
            }
        },
        Err(_) => ClientConfig::default(),
    };
    if let Ok(endpoint) = std::env::var("LESION_ENDPOINT") {
        config.endpoint = endpoint;
    }
    if let Ok(dir) = std::env::var("LESION_SAMPLES_DIR") {
        config.samples_dir = PathBuf::from(dir);
    }
    config
}

const THUMB_SIZE: u32 = 120;
const DETAIL_SIZE: u32 = 512;

type InferenceOutcome = (InferenceTicket, Result<PredictionResult, InferenceFailed>);

struct UiApp {
    state: ViewState,
    catalog: Vec<Sample>,
    client: PredictionClient,
    result_tx: mpsc::Sender<InferenceOutcome>,
    result_rx: mpsc::Receiver<InferenceOutcome>,
    status: String,
    thumbs: HashMap<String, egui::TextureHandle>,
    detail: Option<(String, egui::TextureHandle)>,
    overlay_key: Option<String>,
    overlay: Option<egui::TextureHandle>,
}

impl UiApp {
    fn new(config: ClientConfig) -> Result<Self, InferenceFailed> {
        let client = PredictionClient::new(config)?;
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        let mut state = ViewState::new(seed);
        let catalog = sample_catalog();
        state.initialize_gallery(&catalog, GALLERY_SIZE);
        let (result_tx, result_rx) = mpsc::channel();
        Ok(Self {
            state,
            catalog,
            client,
            result_tx,
            result_rx,
            status: String::new(),
            thumbs: HashMap::new(),
            detail: None,
            overlay_key: None,
            overlay: None,
        })
    }

    /// Run the prediction on a background thread; the result comes back
    /// through the channel tagged with its ticket so stale responses are
    /// dropped in `update`.
    fn run_inference(&mut self, ctx: &egui::Context, sample: Sample) {
        let ticket = self.state.begin_inference();
        self.status = format!("Analyzing {}...", sample.image_name);
        let client = self.client.clone();
        let tx = self.result_tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = client.predict(&sample);
            let _ = tx.send((ticket, result));
            ctx.request_repaint();
        });
    }

    fn drain_inference_results(&mut self) {
        while let Ok((ticket, result)) = self.result_rx.try_recv() {
            match result {
                Ok(prediction) => {
                    if self.state.complete_inference(ticket, Some(prediction)) {
                        self.status = "Prediction ready".to_string();
                    }
                }
                Err(e) => {
                    if self.state.complete_inference(ticket, None) {
                        tracing::warn!("inference request failed: {e}");
                        self.status = format!("{e}");
                    }
                }
            }
        }
    }

    fn thumb_texture(&mut self, ctx: &egui::Context, image_name: &str) -> Option<egui::TextureId> {
        if let Some(tex) = self.thumbs.get(image_name) {
            return Some(tex.id());
        }
        let path = self.client.config().samples_dir.join(image_name);
        match image::open(&path) {
            Ok(img) => {
                let thumb = image::imageops::thumbnail(&img, THUMB_SIZE, THUMB_SIZE);
                let (w, h) = thumb.dimensions();
                let size = [w as usize, h as usize];
                let pixels = thumb.into_raw();
                let color = egui::ColorImage::from_rgba_unmultiplied(size, &pixels);
                let tex = ctx.load_texture(
                    format!("thumb:{image_name}"),
                    color,
                    egui::TextureOptions::LINEAR,
                );
                let id = tex.id();
                self.thumbs.insert(image_name.to_string(), tex);
                Some(id)
            }
            Err(e) => {
                tracing::warn!("failed to load thumbnail for {image_name}: {e}");
                None
            }
        }
    }

    fn detail_texture(&mut self, ctx: &egui::Context, image_name: &str) -> Option<egui::TextureId> {
        if let Some((name, tex)) = &self.detail {
            if name == image_name {
                return Some(tex.id());
            }
        }
        let path = self.client.config().samples_dir.join(image_name);
        match image::open(&path) {
            Ok(img) => {
                let scaled = img.thumbnail(DETAIL_SIZE, DETAIL_SIZE).to_rgba8();
                let size = [scaled.width() as usize, scaled.height() as usize];
                let color = egui::ColorImage::from_rgba_unmultiplied(size, scaled.as_raw());
                let tex = ctx.load_texture(
                    format!("detail:{image_name}"),
                    color,
                    egui::TextureOptions::LINEAR,
                );
                let id = tex.id();
                self.detail = Some((image_name.to_string(), tex));
                Some(id)
            }
            Err(e) => {
                tracing::warn!("failed to load {image_name}: {e}");
                None
            }
        }
    }

    /// Texture for the activation overlay, decoded from whichever form the
    /// response carried. Failures are cached so they are logged once, not
    /// every frame.
    fn overlay_texture(
        &mut self,
        ctx: &egui::Context,
        result: &PredictionResult,
    ) -> Option<egui::TextureId> {
        let map = result.activation_map()?;
        let key = overlay_cache_key(map);
        if self.overlay_key.as_deref() == Some(key.as_str()) {
            return self.overlay.as_ref().map(|t| t.id());
        }
        self.overlay_key = Some(key);
        self.overlay = None;

        let img = match map {
            ActivationMap::Base64(b64) => {
                use base64::Engine as _;
                let bytes = match base64::engine::general_purpose::STANDARD.decode(b64) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!("activation map is not valid base64: {e}");
                        return None;
                    }
                };
                match image::load_from_memory(&bytes) {
                    Ok(img) => img,
                    Err(e) => {
                        tracing::warn!("activation map payload is not an image: {e}");
                        return None;
                    }
                }
            }
            ActivationMap::Url(url) => {
                if url.starts_with("http://") || url.starts_with("https://") {
                    tracing::warn!("remote activation map URLs are not displayed: {url}");
                    return None;
                }
                let root = self
                    .client
                    .config()
                    .samples_dir
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."));
                let path = root.join(url.trim_start_matches('/'));
                match image::open(&path) {
                    Ok(img) => img,
                    Err(e) => {
                        tracing::warn!("failed to load activation map {}: {e}", path.display());
                        return None;
                    }
                }
            }
        };

        let rgba = img.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        let color = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
        let tex = ctx.load_texture("activation-map", color, egui::TextureOptions::LINEAR);
        let id = tex.id();
        self.overlay = Some(tex);
        Some(id)
    }

    fn render_gallery(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Sample Images");
            if ui.button("Shuffle").clicked() {
                self.state.reshuffle_gallery(&self.catalog, GALLERY_SIZE);
            }
        });
        ui.add_space(6.0);

        let samples: Vec<Sample> = self.state.display_images().to_vec();
        let mut clicked: Option<Sample> = None;

        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    let desired = egui::Vec2::splat(THUMB_SIZE as f32);
                    for sample in &samples {
                        let (resp, painter) = ui.allocate_painter(desired, egui::Sense::click());
                        let rect = resp.rect;
                        if let Some(id) = self.thumb_texture(ctx, &sample.image_name) {
                            paint_texture(&painter, id, rect, egui::Color32::WHITE);
                        } else {
                            painter.rect_filled(rect, 4.0, egui::Color32::from_gray(40));
                        }
                        if resp.clicked() {
                            clicked = Some(sample.clone());
                        }
                    }
                });
            });

        if let Some(sample) = clicked {
            self.select_sample(sample);
        }
    }

    fn select_sample(&mut self, sample: Sample) {
        self.state.select_sample(sample);
        self.overlay = None;
        self.overlay_key = None;
        self.status.clear();
    }

    fn render_analysis(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let Some(sample) = self.state.selected_image().cloned() else {
            return;
        };
        let prediction = self.state.prediction().cloned();
        let loading = self.state.is_loading();
        let mut show_overlay = self.state.show_activation_map();

        let detail_id = self.detail_texture(ctx, &sample.image_name);
        let overlay_id = match (&prediction, show_overlay) {
            (Some(result), true) => self.overlay_texture(ctx, result),
            _ => None,
        };

        let mut close_clicked = false;
        let mut run_clicked = false;
        let mut overlay_changed = false;

        ui.horizontal(|ui| {
            ui.heading("Analysis");
            if ui.button("Close").clicked() {
                close_clicked = true;
            }
        });
        ui.add_space(6.0);

        ui.columns(2, |cols| {
            {
                let ui = &mut cols[0];
                ui.horizontal(|ui| {
                    ui.label("Selected Image");
                    if prediction.is_some()
                        && ui.checkbox(&mut show_overlay, "Activation map").changed()
                    {
                        overlay_changed = true;
                    }
                });
                let desired = egui::Vec2::splat(ui.available_width().min(DETAIL_SIZE as f32));
                let (resp, painter) = ui.allocate_painter(desired, egui::Sense::hover());
                let rect = resp.rect;
                if let Some(id) = detail_id {
                    paint_texture(&painter, id, rect, egui::Color32::WHITE);
                } else {
                    painter.rect_filled(rect, 4.0, egui::Color32::from_gray(40));
                }
                if let Some(id) = overlay_id {
                    paint_texture(&painter, id, rect, egui::Color32::from_white_alpha(200));
                }
            }

            {
                let ui = &mut cols[1];
                ui.label("Ground Truth");
                ui.horizontal(|ui| {
                    ui.monospace(sample.true_label.code());
                    ui.label(sample.true_label.class_name());
                });
                ui.add_space(8.0);

                let run_label = if loading { "Analyzing..." } else { "Run Model" };
                if ui
                    .add_enabled(!loading, egui::Button::new(run_label))
                    .clicked()
                {
                    run_clicked = true;
                }
                ui.add_space(8.0);

                ui.label("Model Prediction");
                match &prediction {
                    Some(result) => {
                        ui.horizontal(|ui| {
                            ui.monospace(display_code(&result.predicted_class_name));
                            ui.label(&result.predicted_class_name);
                        });
                        ui.label(format!(
                            "Confidence: {:.1}%",
                            normalized_confidence(result) * 100.0
                        ));
                        if is_correct(result, &sample) {
                            ui.colored_label(egui::Color32::LIGHT_GREEN, "Correct");
                        } else {
                            ui.colored_label(egui::Color32::LIGHT_RED, "Incorrect");
                        }

                        ui.add_space(8.0);
                        ui.label("Class Probabilities");
                        for (name, probability) in sorted_class_probabilities(result) {
                            ui.horizontal(|ui| {
                                ui.monospace(display_code(&name));
                                ui.label(&name);
                            });
                            ui.add(
                                egui::ProgressBar::new(probability as f32)
                                    .text(format!("{:.1}%", probability * 100.0)),
                            );
                        }
                    }
                    None => {
                        ui.weak("Click \"Run Model\" to get a prediction");
                    }
                }
            }
        });

        ui.add_space(12.0);
        ui.separator();
        ui.label("Lesion Types Reference");
        egui::Grid::new("lesion-reference")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for code in LesionCode::ALL {
                    ui.monospace(code.code());
                    ui.label(code.class_name());
                    ui.end_row();
                }
            });

        if overlay_changed {
            self.state.toggle_activation_map(show_overlay);
        }
        if close_clicked {
            self.state.close_analysis();
            self.overlay = None;
            self.overlay_key = None;
            self.status.clear();
        } else if run_clicked {
            self.run_inference(ctx, sample);
        }
    }
}

/// Cache key for the overlay texture. Base64 payloads are keyed by length
/// plus a short prefix, taken per character so arbitrary endpoint data can
/// never split a UTF-8 boundary.
fn overlay_cache_key(map: ActivationMap<'_>) -> String {
    match map {
        ActivationMap::Url(url) => format!("url:{url}"),
        ActivationMap::Base64(b64) => {
            let prefix: String = b64.chars().take(24).collect();
            format!("b64:{}:{prefix}", b64.len())
        }
    }
}

fn paint_texture(
    painter: &egui::Painter,
    id: egui::TextureId,
    rect: egui::Rect,
    tint: egui::Color32,
) {
    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    painter.image(id, rect, uv, tint);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_cache_key_survives_multibyte_payloads() {
        // A non-ASCII character straddling the prefix cutoff must not panic.
        let payload = format!("{}\u{e9}{}", "a".repeat(23), "rest-of-payload");
        let key = overlay_cache_key(ActivationMap::Base64(&payload));
        assert!(key.starts_with("b64:"));

        let same = overlay_cache_key(ActivationMap::Base64(&payload));
        assert_eq!(key, same);
        let other = overlay_cache_key(ActivationMap::Base64("different"));
        assert_ne!(key, other);
    }

    #[test]
    fn overlay_cache_key_distinguishes_url_from_inline() {
        let url = overlay_cache_key(ActivationMap::Url("/images/activation-map.png"));
        let inline = overlay_cache_key(ActivationMap::Base64("/images/activation-map.png"));
        assert_ne!(url, inline);
    }
}

impl App for UiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.drain_inference_results();

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Skin Lesion Classifier");
                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(&self.status);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.show_analysis() {
                self.render_analysis(ctx, ui);
            } else {
                self.render_gallery(ctx, ui);
            }
        });
    }
}
