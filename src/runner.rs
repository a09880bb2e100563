//! Runs one resolved request from asset lookup to the log entry.

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::asset::{self, ResolvedAsset};
use crate::client;
use crate::context::ServiceContext;
use crate::error::KreaError;
use crate::history::{History, LogEntry, OperationDetails};
use crate::interactive;
use crate::model::Engine;
use crate::output;
use crate::poller::{self, PollPolicy};
use crate::request::{EngineOptions, ImageSettings, RequestConfig, UpscalePlan, UpscaleSettings};

/// Executes requests against the context's ports and writes results under `output_dir`.
pub struct Runner<'a> {
    ctx: &'a ServiceContext,
    output_dir: PathBuf,
    history: History,
}

impl<'a> Runner<'a> {
    /// Create a runner writing to `output_dir`.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, output_dir: &Path) -> Self {
        Self { ctx, output_dir: output_dir.to_path_buf(), history: History::new(output_dir) }
    }

    /// Run `request` and return one log entry per saved image.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Images saved before it stay logged.
    pub async fn execute(&self, request: &RequestConfig) -> Result<Vec<LogEntry>, KreaError> {
        let entries = match request {
            RequestConfig::Generate(image) => self.generate(image, None).await?,
            RequestConfig::Edit { image, source, strength } => {
                let asset = self.locate(source).await?;
                self.generate(image, Some((&asset, *strength))).await?
            }
            RequestConfig::Upscale { source, plan } => {
                let asset = self.locate(source).await?;
                let settings = match plan {
                    UpscalePlan::Configured(settings) => settings.clone(),
                    UpscalePlan::Interactive { format } => {
                        interactive::ask_upscale_settings(std::io::stdin().lock(), std::io::stderr(), *format)?
                    }
                };
                self.upscale(&settings, &asset).await?
            }
        };

        let cost: f64 = entries.iter().map(|e| e.cost).sum();
        if entries.len() > 1 {
            eprintln!("Total estimated cost: ${cost:.2} for {} images", entries.len());
        } else {
            eprintln!("Estimated cost: ${cost:.2}");
        }
        Ok(entries)
    }

    async fn locate(&self, source: &asset::AssetReference) -> Result<ResolvedAsset, KreaError> {
        let last = match source {
            asset::AssetReference::Last => self.history.latest()?,
            _ => None,
        };
        asset::resolve(source, last.as_ref(), self.ctx.uploader.as_deref()).await
    }

    async fn generate(
        &self,
        image: &ImageSettings,
        edit: Option<(&ResolvedAsset, f64)>,
    ) -> Result<Vec<LogEntry>, KreaError> {
        let inherited = edit.and_then(|(asset, _)| asset.aspect_ratio.as_deref());
        let aspect_ratio = image.effective_aspect_ratio(inherited);
        let request = client::generation_request(
            image,
            &aspect_ratio,
            edit.map(|(asset, strength)| (asset.url.as_str(), strength)),
        );
        let policy = PollPolicy::for_generation();
        let label = format!("{}-{}", image.model.id(), output::slugify(&image.prompt));
        let verb = if edit.is_some() { "Editing" } else { "Generating" };

        let mut entries = Vec::new();
        for n in 1..=image.count {
            eprintln!("{verb} with {} ({aspect_ratio}), image {n}/{}...", image.model.display_name(), image.count);
            let submission = client::submit(self.ctx.api.as_ref(), &request).await?;
            let urls = poller::result_urls(self.ctx.api.as_ref(), submission, &policy).await?;
            let several = image.count > 1 || urls.len() > 1;

            for url in urls {
                let index = several.then_some(entries.len() + 1);
                let details = OperationDetails::Generate {
                    prompt: image.prompt.clone(),
                    model: image.model,
                    model_name: image.model.display_name().to_string(),
                    aspect_ratio: aspect_ratio.clone(),
                    is_edit: edit.is_some(),
                    source_image_url: edit.map(|(asset, _)| asset.url.clone()),
                    edit_strength: edit.map(|(_, strength)| strength),
                    resolution: image.resolution.clone(),
                };
                let entry = self.save(&url, &label, index, None, image.model.cost(), details, &policy).await?;
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    async fn upscale(
        &self,
        settings: &UpscaleSettings,
        asset: &ResolvedAsset,
    ) -> Result<Vec<LogEntry>, KreaError> {
        let engine = settings.engine.engine();
        let source = asset::source_dimensions(asset.local_path.as_deref());
        let target = client::target_dimensions(source, settings.scale, engine);
        let request = client::upscale_request(settings, &asset.url, target);
        let policy = PollPolicy::for_engine(engine);

        eprintln!("Upscaling with {} ({}x) to {target}...", engine.name(), settings.scale);
        let submission = client::submit(self.ctx.api.as_ref(), &request).await?;
        let urls = poller::result_urls(self.ctx.api.as_ref(), submission, &policy).await?;

        let label = match engine {
            Engine::Topaz => format!("upscale-{}x", settings.scale),
            Engine::Bloom => format!("bloom-{}x", settings.scale),
        };
        let several = urls.len() > 1;
        let mut entries = Vec::new();
        for url in urls {
            let index = several.then_some(entries.len() + 1);
            let details = match &settings.engine {
                EngineOptions::Topaz(topaz) => OperationDetails::UpscaleTopaz {
                    engine,
                    source_url: asset.url.clone(),
                    scale_factor: settings.scale,
                    upscale_model: topaz.model,
                    target_dimensions: target.to_string(),
                    sharpen: topaz.sharpen,
                    denoise: topaz.denoise,
                    fix_compression: topaz.fix_compression,
                    face_enhancement: topaz.face_enhancement,
                },
                EngineOptions::Bloom(bloom) => OperationDetails::UpscaleBloom {
                    engine,
                    source_url: asset.url.clone(),
                    scale_factor: settings.scale,
                    creativity: bloom.creativity,
                    face_preservation: bloom.face_preservation,
                    color_preservation: bloom.color_preservation,
                    target_dimensions: target.to_string(),
                    prompt: bloom.prompt.clone(),
                },
            };
            let ext = Some(settings.format.extension());
            let entry = self.save(&url, &label, index, ext, engine.cost(), details, &policy).await?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Download `url`, write it, then log it. Nothing is logged if a step fails.
    #[allow(clippy::too_many_arguments)]
    async fn save(
        &self,
        url: &str,
        label: &str,
        index: Option<usize>,
        ext: Option<&'static str>,
        cost: f64,
        details: OperationDetails,
        policy: &PollPolicy,
    ) -> Result<LogEntry, KreaError> {
        let download = poller::download(self.ctx.api.as_ref(), url, policy).await?;
        let ext = ext.unwrap_or_else(|| {
            output::detect_extension(download.content_type.as_deref(), url, &download.data)
        });
        let now = Local::now();
        let path = output::image_path(&self.output_dir, &now, label, index, ext);
        output::save_image(&download.data, &path)?;

        let local_path = std::path::absolute(&path).unwrap_or(path);
        let entry = LogEntry { timestamp: now, local_path, krea_url: url.to_string(), cost, details };
        self.history.append(&entry)?;
        tracing::debug!(log = %self.history.path().display(), "appended log entry");

        eprintln!("Saved: {}", entry.local_path.display());
        eprintln!("Krea URL: {url}");
        tracing::info!(bytes = download.data.len(), "image saved");
        Ok(entry)
    }
}
