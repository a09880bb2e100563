//! Builds API payloads and submits them.

use serde_json::json;

use crate::error::KreaError;
use crate::history::Dimensions;
use crate::model::Engine;
use crate::ports::krea_api::{KreaApi, Submission, SubmitRequest};
use crate::request::{EngineOptions, ImageSettings, UpscaleSettings};

/// Strength sent with face enhancement when it is enabled.
const FACE_ENHANCEMENT_LEVEL: f64 = 0.5;

/// Request for one generated image; `edit` is the source URL and strength.
#[must_use]
pub fn generation_request(
    image: &ImageSettings,
    aspect_ratio: &str,
    edit: Option<(&str, f64)>,
) -> SubmitRequest {
    let mut payload = json!({
        "prompt": image.prompt,
        "aspectRatio": aspect_ratio,
        "numImages": 1,
    });
    if let Some(ref resolution) = image.resolution {
        payload["resolution"] = json!(resolution);
    }
    if let Some((url, strength)) = edit {
        payload["styleImages"] = json!([{ "url": url, "strength": strength }]);
    }
    SubmitRequest { endpoint: image.model.endpoint().to_string(), payload }
}

/// Source size times `scale`, capped per side at the engine's maximum.
#[must_use]
pub fn target_dimensions(source: Dimensions, scale: u32, engine: Engine) -> Dimensions {
    let max = engine.max_dimension();
    Dimensions {
        width: source.width.saturating_mul(scale).min(max),
        height: source.height.saturating_mul(scale).min(max),
    }
}

/// Request for an upscale of `source_url` to `target`.
#[must_use]
pub fn upscale_request(
    settings: &UpscaleSettings,
    source_url: &str,
    target: Dimensions,
) -> SubmitRequest {
    let mut payload = json!({
        "image_url": source_url,
        "width": target.width,
        "height": target.height,
        "upscaling_activated": true,
        "image_scaling_factor": settings.scale,
        "output_format": settings.format.extension(),
    });
    match &settings.engine {
        EngineOptions::Topaz(topaz) => {
            payload["model"] = json!(topaz.model.api_name());
            payload["sharpen"] = json!(topaz.sharpen);
            payload["denoise"] = json!(topaz.denoise);
            payload["fix_compression"] = json!(topaz.fix_compression);
            payload["face_enhancement"] = json!(topaz.face_enhancement);
            if topaz.face_enhancement {
                payload["face_enhancement_creativity"] = json!(FACE_ENHANCEMENT_LEVEL);
                payload["face_enhancement_strength"] = json!(FACE_ENHANCEMENT_LEVEL);
            }
        }
        EngineOptions::Bloom(bloom) => {
            payload["model"] = json!("Reimagine");
            payload["creativity"] = json!(bloom.creativity);
            payload["face_preservation"] = json!(bloom.face_preservation);
            payload["color_preservation"] = json!(bloom.color_preservation);
            if let Some(ref prompt) = bloom.prompt {
                payload["prompt"] = json!(prompt);
            }
        }
    }
    SubmitRequest { endpoint: settings.engine.engine().endpoint().to_string(), payload }
}

/// Submit once. Submissions are billed, so they are never retried.
///
/// # Errors
///
/// Returns the classified API error.
pub async fn submit(api: &dyn KreaApi, request: &SubmitRequest) -> Result<Submission, KreaError> {
    let submission = api.submit(request).await?;
    match &submission {
        Submission::Immediate { urls } => tracing::info!(count = urls.len(), "result ready immediately"),
        Submission::Job(handle) => eprintln!("Job submitted: {}", handle.job_id),
    }
    Ok(submission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Model, TopazModel};
    use crate::params::OutputFormat;
    use crate::request::{BloomOptions, TopazOptions};

    fn image(model: Model, resolution: Option<&str>) -> ImageSettings {
        ImageSettings {
            prompt: "A red bicycle".into(),
            model,
            aspect_ratio: "1:1".into(),
            inherit_aspect_ratio: false,
            resolution: resolution.map(str::to_string),
            count: 1,
        }
    }

    #[test]
    fn nano_generation_payload() {
        let request = generation_request(&image(Model::Nano, None), "1:1", None);
        assert_eq!(request.endpoint, "/generate/image/google/nano-banana");
        assert_eq!(
            request.payload,
            json!({"prompt": "A red bicycle", "aspectRatio": "1:1", "numImages": 1})
        );
    }

    #[test]
    fn pro_edit_payload() {
        let request = generation_request(
            &image(Model::Pro, Some("2K")),
            "16:9",
            Some(("https://gen.krea.ai/a.png", 0.6)),
        );
        assert_eq!(request.endpoint, "/generate/image/google/nano-banana-pro");
        assert_eq!(request.payload["resolution"], "2K");
        assert_eq!(request.payload["aspectRatio"], "16:9");
        assert_eq!(
            request.payload["styleImages"],
            json!([{"url": "https://gen.krea.ai/a.png", "strength": 0.6}])
        );
    }

    #[test]
    fn targets_are_capped_per_side() {
        let source = Dimensions { width: 1024, height: 768 };
        assert_eq!(
            target_dimensions(source, 4, Engine::Topaz),
            Dimensions { width: 4096, height: 3072 }
        );
        assert_eq!(
            target_dimensions(source, 32, Engine::Topaz),
            Dimensions { width: 22_000, height: 22_000 }
        );
        assert_eq!(
            target_dimensions(source, 12, Engine::Bloom),
            Dimensions { width: 10_000, height: 9216 }
        );
    }

    #[test]
    fn topaz_payload() {
        let settings = UpscaleSettings {
            scale: 2,
            format: OutputFormat::Webp,
            engine: EngineOptions::Topaz(TopazOptions {
                model: TopazModel::HighFidelityV2,
                face_enhancement: true,
                ..TopazOptions::default()
            }),
        };
        let request =
            upscale_request(&settings, "https://x/a.png", Dimensions { width: 2048, height: 2048 });
        assert_eq!(request.endpoint, "/generate/enhance/topaz/standard-enhance");
        let p = &request.payload;
        assert_eq!(p["model"], "High Fidelity V2");
        assert_eq!(p["width"], 2048);
        assert_eq!(p["image_scaling_factor"], 2);
        assert_eq!(p["output_format"], "webp");
        assert_eq!(p["upscaling_activated"], true);
        assert_eq!(p["sharpen"], 0.5);
        assert_eq!(p["face_enhancement_strength"], 0.5);
        assert!(p.get("creativity").is_none());
    }

    #[test]
    fn topaz_without_faces_omits_face_levels() {
        let settings = UpscaleSettings {
            scale: 2,
            format: OutputFormat::Png,
            engine: EngineOptions::Topaz(TopazOptions::default()),
        };
        let request = upscale_request(&settings, "https://x/a.png", Dimensions { width: 1, height: 1 });
        assert!(request.payload.get("face_enhancement_creativity").is_none());
    }

    #[test]
    fn bloom_payload() {
        let settings = UpscaleSettings {
            scale: 4,
            format: OutputFormat::Png,
            engine: EngineOptions::Bloom(BloomOptions {
                creativity: 6,
                prompt: Some("oil painting".into()),
                ..BloomOptions::default()
            }),
        };
        let request =
            upscale_request(&settings, "https://x/a.png", Dimensions { width: 4096, height: 4096 });
        assert_eq!(request.endpoint, "/generate/enhance/topaz/bloom-enhance");
        let p = &request.payload;
        assert_eq!(p["model"], "Reimagine");
        assert_eq!(p["creativity"], 6);
        assert_eq!(p["prompt"], "oil painting");
        assert_eq!(p["color_preservation"], false);
        assert!(p.get("sharpen").is_none());
    }
}
