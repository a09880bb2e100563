//! Question-and-answer flow that picks upscale settings.

use std::io::{BufRead, Write};
use std::str::FromStr;

use crate::error::KreaError;
use crate::model::{Engine, TopazModel};
use crate::params::OutputFormat;
use crate::presets::{self, Preset};
use crate::request::{BloomOptions, EngineOptions, TopazOptions, UpscaleSettings, DEFAULT_SCALE};

/// Ask for upscale settings on `input`, writing prompts to `output`.
///
/// # Errors
///
/// Returns an error if input ends before every question is answered.
pub fn ask_upscale_settings<R: BufRead, W: Write>(
    input: R,
    output: W,
    format: OutputFormat,
) -> Result<UpscaleSettings, KreaError> {
    let mut prompter = Prompter { input, output };
    let presets = presets::all();

    prompter.say("\n=== Interactive Upscale ===\n\nWhat type of image is this?\n")?;
    for (i, preset) in presets.iter().enumerate() {
        prompter.say(&format!("  {}. {} [{}]", i + 1, preset.description, preset.engine.name()))?;
    }
    prompter.say("\n  0. Custom settings")?;

    let choice: usize = prompter.ask_number(
        &format!("Select option (1-{}, or 0 for custom)", presets.len()),
        0,
        presets.len(),
        None,
    )?;
    let scale = prompter.ask_number("Scale factor (1-32, default 2)", 1, 32, Some(DEFAULT_SCALE))?;

    let engine = match choice.checked_sub(1).and_then(|i| presets.get(i)) {
        Some(preset) => from_preset(&mut prompter, preset)?,
        None => custom(&mut prompter)?,
    };
    Ok(UpscaleSettings { scale, format, engine })
}

fn from_preset<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    preset: &Preset,
) -> Result<EngineOptions, KreaError> {
    prompter.say(&format!("\nUpscale engine (recommended: {}):", preset.engine.name()))?;
    prompter.say("  1. Topaz - fast, precise, $0.15\n  2. Bloom - slow, creative, $0.75")?;
    let engine = prompter.ask_engine("Select engine (1-2)", Some(preset.engine))?;
    prompter.say(&format!("\nUsing {} preset with {}.", preset.name, engine.name()))?;
    Ok(match engine {
        Engine::Topaz => EngineOptions::Topaz(preset.topaz.clone()),
        Engine::Bloom => EngineOptions::Bloom(preset.bloom.clone()),
    })
}

fn custom<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>) -> Result<EngineOptions, KreaError> {
    prompter.say("\n--- Custom Upscale Settings ---\n\nSelect engine:")?;
    prompter.say("  1. Topaz - precise enhancement\n  2. Bloom - creative, adds details")?;
    match prompter.ask_engine("Engine (1-2)", None)? {
        Engine::Topaz => {
            prompter.say("\nTopaz model:")?;
            for (i, model) in TopazModel::ALL.iter().enumerate() {
                prompter.say(&format!("  {}. {}", i + 1, model.api_name()))?;
            }
            let defaults = TopazOptions::default();
            let model: usize = prompter.ask_number("Model (1-5, default 1)", 1, TopazModel::ALL.len(), Some(1))?;
            Ok(EngineOptions::Topaz(TopazOptions {
                model: TopazModel::ALL[model - 1],
                sharpen: prompter.ask_number("Sharpen (0.0-1.0, default 0.5)", 0.0, 1.0, Some(defaults.sharpen))?,
                denoise: prompter.ask_number("Denoise (0.0-1.0, default 0.3)", 0.0, 1.0, Some(defaults.denoise))?,
                fix_compression: prompter.ask_number(
                    "Fix compression (0.0-1.0, default 0.5)",
                    0.0,
                    1.0,
                    Some(defaults.fix_compression),
                )?,
                face_enhancement: prompter.ask_yes_no("Enable face enhancement? (y/N)")?,
            }))
        }
        Engine::Bloom => {
            let defaults = BloomOptions::default();
            let creativity =
                prompter.ask_number("Creativity (1-9, default 3)", 1, 9, Some(defaults.creativity))?;
            let face_preservation = prompter.ask_yes_no("Enable face preservation? (y/N)")?;
            let color_preservation = prompter.ask_yes_no("Enable color preservation? (y/N)")?;
            let prompt = prompter.ask("Optional prompt (press Enter to skip)")?;
            Ok(EngineOptions::Bloom(BloomOptions {
                creativity,
                face_preservation,
                color_preservation,
                prompt: Some(prompt).filter(|p| !p.is_empty()),
            }))
        }
    }
}

struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    fn say(&mut self, text: &str) -> Result<(), KreaError> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }

    /// One trimmed line of input.
    fn ask(&mut self, question: &str) -> Result<String, KreaError> {
        write!(self.output, "\n{question}: ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(KreaError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "input ended before upscale settings were chosen",
            )));
        }
        Ok(line.trim().to_string())
    }

    /// A number within `min..=max`; an empty answer takes `default` if there is one.
    fn ask_number<T>(&mut self, question: &str, min: T, max: T, default: Option<T>) -> Result<T, KreaError>
    where
        T: FromStr + PartialOrd + Copy + std::fmt::Display,
    {
        loop {
            let answer = self.ask(question)?;
            if answer.is_empty() {
                if let Some(value) = default {
                    return Ok(value);
                }
            }
            match answer.parse::<T>() {
                Ok(value) if value >= min && value <= max => return Ok(value),
                _ => self.say(&format!("Please enter a number between {min} and {max}"))?,
            }
        }
    }

    fn ask_engine(&mut self, question: &str, default: Option<Engine>) -> Result<Engine, KreaError> {
        loop {
            match (self.ask(question)?.as_str(), default) {
                ("", Some(engine)) => return Ok(engine),
                ("1", _) => return Ok(Engine::Topaz),
                ("2", _) => return Ok(Engine::Bloom),
                _ => self.say("Please enter 1 or 2")?,
            }
        }
    }

    fn ask_yes_no(&mut self, question: &str) -> Result<bool, KreaError> {
        let answer = self.ask(question)?.to_ascii_lowercase();
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }
}
