//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::PipelineConfig;
use crate::dsp::{Outcome, Pipeline, Preset};
use crate::engine::{export_wav, import_wav, Seed, Waveform};
use crate::error::Result;

/// Options for `augment`
#[derive(Debug, Clone)]
pub struct AugmentOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub preset: Preset,
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub mix: Vec<PathBuf>,
    pub mix_dir: Option<PathBuf>,
    pub count: usize,
    pub bit_depth: u16,
}

/// Augment one WAV file into `count` variants.
///
/// # Returns
/// Paths of the files written
pub fn augment(options: &AugmentOptions) -> Result<Vec<PathBuf>> {
    let mut mix_paths = options.mix.clone();
    if let Some(dir) = &options.mix_dir {
        mix_paths.extend(collect_wavs(dir)?);
    }

    let loaded = import_wav(&options.input)?;
    info!(
        "Loaded {} ({} ch, {:.2}s, {} Hz)",
        options.input.display(),
        loaded.waveform.num_channels(),
        loaded.waveform.duration_secs(loaded.sample_rate),
        loaded.sample_rate
    );

    let pipeline = load_pipeline(options, &mix_paths, loaded.sample_rate)?;

    let seed = options.seed.map(Seed::new).unwrap_or_else(Seed::from_entropy);
    info!("Using seed {}", seed.value());
    let mut rng = seed.to_rng();

    let count = options.count.max(1);
    let mut written = Vec::with_capacity(count);
    for index in 0..count {
        let (output, reports) =
            pipeline.apply_with_report(&loaded.waveform, loaded.sample_rate, &mut rng);

        let applied: Vec<String> = reports
            .iter()
            .filter(|r| r.outcome == Outcome::Applied)
            .map(|r| r.kind.to_string())
            .collect();
        for report in &reports {
            if let Outcome::Recovered { code } = report.outcome {
                warn!("{} fell back to its input ({})", report.kind, code);
            }
        }

        let path = variant_path(&options.output, index, count);
        export_wav(&path, &output, loaded.sample_rate, options.bit_depth)?;
        println!(
            "Wrote {} [{}]",
            path.display(),
            if applied.is_empty() {
                "unchanged".to_string()
            } else {
                applied.join(", ")
            }
        );
        written.push(path);
    }

    Ok(written)
}

/// Print the JSON config of a preset.
pub fn print_preset(name: &str, include_mix: bool) -> Result<()> {
    let preset: Preset = name.parse()?;
    let config = PipelineConfig::from_pipeline(&preset.build(include_mix));
    println!("{}", config.to_json_string()?);
    Ok(())
}

/// Build the pipeline from a config file or preset and attach the mix pool.
///
/// Mix samples are used as-is; a sample rate differing from `sample_rate`
/// is only reported.
fn load_pipeline(
    options: &AugmentOptions,
    mix_paths: &[PathBuf],
    sample_rate: u32,
) -> Result<Pipeline> {
    let include_mix = !mix_paths.is_empty();
    let mut pipeline = match &options.config {
        Some(path) => {
            info!("Loading pipeline config: {}", path.display());
            PipelineConfig::from_file(path)?.build()?
        }
        None => options.preset.build(include_mix),
    };

    if include_mix {
        let pool = mix_paths
            .iter()
            .map(|path| load_mix_sample(path, sample_rate))
            .collect::<Result<Vec<Waveform>>>()?;
        let updated = pipeline.set_mix_samples(pool);
        if updated == 0 {
            warn!("Mix samples given but the pipeline has no mix transform");
        } else {
            info!("Loaded {} mix samples", mix_paths.len());
        }
    }

    Ok(pipeline)
}

/// Load one mix-pool WAV, warning when its rate differs from `sample_rate`
fn load_mix_sample(path: &Path, sample_rate: u32) -> Result<Waveform> {
    let loaded = import_wav(path)?;
    if loaded.sample_rate != sample_rate {
        warn!(
            "Mix sample {} is {} Hz but the input is {} Hz; mixing without resampling",
            path.display(),
            loaded.sample_rate,
            sample_rate
        );
    }
    Ok(loaded.waveform)
}

/// All `.wav` files under `dir`, sorted by path.
pub fn collect_wavs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(std::io::Error::from)?;
        let is_wav = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if entry.file_type().is_file() && is_wav {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// `out.wav` for a single variant, `out_1.wav`, `out_2.wav`, ... otherwise.
pub fn variant_path(output: &Path, index: usize, count: usize) -> PathBuf {
    if count <= 1 {
        return output.to_path_buf();
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "augmented".to_string());
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "wav".to_string());
    output.with_file_name(format!("{}_{}.{}", stem, index + 1, ext))
}
