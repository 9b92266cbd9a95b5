use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args as ClapArgs, Parser, Subcommand};
use nest_core::{LogLikelihood, NestError, PriorTransform};
use nest_engine::{Model, RunConfig, RunSummary};
use nest_models::{
    CompositePrior, Constant, GaussianBlock, GaussianShell, IsotropicGaussian, LogUniformBlock,
    PriorBlock, Rosenbrock, UniformBlock,
};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "nest-sim", about = "Nested sampling engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a sampling run described by a YAML job file.
    Run(RunArgs),
    /// Resume an interrupted run from its checkpoint.
    Resume(RunArgs),
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// YAML job file describing the model and the run configuration.
    #[arg(long)]
    job: PathBuf,
    /// Override the output directory from the job file.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Override the master seed from the job file.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct JobFile {
    model: ModelSpec,
    #[serde(default = "default_run_config")]
    run: RunConfig,
}

fn default_run_config() -> RunConfig {
    RunConfig::default()
}

#[derive(Debug, Deserialize)]
struct ModelSpec {
    likelihood: LikelihoodSpec,
    prior: PriorSpec,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum LikelihoodSpec {
    Constant,
    Gaussian {
        #[serde(default = "default_sigma")]
        sigma: f64,
    },
    Shell {
        radius: f64,
        width: f64,
    },
    Rosenbrock,
}

fn default_sigma() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct PriorSpec {
    blocks: Vec<PriorBlockSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum PriorBlockSpec {
    Uniform { ndims: usize, min: f64, max: f64 },
    Gaussian { ndims: usize, mean: f64, sigma: f64 },
    LogUniform { ndims: usize, min: f64, max: f64 },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => execute(args, false),
        Command::Resume(args) => execute(args, true),
    }
}

fn execute(args: RunArgs, resume: bool) -> Result<(), Box<dyn Error>> {
    let job_text = fs::read_to_string(&args.job)?;
    let job: JobFile = serde_yaml::from_str(&job_text)?;

    let mut config = job.run;
    if let Some(out) = args.out {
        config.output.base_dir = out;
    }
    if let Some(seed) = args.seed {
        config.seed_policy.master_seed = seed;
    }

    let model = Arc::new(build_model(&job.model)?);
    let summary = if resume {
        nest_engine::resume(&config, model)?
    } else {
        nest_engine::run(&config, model)?
    };

    write_summary(&config.output.base_dir, &config.output.file_root, &summary)?;
    Ok(())
}

fn build_model(spec: &ModelSpec) -> Result<Model, NestError> {
    let mut blocks: Vec<Box<dyn PriorBlock>> = Vec::with_capacity(spec.prior.blocks.len());
    for block in &spec.prior.blocks {
        blocks.push(match *block {
            PriorBlockSpec::Uniform { ndims, min, max } => {
                Box::new(UniformBlock::new(ndims, min, max)?)
            }
            PriorBlockSpec::Gaussian { ndims, mean, sigma } => {
                Box::new(GaussianBlock::new(ndims, mean, sigma)?)
            }
            PriorBlockSpec::LogUniform { ndims, min, max } => {
                Box::new(LogUniformBlock::new(ndims, min, max)?)
            }
        });
    }
    let prior = CompositePrior::new(blocks)?;
    let likelihood: Box<dyn LogLikelihood> = match spec.likelihood {
        LikelihoodSpec::Constant => Box::new(Constant),
        LikelihoodSpec::Gaussian { sigma } => Box::new(IsotropicGaussian::new(sigma)),
        LikelihoodSpec::Shell { radius, width } => Box::new(GaussianShell::new(radius, width)),
        LikelihoodSpec::Rosenbrock => Box::new(Rosenbrock),
    };
    Model::new(Box::new(prior) as Box<dyn PriorTransform>, likelihood)
}

fn write_summary(
    base_dir: &Path,
    file_root: &str,
    summary: &RunSummary,
) -> Result<(), Box<dyn Error>> {
    let path = base_dir.join(format!("{file_root}_summary.json"));
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(&path, json)?;
    println!(
        "nest-sim: logZ = {:.6} +/- {:.6} ({} dead points, summary at {})",
        summary.log_z,
        summary.log_z_err,
        summary.ndead,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_file_parses_with_defaults() {
        let text = r#"
model:
  likelihood: { type: gaussian, sigma: 1.0 }
  prior:
    blocks:
      - { type: uniform, ndims: 5, min: -10.0, max: 10.0 }
run:
  nlive: 100
"#;
        let job: JobFile = serde_yaml::from_str(text).unwrap();
        assert_eq!(job.run.nlive, 100);
        assert_eq!(job.run.precision_criterion, 1e-3);
        let model = build_model(&job.model).unwrap();
        assert_eq!(model.ndims(), 5);
        assert_eq!(model.nderived(), 0);
    }

    #[test]
    fn shell_job_carries_a_derived_parameter() {
        let text = r#"
model:
  likelihood: { type: shell, radius: 2.0, width: 0.1 }
  prior:
    blocks:
      - { type: uniform, ndims: 2, min: -6.0, max: 6.0 }
"#;
        let job: JobFile = serde_yaml::from_str(text).unwrap();
        let model = build_model(&job.model).unwrap();
        assert_eq!(model.ndims(), 2);
        assert_eq!(model.nderived(), 1);
    }
}
