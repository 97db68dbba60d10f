// SPDX-License-Identifier: MIT OR Apache-2.0
//! rigforge CLI
//!
//! Inspect, convert and build rig definition files.

mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use rigforge_graph::{Builder, DefinitionKind, Format, Profiler, Rig, RigContext, TraceBuilder};
use settings::Settings;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Settings file (defaults to ./rigforge.ron when present)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Print a timing report when done
    #[clap(long, global = true)]
    profile: bool,

    /// Command to execute
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Print components, ports and connections of a definition file
    Inspect {
        /// Definition file (.json or .ron)
        file: PathBuf,
    },
    /// Rewrite a definition file, optionally as build data
    Convert {
        /// Input definition file
        input: PathBuf,
        /// Output file; the extension picks the format
        output: PathBuf,
        /// Write build data instead of the guide
        #[clap(long)]
        build: bool,
    },
    /// Run the trace builder on a definition file
    Build {
        /// Definition file (.json or .ron)
        file: PathBuf,
    },
}

fn init_tracing(log_filter: &str) -> Result<()> {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in log_filter.split(',').filter(|d| !d.trim().is_empty()) {
        env_filter = env_filter.add_directive(
            directive
                .trim()
                .parse()
                .with_context(|| format!("invalid log filter directive '{directive}'"))?,
        );
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

fn load_rig(ctx: &mut RigContext, settings: &Settings, path: &Path) -> Result<Rig> {
    let mut rig = Rig::new(settings.default_rig_name.as_str());
    rig.load_definition_file(ctx, path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    Ok(rig)
}

/// An extensionless output path gets the default format's extension
fn output_path(path: &Path, default_format: Format) -> PathBuf {
    if path.extension().is_some() {
        return path.to_path_buf();
    }
    let extension = match default_format {
        Format::Json => "json",
        Format::Ron => "ron",
    };
    path.with_extension(extension)
}

fn inspect(rig: &Rig) {
    println!("{} ({} components)", rig.name(), rig.component_count());
    for component in rig.components() {
        println!("  {} [{}]", component.decorated_name(), component.type_name());
        for input in component.inputs() {
            println!("    in  {}: {}", input.name(), input.data_type());
        }
        for output in component.outputs() {
            println!("    out {}: {}", output.name(), output.data_type());
        }
    }
    let records = rig.connection_records();
    if !records.is_empty() {
        println!("connections:");
        for record in records {
            println!("  {record} [{}]", record.target_index);
        }
    }
}

fn run(cmd: Command, settings: &Settings, ctx: &mut RigContext) -> Result<()> {
    match cmd {
        Command::Inspect { file } => {
            let rig = load_rig(ctx, settings, &file)?;
            inspect(&rig);
        }
        Command::Convert {
            input,
            output,
            build,
        } => {
            let rig = load_rig(ctx, settings, &input)?;
            let kind = if build {
                DefinitionKind::Build
            } else {
                DefinitionKind::Guide
            };
            let output = output_path(&output, settings.default_format);
            rig.write_definition_file(ctx, &output, kind)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("wrote {}", output.display());
        }
        Command::Build { file } => {
            let rig = load_rig(ctx, settings, &file)?;
            let build_data = rig.get_rig_build_data();

            let mut builder = TraceBuilder::new(std::mem::take(ctx));
            let result = builder.build(&build_data);
            *ctx = builder.into_context();

            let report = result.with_context(|| format!("failed to build {}", file.display()))?;
            print!("{report}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let cwd = std::env::current_dir().context("failed to read the working directory")?;
    let settings = Settings::resolve(args.config.as_deref(), &cwd).context("failed to load settings")?;
    init_tracing(&settings.log_filter)?;
    tracing::debug!(?settings, "settings resolved");

    let profiler = if args.profile {
        Profiler::new()
    } else {
        Profiler::disabled()
    };
    let mut ctx = RigContext::default()
        .with_profiler(profiler)
        .with_policy(settings.connection_policy);

    let result = run(args.cmd, &settings, &mut ctx);
    if ctx.profiler.is_enabled() {
        eprint!("{}", ctx.profiler.report());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_extension() {
        assert_eq!(
            output_path(Path::new("out"), Format::Ron),
            PathBuf::from("out.ron")
        );
        assert_eq!(
            output_path(Path::new("out.json"), Format::Ron),
            PathBuf::from("out.json")
        );
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["rigforge", "--profile", "convert", "a.json", "b.ron", "--build"])
            .unwrap();
        assert!(args.profile);
        assert!(matches!(args.cmd, Command::Convert { build: true, .. }));
    }

    #[test]
    fn test_convert_then_build() {
        let dir = tempfile::tempdir().unwrap();
        let guide = dir.path().join("rig.json");
        std::fs::write(
            &guide,
            r#"{
  "name": "hero",
  "components": [
    {"class": "rigforge.components.main_srt.MainSrtComponentGuide", "name": "mainSrt", "location": "M"}
  ]
}"#,
        )
        .unwrap();

        let settings = Settings {
            default_format: Format::Ron,
            ..Settings::default()
        };
        let mut ctx = RigContext::default();
        let output = dir.path().join("rig_build");
        run(
            Command::Convert {
                input: guide,
                output: output.clone(),
                build: true,
            },
            &settings,
            &mut ctx,
        )
        .unwrap();

        let written = output.with_extension("ron");
        assert!(written.is_file());
        run(Command::Build { file: written }, &settings, &mut ctx).unwrap();
    }

    #[test]
    fn test_missing_file_reports_path() {
        let mut ctx = RigContext::default();
        let err = run(
            Command::Inspect {
                file: PathBuf::from("does/not/exist.json"),
            },
            &Settings::default(),
            &mut ctx,
        )
        .unwrap_err();
        assert!(err.to_string().contains("exist.json"));
    }
}
