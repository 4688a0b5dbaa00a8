//! Command-line entry point for point-cloud extraction.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

mod convert;
mod sample;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "sample-points" => {
            let flags = parse_flags(&args[2..])?;
            let options = sample::Options {
                data_dir: PathBuf::from(required(&flags, "--data-dir")?),
                output_dir: PathBuf::from(required(&flags, "--output-dir")?),
                train_dir: PathBuf::from(required(&flags, "--train-dir")?),
                point_cloud_filename: required(&flags, "--point-cloud-filename")?,
                frame_step: match flags.get("--frame-step") {
                    Some(value) => value
                        .parse()
                        .with_context(|| format!("invalid --frame-step `{value}`"))?,
                    None => 1,
                },
            };
            sample::run(&options)
        }
        "visualize-point-cloud" => {
            let flags = parse_flags(&args[2..])?;
            let path = PathBuf::from(required(&flags, "--point-cloud-path")?);
            convert::run(&path)
        }
        other => {
            print_usage(&args[0]);
            bail!("unknown command `{other}`");
        }
    }
}

fn parse_flags(args: &[String]) -> Result<HashMap<String, String>> {
    let mut flags = HashMap::new();
    let mut iter = args.iter();
    while let Some(key) = iter.next() {
        if !key.starts_with("--") {
            bail!("unexpected argument `{key}`");
        }
        let value = iter
            .next()
            .with_context(|| format!("missing value for `{key}`"))?;
        flags.insert(key.clone(), value.clone());
    }
    Ok(flags)
}

fn required(flags: &HashMap<String, String>, name: &str) -> Result<String> {
    flags
        .get(name)
        .cloned()
        .with_context(|| format!("missing required flag `{name}`"))
}

fn print_usage(program: &str) {
    eprintln!("Usage: {program} <command> [flags]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  sample-points          --data-dir <dir> --output-dir <dir> --train-dir <dir>");
    eprintln!("                         --point-cloud-filename <file> [--frame-step <n>]");
    eprintln!("  visualize-point-cloud  --point-cloud-path <file>");
}
