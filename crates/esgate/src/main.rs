//! `esgate` — parse or tokenize a JavaScript file with feature gating and
//! print the ESTree JSON.
//!
//! Usage:
//!   esgate parse `<file>` [--options `<json>`] [--range] [--loc] [--feature jsx] ...
//!   esgate tokenize `<file>` [--options `<json>`] [--tolerant] ...
//!
//! Set `RUST_LOG=debug` to see the resolved configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use esgate_core::parser::SourceType;
use esgate_core::{Feature, ParseOptions, parse, tokenize};
use log::info;

#[derive(Parser)]
#[command(name = "esgate", version, about = "Feature-gated ECMAScript parser")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a file and print the Program as JSON.
    Parse(Input),
    /// Tokenize a file and print the token list as JSON.
    Tokenize(Input),
}

#[derive(Args)]
struct Input {
    /// Source file to read.
    file: PathBuf,

    /// JSON file holding an options object; flags below override it.
    #[arg(long, value_name = "JSON")]
    options: Option<PathBuf>,

    /// Attach `range` to nodes and tokens.
    #[arg(long)]
    range: bool,

    /// Attach `loc` to nodes and tokens.
    #[arg(long)]
    loc: bool,

    /// Collect comments.
    #[arg(long)]
    comment: bool,

    /// Collect tokens (parse only).
    #[arg(long)]
    tokens: bool,

    /// Attach comments to nodes (parse only).
    #[arg(long)]
    attach_comment: bool,

    /// Report the first tokenizer error instead of failing.
    #[arg(long)]
    tolerant: bool,

    /// Treat the source as a module.
    #[arg(long)]
    module: bool,

    /// Switch a feature: `name` or `name=false`.  Repeatable.
    #[arg(long = "feature", short = 'f', value_name = "NAME[=BOOL]")]
    features: Vec<String>,

    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,
}

impl Input {
    fn resolve_options(&self) -> Result<ParseOptions> {
        let mut opts = match &self.options {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading options {}", path.display()))?;
                ParseOptions::from_json(&json)
                    .with_context(|| format!("parsing options {}", path.display()))?
            }
            None => ParseOptions::default(),
        };
        opts.range |= self.range;
        opts.loc |= self.loc;
        opts.comment |= self.comment;
        opts.tokens |= self.tokens;
        opts.attach_comment |= self.attach_comment;
        opts.tolerant |= self.tolerant;
        if self.module {
            opts.source_type = SourceType::Module;
        }
        if opts.loc && opts.source.is_none() {
            opts.source = Some(self.file.display().to_string());
        }
        for spec in &self.features {
            let (feature, enabled) = parse_feature(spec)?;
            opts.ecma_features.set(feature, enabled);
        }
        Ok(opts)
    }
}

fn parse_feature(spec: &str) -> Result<(Feature, bool)> {
    let (name, value) = match spec.split_once('=') {
        Some((name, value)) => (name, value),
        None => (spec, "true"),
    };
    let enabled = match value {
        "true" => true,
        "false" => false,
        other => bail!("feature value must be true or false, got '{other}'"),
    };
    Ok((name.parse::<Feature>()?, enabled))
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Parse(input) => {
            let source = read_source(&input.file)?;
            let opts = input.resolve_options()?;
            let program = parse(&source, &opts)
                .with_context(|| format!("{}", input.file.display()))?;
            info!("parsed {}", input.file.display());
            print_json(&program, input.pretty)
        }
        Command::Tokenize(input) => {
            let source = read_source(&input.file)?;
            let opts = input.resolve_options()?;
            let list = tokenize(&source, &opts)
                .with_context(|| format!("{}", input.file.display()))?;
            info!("tokenized {}", input.file.display());
            print_json(&list, input.pretty)
        }
    }
}
