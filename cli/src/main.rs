mod config;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use embedder::{EmbedOptions, Embedder};

use crate::config::Config;

const SUBCOMMANDS: &[&str] = &["render", "test", "help"];

#[derive(Parser)]
#[command(name = "metabind", version, about = "Embed template notes into Markdown")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log embedding decisions (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./metabind.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Embed templates into a Markdown note and print the result
    Render(RenderArgs),

    /// Run .test.md fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Markdown note to render
    file: String,

    /// Directory template notes are resolved against
    #[arg(long)]
    content_dir: Option<PathBuf>,

    /// Code block language marker
    #[arg(long = "lang")]
    language: Option<String>,

    /// Parse only, don't embed (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Dump the document tree after embedding
    #[arg(long)]
    ast: bool,

    /// Write the rendered Markdown here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    // `metabind note.md` is shorthand for `metabind render note.md`.
    let mut args: Vec<String> = std::env::args().collect();
    insert_render_shorthand(&mut args);

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    match cli.command {
        Command::Render(render_args) => do_render(render_args, config.embed, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

/// Insert `render` before the first positional argument unless it already
/// names a subcommand. The value of `--config` is not a positional.
fn insert_render_shorthand(args: &mut Vec<String>) {
    let first_positional = (1..args.len())
        .find(|&i| !args[i].starts_with('-') && args[i - 1] != "--config");
    if let Some(pos) = first_positional {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "render".to_string());
        }
    }
}

fn do_render(args: RenderArgs, mut options: EmbedOptions, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    if let Some(dir) = args.content_dir {
        options.content_dir = dir;
    }
    if let Some(language) = args.language {
        options.language = language;
    }

    // Read source
    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    // Set up codespan file database
    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    // Parse
    let parser = metabind::parser::Parser::new(source, file_id);
    let mut note = match parser.parse() {
        Ok(n) => n,
        Err(errors) => {
            let writer = StandardStream::stderr(color_choice);
            let config = term::Config::default();
            for error in &errors {
                let diagnostic = error.to_diagnostic();
                let _ =
                    term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            }
            process::exit(1);
        }
    };

    // --check: parse succeeded, exit
    if args.check {
        eprintln!("ok: {} parsed successfully", args.file);
        return;
    }

    let embedder = Embedder::new(options);
    let embedded = embedder.embed_note(&mut note);
    tracing::info!(file = %args.file, embedded, "rendered note");

    // --ast: dump tree
    if args.ast {
        println!("{:#?}", note.document);
        return;
    }

    let rendered = note.document.to_string();
    match args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, rendered) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
        }
        None => print!("{}", rendered),
    }
}
