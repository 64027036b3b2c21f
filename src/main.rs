use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use risc16_submit::dom::{Document, FieldValue};
use risc16_submit::highlight::{Grammar, MarkupHighlighter};
use risc16_submit::payload::{ResponsePayload, TestsResults};
use risc16_submit::platform::{ColorScheme, TerminalPlatform};
use risc16_submit::theme::{Theme, ThemeState};
use risc16_submit::transport::HttpTransport;
use risc16_submit::{ClientConfig, SubmissionClient};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "risc16-submit", version, about = "Submit RISC16 code and show the results")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Post the submission form and print the rendered results
    Submit(SubmitArgs),
    /// Classify each line of a source file with the RISC16 grammar
    Highlight {
        path: Option<PathBuf>,
        /// Print the pattern configuration as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Show the theme reached after a number of toggles
    Theme {
        #[arg(long)]
        dark: bool,
        #[arg(long, default_value_t = 0)]
        toggles: u32,
    },
}

#[derive(Args)]
struct SubmitArgs {
    /// Page holding the form: a local HTML file or an http(s) URL.
    /// Defaults to the root of the endpoint's server.
    #[arg(long)]
    page: Option<String>,
    #[arg(long, default_value = risc16_submit::DEFAULT_ENDPOINT)]
    endpoint: String,
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,
    /// Source file uploaded as the `file` field
    #[arg(long)]
    file: Option<PathBuf>,
    /// Inline source sent as `code_area`
    #[arg(long)]
    code: Option<String>,
    /// Exercise to test against
    #[arg(long)]
    exo: Option<String>,
    /// Maximum number of executed instructions
    #[arg(long)]
    exec: Option<u64>,
    #[arg(long)]
    archi: Option<String>,
    #[arg(long)]
    logic: Option<String>,
    /// Ask the backend for an execution trace
    #[arg(long)]
    trace: bool,
    /// Extra field as name=value (repeatable)
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,
    /// Report a dark color-scheme preference
    #[arg(long)]
    dark: bool,
    /// Print register snapshots and the highlighted code markup
    #[arg(long)]
    verbose: bool,
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got {:?}", s))
}

fn run_submit(args: SubmitArgs) -> anyhow::Result<()> {
    let config = ClientConfig {
        endpoint: args.endpoint.clone(),
        timeout_ms: args.timeout_ms,
        ..Default::default()
    };
    config.validate()?;
    let transport = HttpTransport::new(config.clone())?;

    let page = match &args.page {
        Some(p) if p.starts_with("http://") || p.starts_with("https://") => transport.fetch_page(p)?,
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("reading page {}", p))?,
        None => {
            let root = url::Url::parse(&config.endpoint)?.join("/")?;
            transport.fetch_page(root.as_str())?
        }
    };
    let document = Document::parse(&page)?;

    let scheme = args.dark.then_some(ColorScheme::Dark);
    let code_region = config.ids.code_result.clone();
    let mut client = SubmissionClient::new(
        config,
        document,
        Arc::new(transport),
        Arc::new(MarkupHighlighter::new(&code_region)),
        &TerminalPlatform::new(scheme),
    );

    if let Some(path) = args.file {
        client.set_field("file", FieldValue::File(Some(path)))?;
    }
    let typed = [
        ("code_area", args.code),
        ("exo", args.exo),
        ("exec", args.exec.map(|n| n.to_string())),
        ("archi", args.archi),
        ("logic", args.logic),
        ("trace", args.trace.then(|| "1".to_string())),
    ];
    for (name, value) in typed {
        if let Some(v) = value {
            client.set_field(name, FieldValue::Text(v))?;
        }
    }
    for (name, value) in args.fields {
        client.set_field(&name, FieldValue::Text(value))?;
    }

    let payload = client.submit()?;
    print_payload(&payload, args.verbose);
    if args.verbose {
        if let Some(el) = client.document().element(&code_region) {
            println!("--- highlighted ---\n{}", el.inner_html());
        }
    }
    Ok(())
}

fn print_payload(payload: &ResponsePayload, verbose: bool) {
    if let Some(code) = &payload.code_content {
        println!("--- code ---\n{}", code);
    }
    match &payload.tests_results {
        Some(TestsResults::Cases(cases)) => {
            println!("--- tests ---");
            for case in cases {
                println!("{}", case.summary());
                if verbose {
                    println!("    pc={} registers={:?}", case.pc, case.registers);
                }
            }
        }
        Some(TestsResults::Text(text)) => println!("--- tests ---\n{}", text),
        None => {}
    }
    if let Some(state) = &payload.end_state {
        println!("--- end state ---\n{}", state);
    }
}

fn run_highlight(path: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let grammar = Grammar::risc16();
    if json {
        println!("{}", serde_json::to_string_pretty(&grammar.to_config())?);
        return Ok(());
    }
    let path = path.context("a source file is required unless --json is given")?;
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    for (line, kind) in grammar.classify_lines(&text) {
        println!("{:>8} | {}", kind.map(|k| k.name()).unwrap_or("-"), line);
    }
    Ok(())
}

fn run_theme(dark: bool, toggles: u32) -> anyhow::Result<()> {
    let scheme = dark.then_some(ColorScheme::Dark);
    let query = risc16_submit::platform::StaticMediaQuery::new(scheme);
    let mut state = ThemeState::from_preference(&query);
    let mut doc = Document::new();
    state.apply_initial(&mut doc, "theme-switch");
    for _ in 0..toggles {
        state.switch_mode(&mut doc, "theme-switch");
    }
    let name = match state.mode() {
        Theme::Light => "light",
        Theme::Dark => "dark",
    };
    println!("{} {}", name, state.mode().glyph());
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let res = match cli.command {
        Command::Submit(args) => run_submit(args),
        Command::Highlight { path, json } => run_highlight(path, json),
        Command::Theme { dark, toggles } => run_theme(dark, toggles),
    };
    if let Err(e) = res {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
