use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use atty::Stream;
use clap::{Parser, Subcommand, ValueEnum};
use findict_rs::web::{self, WebConfig, WebTheme};
use findict_rs::{
    Config, DefinitionResult, DefinitionService, DisplaySegment, GeminiClient, InteractionState,
    SearchSession, format, messages,
};
use termimad::MadSkin;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "findict-rs", about = "AI financial term dictionary", version)]
pub struct Cli {
    /// Model identifier; overrides FINDICT_MODEL.
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the web UI.
    Serve {
        /// Listen address; overrides FINDICT_ADDR.
        #[arg(long)]
        addr: Option<SocketAddr>,
        /// Public base URL; overrides FINDICT_BASE_URL.
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long, value_enum, default_value_t = ThemeArg::Tailwind)]
        theme: ThemeArg,
    },
    /// Explain one term in the terminal.
    Lookup {
        /// Term to look up.
        term: String,
        /// Print the full explanation instead of the summary.
        #[arg(long)]
        expanded: bool,
        /// Emit the resulting state as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ThemeArg {
    Tailwind,
    Bootstrap,
}

impl From<ThemeArg> for WebTheme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Tailwind => WebTheme::Tailwind,
            ThemeArg::Bootstrap => WebTheme::Bootstrap,
        }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(model) = cli.model {
        config.model = model;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        Command::Serve {
            addr,
            base_url,
            theme,
        } => {
            init_tracing("findict_rs=info,tower_http=info");
            let web_config = WebConfig {
                addr: addr.unwrap_or(config.addr),
                theme: theme.into(),
                base_url: base_url
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| config.base_url.clone()),
            };
            let session = build_session(&config);
            runtime.block_on(web::serve(web_config, session))?;
            Ok(())
        }
        Command::Lookup {
            term,
            expanded,
            json,
        } => {
            init_tracing("findict_rs=warn");
            let session = build_session(&config);
            let state = runtime.block_on(async {
                let state = session.search(&term).await;
                if expanded {
                    session.toggle_expand()
                } else {
                    state
                }
            });
            handle_lookup(&state, json)
        }
    }
}

fn build_session(config: &Config) -> SearchSession {
    let client = GeminiClient::new(&config.api_key, &config.model, &config.api_base);
    SearchSession::new(DefinitionService::new(Arc::new(client)))
}

fn init_tracing(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_lookup(state: &InteractionState, as_json: bool) -> Result<(), Box<dyn Error>> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(state)?);
    }
    match state {
        InteractionState::Success { result, expanded } => {
            if !as_json {
                print_result(result, *expanded);
            }
            Ok(())
        }
        InteractionState::Failed { message, .. } => Err(message.clone().into()),
        InteractionState::Idle | InteractionState::Loading { .. } => {
            Err(messages::UNKNOWN_ERROR.into())
        }
    }
}

fn print_result(result: &DefinitionResult, expanded: bool) {
    let skin = markdown_skin();
    let styled = stdout_is_tty();
    if styled {
        println!("{}\n", skin.bold.apply_to(result.term.as_str()));
    } else {
        println!("{}\n", result.term);
    }
    let text = result.visible_text(expanded);
    println!("{}", render_segments(&format(text), &skin, styled));
    if let Some(hint) = expand_hint(result, expanded) {
        println!("\n{hint}");
    }
}

/// The `--expanded` hint, offered only when a summary is being shown in
/// place of the full explanation.
fn expand_hint(result: &DefinitionResult, expanded: bool) -> Option<String> {
    (!expanded && result.has_summary()).then(|| format!("({} : --expanded)", messages::SHOW_MORE))
}

fn render_segments(segments: &[DisplaySegment], skin: &MadSkin, styled: bool) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            DisplaySegment::PlainText(text) => out.push_str(text),
            DisplaySegment::BoldText(text) if styled => {
                out.push_str(&skin.bold.apply_to(text.as_str()).to_string());
            }
            DisplaySegment::BoldText(text) => out.push_str(text),
            DisplaySegment::LineBreak => out.push('\n'),
        }
    }
    out
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_skin() -> MadSkin {
    MadSkin::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unstyled_render_keeps_text_and_breaks() {
        let rendered = render_segments(&format("**ESG** 경영\n요약"), &markdown_skin(), false);
        assert_eq!(rendered, "ESG 경영\n요약");
    }

    fn result(summary: &str) -> DefinitionResult {
        DefinitionResult {
            term: "ESG".to_string(),
            full_text: "**ESG**는 환경, 사회, 지배구조를 뜻합니다.".to_string(),
            summary_text: summary.to_string(),
        }
    }

    #[test]
    fn expand_hint_needs_a_summary() {
        let hint = expand_hint(&result("ESG 요약"), false).unwrap();
        assert!(hint.contains(messages::SHOW_MORE));
        assert!(hint.contains("--expanded"));
        assert_eq!(expand_hint(&result("ESG 요약"), true), None);
        assert_eq!(expand_hint(&result(""), false), None);
        assert_eq!(expand_hint(&result("  \n"), false), None);
    }

    #[test]
    fn failed_lookup_surfaces_message() {
        let state = InteractionState::Failed {
            term: String::new(),
            message: messages::EMPTY_TERM.to_string(),
        };
        let err = handle_lookup(&state, false).unwrap_err();
        assert_eq!(err.to_string(), messages::EMPTY_TERM);
    }

    #[test]
    fn cli_parses_lookup_flags() {
        let cli = Cli::try_parse_from(["findict-rs", "lookup", "ESG", "--expanded"]).unwrap();
        match cli.command {
            Command::Lookup { term, expanded, json } => {
                assert_eq!(term, "ESG");
                assert!(expanded);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
