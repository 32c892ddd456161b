//! review-chat: terminal chat view for the phone reviews assistant.
//! Reads config, then either answers one question given on the command line
//! or runs an interactive chat over stdin lines.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use review_chat_client::clipboard::SystemClipboard;
use review_chat_client::prefs::{default_prefs_path, PrefStore};
use review_chat_client::render;
use review_chat_client::{config, ApiClient, ChatResponse, ChatSession, ClientError, PendingQuery};

const HELP: &str = "Commands:
  /send         send the current draft
  /prompts      list suggested prompts
  /prompt N     put suggested prompt N in the draft
  /sources N    show or hide the sources of message N
  /copy N       copy message N to the clipboard
  /theme        switch between dark and light
  /new          start a new chat
  /status       show whether an answer is pending
  /quit         exit
End a line with \\ to continue on the next line.";

#[derive(Debug, Parser)]
#[command(name = "review-chat", version, about = "Chat with the phone reviews assistant")]
struct Args {
    /// Config file (default: ~/.review-chat/config.yaml)
    #[arg(long, env = "REVIEW_CHAT_CONFIG")]
    config: Option<PathBuf>,

    /// API base URL, overriding the config file
    #[arg(long)]
    api_base: Option<String>,

    /// Preferences file holding the theme
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Only check that the API is reachable
    #[arg(long)]
    check: bool,

    /// Ask this question once and exit
    question: Vec<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn load_config(args: &Args) -> config::Config {
    // An explicit path must exist; the default path is optional.
    let (path, explicit) = match &args.config {
        Some(p) => (Some(p.clone()), true),
        None => (config::default_config_path(), false),
    };
    let Some(path) = path else {
        return config::Config::default();
    };
    if !explicit && !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return config::Config::default();
    }
    match config::load(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: failed to load config from {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn main() {
    init_tracing();
    let args = Args::parse();
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let cfg = load_config(&args);

    let Some(base_url) = cfg.resolve_api_base(args.api_base.as_deref()) else {
        eprintln!(
            "Error: no API base URL (use --api-base, set {} or api.base_url in the config)",
            config::API_BASE_ENV
        );
        process::exit(1);
    };
    let client = match ApiClient::new(&base_url, cfg.api.timeout()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let prefs_path = args
        .prefs
        .clone()
        .or_else(|| cfg.ui.prefs_path.clone())
        .or_else(default_prefs_path);
    let session = match prefs_path {
        Some(path) => ChatSession::with_prefs(PrefStore::open(path)),
        None => ChatSession::new(Default::default()),
    }
    .with_suggested_prompts(cfg.ui.suggested_prompts.clone());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Error: failed to create runtime: {}", e);
            process::exit(1);
        });

    let code = rt.block_on(async {
        if args.check {
            run_check(&client).await
        } else if !args.question.is_empty() {
            run_once(session, &client, &args.question.join(" ")).await
        } else {
            ChatView::new(session, client).run().await;
            0
        }
    });
    process::exit(code);
}

async fn run_check(client: &ApiClient) -> i32 {
    match client.health().await {
        Ok(true) => {
            println!("API at {} is healthy", client.base_url());
            0
        }
        Ok(false) => {
            eprintln!("Error: API at {} reported not ok", client.base_url());
            1
        }
        Err(e) => {
            eprintln!("Error: health check failed: {}", e);
            1
        }
    }
}

async fn run_once(mut session: ChatSession, client: &ApiClient, question: &str) -> i32 {
    let Some(pending) = session.submit_text(question) else {
        eprintln!("Error: no question provided");
        return 1;
    };
    let result = client.chat(&pending.query).await;
    session.complete(pending, result);

    if let Some(error) = session.error() {
        eprintln!("{}", render::error_banner(error));
        return 1;
    }
    let palette = session.theme().palette();
    if let Some(answer) = session.messages().last() {
        println!("{}", answer.text);
        if !answer.sources.is_empty() {
            println!("\nSources:");
            for source in &answer.sources {
                print!("{}", render::render_source(source, &palette));
            }
        }
    }
    0
}

struct InFlight {
    pending: PendingQuery,
    response: BoxFuture<'static, Result<ChatResponse, ClientError>>,
}

enum Event {
    Line(std::io::Result<Option<String>>),
    Answered(Result<ChatResponse, ClientError>),
}

async fn wait_in_flight(in_flight: &mut Option<InFlight>) -> Result<ChatResponse, ClientError> {
    match in_flight {
        Some(f) => (&mut f.response).await,
        None => std::future::pending().await,
    }
}

/// Interactive chat over stdin. At most one request is in flight; input
/// other than commands is refused until it settles.
struct ChatView {
    session: ChatSession,
    client: ApiClient,
    in_flight: Option<InFlight>,
    // Set while the draft is being built from `\`-terminated lines.
    continuing: bool,
}

impl ChatView {
    fn new(session: ChatSession, client: ApiClient) -> Self {
        Self {
            session,
            client,
            in_flight: None,
            continuing: false,
        }
    }

    async fn run(mut self) {
        self.print_transcript();
        println!("{}", self.palette().muted("Type a question, or /help for commands."));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        loop {
            if !stdin_open && self.in_flight.is_none() {
                break;
            }
            let event = tokio::select! {
                line = lines.next_line(), if stdin_open => Event::Line(line),
                result = wait_in_flight(&mut self.in_flight), if self.in_flight.is_some() => {
                    Event::Answered(result)
                }
            };
            match event {
                Event::Line(Ok(Some(line))) => {
                    if !self.handle_line(&line) {
                        break;
                    }
                }
                Event::Line(Ok(None)) => stdin_open = false,
                Event::Line(Err(e)) => {
                    tracing::error!(error = %e, "failed to read stdin");
                    stdin_open = false;
                }
                Event::Answered(result) => self.finish(result),
            }
        }
    }

    fn palette(&self) -> review_chat_client::Palette {
        self.session.theme().palette()
    }

    /// Returns `false` when the user asked to quit.
    fn handle_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if let Some(command) = trimmed.strip_prefix('/') {
            let mut parts = command.split_whitespace();
            let name = parts.next().unwrap_or_default();
            let arg = parts.next().and_then(|n| n.parse::<usize>().ok());
            return self.run_command(name, arg);
        }

        if self.session.is_busy() {
            println!("{}", self.palette().muted("Still waiting for the previous answer…"));
            return true;
        }
        // A typed line replaces a draft that came from /prompt.
        let mut draft = if self.continuing {
            self.session.draft().to_string()
        } else {
            String::new()
        };
        if let Some(partial) = line.trim_end().strip_suffix('\\') {
            draft.push_str(partial);
            draft.push('\n');
            self.session.set_draft(draft);
            self.continuing = true;
            return true;
        }
        draft.push_str(line);
        self.session.set_draft(draft);
        self.continuing = false;
        self.send_draft();
        true
    }

    fn run_command(&mut self, name: &str, arg: Option<usize>) -> bool {
        match (name, arg) {
            ("quit" | "exit", _) => return false,
            ("help", _) => println!("{HELP}"),
            ("send", _) => {
                self.continuing = false;
                self.send_draft();
            }
            ("status", _) => println!("{}", render::status_label(self.session.is_busy())),
            ("new", _) => {
                // Dropping the future cancels the request.
                self.in_flight = None;
                self.continuing = false;
                self.session.reset();
                self.print_transcript();
            }
            ("theme", _) => {
                let theme = self.session.toggle_theme();
                println!("Theme: {theme}");
            }
            ("prompts", _) => {
                for (i, prompt) in self.session.suggested_prompts().iter().enumerate() {
                    println!("  {}. {}", i + 1, prompt);
                }
            }
            ("prompt", Some(n)) if n > 0 => {
                if self.session.insert_prompt(n - 1) {
                    self.continuing = false;
                    println!("Draft: {}  (/send to ask)", self.session.draft());
                } else if self.session.is_busy() {
                    println!("{}", self.palette().muted("Still waiting for the previous answer…"));
                } else {
                    println!("No suggested prompt {n}");
                }
            }
            ("sources", Some(n)) if n > 0 => {
                let Some(message) = self.session.messages().get(n - 1) else {
                    println!("No message {n}");
                    return true;
                };
                let id = message.id;
                if !message.has_sources() {
                    println!("Message {n} has no sources");
                    return true;
                }
                let expanded = self.session.toggle_sources(id);
                if let Some(message) = self.session.message(id) {
                    print!("{}", render::render_message(message, n, expanded, &self.palette()));
                }
            }
            ("copy", Some(n)) if n > 0 => {
                let Some(id) = self.session.messages().get(n - 1).map(|m| m.id) else {
                    println!("No message {n}");
                    return true;
                };
                if self.session.copy_message(id, &mut SystemClipboard) {
                    println!("Copied message {n}");
                } else {
                    self.print_error();
                }
            }
            _ => println!("Unknown command; /help lists commands"),
        }
        true
    }

    fn send_draft(&mut self) {
        let Some(pending) = self.session.submit() else {
            return;
        };
        let client = self.client.clone();
        let query = pending.query.clone();
        let response = async move { client.chat(&query).await }.boxed();
        self.in_flight = Some(InFlight { pending, response });

        let n = self.session.messages().len();
        if let Some(message) = self.session.messages().last() {
            print!("{}", render::render_message(message, n, false, &self.palette()));
        }
        println!("{}", self.palette().muted(render::status_label(true)));
    }

    fn finish(&mut self, result: Result<ChatResponse, ClientError>) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };
        if !self.session.complete(in_flight.pending, result) {
            return;
        }
        if self.session.error().is_some() {
            self.print_error();
            return;
        }
        let n = self.session.messages().len();
        if let Some(message) = self.session.messages().last() {
            print!("{}", render::render_message(message, n, false, &self.palette()));
        }
    }

    fn print_error(&self) {
        if let Some(error) = self.session.error() {
            println!("{}", self.palette().error(&render::error_banner(error)));
        }
    }

    fn print_transcript(&self) {
        print!("{}", render::render_transcript(&self.session, &self.palette()));
    }
}
