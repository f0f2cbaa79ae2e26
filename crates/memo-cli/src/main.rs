// ============================================================================
// memo - interactive calendar memo session
// ============================================================================
// Usage:
//   memo [--offline] [--top-k N] [--chat-model M] [--embedding-model M]
//
// Session commands:
//   save [--date YYYY-MM-DD] <text...>   Save a memo (date defaults to today)
//                                        End a line with \ to continue it
//   delete <row>                         Delete the memo at a listed row
//   ask <question...>                    Ask a question about your memos
//   list                                 Show all memos
//   export                               Print the session's memos as JSON
//   quit                                 End the session (memos are discarded)
// ============================================================================

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use memo_core::{
    create_providers, ui, MemoConfig, MemoSession, NoteRow, NoticeLevel, UiEvent, View,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

/// Calendar memo with question answering over your notes
#[derive(Parser)]
#[command(name = "memo", version, about = "Save date-tagged memos and ask questions about them")]
struct Cli {
    /// Run without network access (hash embeddings, extractive answers)
    #[arg(long)]
    offline: bool,

    /// Number of memos retrieved per question (default: MEMO_TOP_K or 5)
    #[arg(long)]
    top_k: Option<usize>,

    /// Chat model name (default: MEMO_CHAT_MODEL or gpt-4o-mini)
    #[arg(long)]
    chat_model: Option<String>,

    /// Embedding model name (default: MEMO_EMBEDDING_MODEL or text-embedding-3-small)
    #[arg(long)]
    embedding_model: Option<String>,

    /// OpenAI-compatible API base URL (default: MEMO_API_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,
}

/// One line typed into the session
#[derive(Parser)]
#[command(multicall = true)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Save a memo
    Save {
        /// Date to file the memo under (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Memo text (swapped for the verbatim rest of the line after parsing)
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Delete the memo at a listed row
    Delete {
        /// Row number as shown by the last listing
        row: usize,
    },

    /// Ask a question about your memos
    Ask {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        question: Vec<String>,
    },

    /// Show all memos
    List,

    /// Print the session's memos as JSON
    Export,

    /// End the session
    #[command(alias = "exit")]
    Quit,
}

impl Cli {
    fn into_config(self) -> MemoConfig {
        let mut config = if self.offline {
            MemoConfig::offline()
        } else {
            MemoConfig::default()
        };

        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
        if let Some(model) = self.chat_model {
            config.chat_model = model;
        }
        if let Some(model) = self.embedding_model {
            config.embedding_model = model;
        }
        if let Some(url) = self.base_url {
            config.base_url = url;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    // Initialize logging (stderr, so it stays out of the rendered view)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("memo=warn,memo_core=warn")),
        )
        .init();

    let config = Cli::parse().into_config();
    config.validate()?;

    let (embedder, model) = create_providers(&config)?;
    let mut session = MemoSession::new(embedder, model, &config);
    info!("Session started");

    println!("=== Calendar Memo ===");
    println!("Commands: save, delete, ask, list, export, quit (help for details)");

    let mut view = ui::handle(&mut session, UiEvent::Refresh).await;
    render_rows(&view);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let Some(mut line) = lines.next_line().await? else {
            break;
        };

        // A trailing backslash continues the entry on the next line
        while let Some(head) = line.strip_suffix('\\') {
            let head = head.to_string();
            print!("  ...> ");
            let _ = std::io::Write::flush(&mut std::io::stdout());
            match lines.next_line().await? {
                Some(next) => line = format!("{}\n{}", head, next),
                None => line = head,
            }
        }

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };

        match command {
            SessionCommand::Save { date, text } => {
                let date = date.unwrap_or_else(|| Local::now().date_naive());
                let event = UiEvent::Save { date, text: text.concat() };
                view = ui::handle(&mut session, event).await;
                render_notice(&view);
                render_rows(&view);
            }
            SessionCommand::Delete { row } => match view.row_id(row) {
                Some(id) => {
                    view = ui::handle(&mut session, UiEvent::Delete { id }).await;
                    render_notice(&view);
                    render_rows(&view);
                }
                None => println!("No memo at row {}. Use `list` to see current rows.", row),
            },
            SessionCommand::Ask { question } => {
                let event = UiEvent::Ask { question: question.concat() };
                view = ui::handle(&mut session, event).await;
                render_notice(&view);
                render_answer(&view);
            }
            SessionCommand::List => {
                view = ui::handle(&mut session, UiEvent::Refresh).await;
                render_rows(&view);
            }
            SessionCommand::Export => {
                println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
            }
            SessionCommand::Quit => break,
        }
    }

    debug!("Session ended with {} memos discarded", session.notes().len());
    Ok(())
}

/// Parse one session line. Save text and questions keep the user's exact
/// spacing, line breaks and quotes instead of clap's re-split words.
fn parse_line(line: &str) -> Result<Option<SessionCommand>, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }

    let mut command = SessionLine::try_parse_from(words.iter().copied())?.command;
    if let SessionCommand::Save { text, .. } | SessionCommand::Ask { question: text } = &mut command {
        // trailing_var_arg puts the free text last, so everything before it is the prefix
        let raw = raw_tail(line, words.len() - text.len());
        *text = vec![raw.to_string()];
    }
    Ok(Some(command))
}

/// The part of `line` after its first `skip` words, untouched
fn raw_tail(line: &str, skip: usize) -> &str {
    let mut rest = line.trim_start();
    for _ in 0..skip {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest
}

fn prompt() {
    use std::io::Write;
    print!("memo> ");
    let _ = std::io::stdout().flush();
}

fn render_notice(view: &View) {
    if let Some(notice) = &view.notice {
        let tag = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warn",
            NoticeLevel::Error => "error",
        };
        println!("[{}] {}", tag, notice.message);
    }
}

fn render_rows(view: &View) {
    println!("\n--- All memos ---");
    if let Some(empty) = view.empty_list_notice() {
        println!("{}", empty.message);
        return;
    }
    for row in &view.rows {
        println!("{}", format_row(row));
    }
}

fn format_row(row: &NoteRow) -> String {
    format!("[{}] **{}** : {}", row.position, row.date, row.text)
}

fn render_answer(view: &View) {
    let Some(answered) = &view.answer else {
        return;
    };

    println!("\nAI answer: {}", answered.answer);
    if !answered.sources.is_empty() {
        println!("\nSources:");
        for source in &answered.sources {
            println!("  {} : {} (score {:.3})", source.date, source.text, source.score);
        }
    }
}
