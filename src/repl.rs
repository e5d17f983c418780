//! Interactive REPL for the chat client
//!
//! Plain input sends a message and streams the reply token by token.
//! Slash commands inspect and manage the pinned charts:
//! - /charts            list pinned charts
//! - /chart [n]         show the active (or nth) pinned chart
//! - /unpin <n>         remove the nth pinned chart
//! - /kind <bar|line|pie>  override the active chart's type
//! - /mode <response|sources>  switch the chart view
//! - /profile           show the attached financial profile
//! - /clear             reset the conversation (pins stay)
//! - /help, /quit

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::warn;

use crate::chart::{ChartDatum, ChartKind, ChartSnapshot, ChartUnit};
use crate::client::HttpChatClient;
use crate::session::{ChartMode, ChatSession};
use crate::store::FileStore;

const PROMPT: &str = "you> ";

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    session: ChatSession,
    client: HttpChatClient,
    /// Store backing the cached profile and ids
    store: FileStore,
    history_path: PathBuf,
}

impl Repl {
    pub fn new(client: HttpChatClient, session: ChatSession, store: FileStore) -> Result<Self> {
        let editor = DefaultEditor::new()?;

        let history_path = dirs::home_dir()
            .unwrap_or_default()
            .join(".arthmitra")
            .join("chat_history");

        Ok(Self {
            editor,
            session,
            client,
            store,
            history_path,
        })
    }

    fn load_history(&mut self) {
        if self.history_path.exists() {
            let _ = self.editor.load_history(&self.history_path);
        }
    }

    fn save_history(&mut self) {
        if let Some(parent) = self.history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = self.editor.save_history(&self.history_path);
    }

    /// Run the REPL loop
    pub async fn run(&mut self) -> Result<()> {
        self.load_history();

        println!("Arth-Mitra chat ({})", self.client.base_url());
        println!("Ask about taxes, schemes or investments. /help for commands.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(&line);

                    if let Some(command) = line.strip_prefix('/') {
                        if !self.handle_command(command) {
                            break;
                        }
                    } else {
                        self.send(&line).await;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    eprintln!("readline error: {e}");
                    break;
                }
            }
        }

        self.save_history();
        if let Err(e) = self.session.persist(&self.store) {
            warn!(error = %e, "failed to persist session state");
        }
        println!("bye");
        Ok(())
    }

    async fn send(&mut self, text: &str) {
        print!("\narth> ");
        let _ = io::stdout().flush();

        let result = self
            .session
            .send(&self.client, text, |token| {
                print!("{token}");
                let _ = io::stdout().flush();
            })
            .await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                println!("\nerror: {e}");
                return;
            }
        };

        // Nothing was streamed on the fallback path, print the final text
        if outcome.used_fallback {
            if let Some(message) = self.session.message(&outcome.message_id) {
                println!("{}", message.content);
            }
        } else {
            println!();
        }

        if let Some(message) = self.session.message(&outcome.message_id) {
            if !message.sources.is_empty() {
                println!("  sources: {}", message.sources.join(", "));
            }
        }

        if outcome.pinned {
            if let Some(snapshot) = self.session.charts().active() {
                println!(
                    "  [chart pinned: {} ({}{})]",
                    snapshot.title,
                    snapshot.kind.as_str(),
                    match snapshot.unit {
                        ChartUnit::None => String::new(),
                        unit => format!(", {}", unit.as_str()),
                    }
                );
            }
        }
        println!();
    }

    /// Returns false when the REPL should exit
    fn handle_command(&mut self, command: &str) -> bool {
        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or("");
        let arg = parts.next();

        match name {
            "quit" | "exit" | "q" => return false,
            "help" => self.print_help(),
            "charts" => self.print_chart_list(),
            "chart" => self.print_chart(arg),
            "unpin" => self.unpin(arg),
            "kind" => self.override_kind(arg),
            "mode" => self.switch_mode(arg),
            "profile" => self.print_profile(),
            "clear" => {
                self.session.clear();
                println!("conversation cleared (pinned charts kept)\n");
            }
            other => println!("unknown command: /{other} (try /help)\n"),
        }
        true
    }

    fn print_help(&self) {
        println!("  /charts                   list pinned charts");
        println!("  /chart [n]                show the active (or nth) pinned chart");
        println!("  /unpin <n>                remove the nth pinned chart");
        println!("  /kind <bar|line|pie>      override the active chart's type");
        println!("  /mode <response|sources>  switch the chart view");
        println!("  /profile                  show the attached profile");
        println!("  /clear                    reset the conversation");
        println!("  /quit                     exit\n");
    }

    fn print_chart_list(&self) {
        let charts = self.session.charts();
        if charts.is_empty() {
            println!("no pinned charts yet\n");
            return;
        }
        for (i, snapshot) in charts.list().iter().enumerate() {
            let marker = if charts.active_id() == Some(snapshot.id.as_str()) {
                "*"
            } else {
                " "
            };
            println!(
                " {marker} {}. {} ({}, {} rows)",
                i + 1,
                snapshot.title,
                snapshot.kind.as_str(),
                snapshot.data.len()
            );
        }
        println!();
    }

    fn print_chart(&mut self, index: Option<&str>) {
        if self.session.chart_mode() == ChartMode::Sources {
            let rows = self.session.source_chart_data();
            if rows.is_empty() {
                println!("no cited sources yet\n");
            } else {
                println!("source citations (bar)");
                print_rows(&rows, ChartUnit::None);
            }
            return;
        }

        // An explicit index also selects that chart as active
        if let Some(raw) = index {
            match raw
                .parse::<usize>()
                .ok()
                .and_then(|n| self.session.charts().list().get(n.wrapping_sub(1)))
                .map(|s| s.id.clone())
            {
                Some(id) => {
                    self.session.charts_mut().set_active(&id);
                }
                None => {
                    println!("no pinned chart #{raw}\n");
                    return;
                }
            }
        }

        match self.session.charts().active() {
            Some(snapshot) => print_snapshot(snapshot),
            None => println!("no pinned charts yet\n"),
        }
    }

    fn unpin(&mut self, index: Option<&str>) {
        let id = index
            .and_then(|raw| raw.parse::<usize>().ok())
            .and_then(|n| self.session.charts().list().get(n.wrapping_sub(1)))
            .map(|s| s.id.clone());

        match id {
            Some(id) => {
                self.session.charts_mut().remove(&id);
                println!("unpinned\n");
            }
            None => println!("usage: /unpin <n> (see /charts)\n"),
        }
    }

    fn override_kind(&mut self, arg: Option<&str>) {
        let Some(kind) = arg.and_then(ChartKind::parse) else {
            println!("usage: /kind <bar|line|pie>\n");
            return;
        };

        let active = self.session.charts().active_id().map(str::to_string);
        match active {
            Some(id) => {
                self.session.charts_mut().set_kind(&id, kind);
                println!("chart type set to {}\n", kind.as_str());
            }
            None => println!("no active chart to change\n"),
        }
    }

    fn switch_mode(&mut self, arg: Option<&str>) {
        match arg {
            Some("response") => {
                self.session.set_chart_mode(ChartMode::Response);
                println!("showing response charts\n");
            }
            Some("sources") => {
                self.session.set_chart_mode(ChartMode::Sources);
                println!("showing source citation counts\n");
            }
            _ => println!("usage: /mode <response|sources>\n"),
        }
    }

    fn print_profile(&self) {
        match self.session.profile() {
            Some(profile) => {
                println!("  income: {}", profile.income);
                println!("  employment: {}", profile.employment_status);
                println!("  tax regime: {}", profile.tax_regime);
                println!("  housing: {}", profile.homeowner_status);
                if let Some(age) = profile.age {
                    println!("  age: {age}");
                }
                println!();
            }
            None => println!("no profile attached\n"),
        }
    }
}

fn print_snapshot(snapshot: &ChartSnapshot) {
    println!("{} ({})", snapshot.title, snapshot.kind.as_str());
    print_rows(&snapshot.data, snapshot.unit);
}

fn print_rows(rows: &[ChartDatum], unit: ChartUnit) {
    let width = rows
        .iter()
        .map(|d| d.label.chars().count())
        .max()
        .unwrap_or(0)
        .min(32);

    for datum in rows {
        let label: String = datum.label.chars().take(32).collect();
        println!("  {label:<width$}  {}", format_value(datum.value, unit));
    }
    println!();
}

fn format_value(value: f64, unit: ChartUnit) -> String {
    let mut number = format!("{value:.2}");
    while number.ends_with('0') {
        number.pop();
    }
    if number.ends_with('.') {
        number.pop();
    }

    match unit {
        ChartUnit::Rupee => format!("₹{number}"),
        ChartUnit::Percent => format!("{number}%"),
        ChartUnit::None => number,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(150000.0, ChartUnit::Rupee), "₹150000");
        assert_eq!(format_value(7.5, ChartUnit::Percent), "7.5%");
        assert_eq!(format_value(42.0, ChartUnit::None), "42");
    }
}
