use crate::config::Config;
use crate::generator;
use crate::workspace::Workspace;
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use reqwest::Client;
use std::path::PathBuf;
use tokio::fs;

/// The four operator-reviewable fields. image_query is machine-facing and
/// not part of the review screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Hashtags,
    Script,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Title,
        Field::Description,
        Field::Hashtags,
        Field::Script,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Description => "Description",
            Field::Hashtags => "Hashtags",
            Field::Script => "Script",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Field::Title => "1",
            Field::Description => "2",
            Field::Hashtags => "3",
            Field::Script => "4",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        match key.trim() {
            "1" => Some(Field::Title),
            "2" => Some(Field::Description),
            "3" => Some(Field::Hashtags),
            "4" => Some(Field::Script),
            _ => None,
        }
    }

    pub fn path(&self, ws: &Workspace) -> PathBuf {
        match self {
            Field::Title => ws.title_path(),
            Field::Description => ws.description_path(),
            Field::Hashtags => ws.hashtags_path(),
            Field::Script => ws.script_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Edit,
    Regenerate,
    Quit,
    Invalid,
}

impl Action {
    pub fn from_key(key: &str) -> Action {
        match key.trim().to_lowercase().as_str() {
            "c" => Action::Continue,
            "e" => Action::Edit,
            "r" => Action::Regenerate,
            "q" => Action::Quit,
            _ => Action::Invalid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Confirmed,
    Aborted,
}

/// Where review decisions come from. The CLI reads stdin; tests script the
/// sequence; batch mode confirms without a human.
pub trait DecisionSource {
    fn next_action(&mut self) -> Result<Action>;
    fn pick_field(&mut self) -> Result<Option<Field>>;
}

pub struct StdinDecisions;

impl StdinDecisions {
    fn read_line(prompt: &str) -> Result<String> {
        eprint!("{}", prompt);
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .context("Failed to read operator input")?;
        Ok(line)
    }
}

impl DecisionSource for StdinDecisions {
    fn next_action(&mut self) -> Result<Action> {
        let line = Self::read_line("[c] continue  [e] edit  [r] regenerate with AI  [q] quit: ")?;
        Ok(Action::from_key(&line))
    }

    fn pick_field(&mut self) -> Result<Option<Field>> {
        let line =
            Self::read_line("Which one to edit? (1=Title, 2=Description, 3=Hashtags, 4=Script): ")?;
        Ok(Field::from_key(&line))
    }
}

/// Batch mode: confirm immediately, never block on an operator.
pub struct AutoContinue;

impl DecisionSource for AutoContinue {
    fn next_action(&mut self) -> Result<Action> {
        Ok(Action::Continue)
    }

    fn pick_field(&mut self) -> Result<Option<Field>> {
        Ok(None)
    }
}

async fn read_field(ws: &Workspace, field: Field) -> String {
    fs::read_to_string(field.path(ws))
        .await
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "(missing)".to_string())
}

async fn show_content(ws: &Workspace) {
    println!("\n===== CURRENT CONTENT =====");
    for field in Field::ALL {
        println!("\n[{}] {}:", field.key(), field.label());
        println!("------------------------");
        println!("{}", read_field(ws, field).await);
    }
    println!("\n===========================\n");
}

async fn edit_field(ws: &Workspace, field: Field) -> Result<()> {
    let path = field.path(ws);
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());
    logi(format!("Editing {} ({})...", field.label(), path.display()));

    let status = tokio::process::Command::new(&editor)
        .arg(&path)
        .status()
        .await
        .with_context(|| format!("Failed to launch editor: {}", editor))?;
    if !status.success() {
        logw(format!("Editor exited with {}", status));
    }
    Ok(())
}

/// Blocking review checkpoint: show the generated fields, then loop on
/// operator decisions until continue or quit. Regeneration failures are
/// fatal, matching the generator's own contract.
pub async fn run(
    ws: &Workspace,
    cfg: &Config,
    client: &Client,
    decisions: &mut dyn DecisionSource,
) -> Result<ReviewOutcome> {
    if !ws.data_dir().exists() {
        anyhow::bail!("No data directory yet. Run the generate stage first.");
    }

    show_content(ws).await;

    loop {
        match decisions.next_action()? {
            Action::Continue => {
                logok("Confirmed. Continuing pipeline...");
                return Ok(ReviewOutcome::Confirmed);
            }
            Action::Edit => {
                match decisions.pick_field()? {
                    Some(field) => {
                        edit_field(ws, field).await?;
                        show_content(ws).await;
                    }
                    None => println!("Invalid choice."),
                }
            }
            Action::Regenerate => {
                logi("Regenerating with AI...");
                generator::run(ws, cfg, client)
                    .await
                    .context("Regeneration failed")?;
                logok("Regenerated. Showing new content:");
                show_content(ws).await;
            }
            Action::Quit => {
                logw("User aborted pipeline.");
                return Ok(ReviewOutcome::Aborted);
            }
            Action::Invalid => println!("Invalid option."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Scripted {
        actions: Vec<Action>,
        calls: usize,
    }

    impl Scripted {
        fn new(actions: Vec<Action>) -> Self {
            Self { actions, calls: 0 }
        }
    }

    impl DecisionSource for Scripted {
        fn next_action(&mut self) -> Result<Action> {
            let action = self.actions.remove(0);
            self.calls += 1;
            Ok(action)
        }

        fn pick_field(&mut self) -> Result<Option<Field>> {
            Ok(None)
        }
    }

    async fn seeded_workspace() -> (TempDir, Workspace) {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path());
        crate::bundle::ContentBundle::placeholder()
            .save(&ws)
            .await
            .unwrap();
        (tmp, ws)
    }

    #[test]
    fn action_parsing() {
        assert_eq!(Action::from_key("c\n"), Action::Continue);
        assert_eq!(Action::from_key(" E "), Action::Edit);
        assert_eq!(Action::from_key("r"), Action::Regenerate);
        assert_eq!(Action::from_key("q"), Action::Quit);
        assert_eq!(Action::from_key("x"), Action::Invalid);
        assert_eq!(Action::from_key(""), Action::Invalid);
    }

    #[test]
    fn field_parsing() {
        assert_eq!(Field::from_key("1"), Some(Field::Title));
        assert_eq!(Field::from_key("4\n"), Some(Field::Script));
        assert_eq!(Field::from_key("5"), None);
    }

    #[tokio::test]
    async fn continue_confirms() {
        let (_tmp, ws) = seeded_workspace().await;
        let mut decisions = Scripted::new(vec![Action::Continue]);
        let outcome = run(&ws, &Config::default(), &Client::new(), &mut decisions)
            .await
            .unwrap();
        assert_eq!(outcome, ReviewOutcome::Confirmed);
    }

    #[tokio::test]
    async fn quit_aborts() {
        let (_tmp, ws) = seeded_workspace().await;
        let mut decisions = Scripted::new(vec![Action::Quit]);
        let outcome = run(&ws, &Config::default(), &Client::new(), &mut decisions)
            .await
            .unwrap();
        assert_eq!(outcome, ReviewOutcome::Aborted);
    }

    #[tokio::test]
    async fn invalid_input_stays_awaiting() {
        let (_tmp, ws) = seeded_workspace().await;
        let mut decisions = Scripted::new(vec![Action::Invalid, Action::Invalid, Action::Quit]);
        let outcome = run(&ws, &Config::default(), &Client::new(), &mut decisions)
            .await
            .unwrap();
        assert_eq!(outcome, ReviewOutcome::Aborted);
        assert_eq!(decisions.calls, 3);
    }

    #[tokio::test]
    async fn missing_data_dir_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path().join("nowhere"));
        let mut decisions = Scripted::new(vec![Action::Continue]);
        let err = run(&ws, &Config::default(), &Client::new(), &mut decisions)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("generate stage"));
    }
}
