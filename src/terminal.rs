//! Line-oriented terminal front end
//!
//! Reads commands from stdin, turns them into game events and prints what
//! the runtime broadcasts back.

use crate::catalog::Catalog;
use crate::model::{ChatMessage, ChatRole, Companion, DIRECTIVE_PREFIX};
use crate::runtime::{GameHandle, UiEvent};
use crate::state_machine::{Action, Event, GamePhase, GameState, NoticeKind};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

const HELP: &str = "\
Commands:
  new [key]               start a new story
  resume [key]            continue the saved story
  stop                    stop the talent draw
  next                    accept the revealed talent
  pick <id>               select or deselect a companion
  go                      begin the story
  say <text>              speak (plain text works too while playing)
  gift|summon|imprint <id>
  portrait <id> [image]   set a portrait override; no image clears it
  status                  show companions
  share                   print a shareable excerpt
  reset                   back to the title screen
  quit";

const RESUME_HINT: &str = "A saved story was found: `resume` to continue it.";

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New(Option<String>),
    Resume(Option<String>),
    Stop,
    Next,
    Pick(String),
    Go,
    Say(String),
    Interact(Action, String),
    Portrait(String, String),
    Status,
    Share,
    Reset,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));
        let arg = || (!rest.is_empty()).then(|| rest.to_string());
        let required = |what: &str| arg().ok_or_else(|| format!("usage: {word} <{what}>"));

        Ok(match word.to_ascii_lowercase().as_str() {
            "new" => Command::New(arg()),
            "resume" | "continue" => Command::Resume(arg()),
            "stop" => Command::Stop,
            "next" => Command::Next,
            "pick" => Command::Pick(required("companion id")?),
            "go" | "begin" => Command::Go,
            "say" => Command::Say(required("text")?),
            "gift" => Command::Interact(Action::Favor, required("companion id")?),
            "summon" => Command::Interact(Action::Summon, required("companion id")?),
            "imprint" => Command::Interact(Action::Imprint, required("companion id")?),
            "portrait" => {
                let rest = required("companion id")?;
                let (id, image) = rest
                    .split_once(char::is_whitespace)
                    .map_or((rest.as_str(), ""), |(id, image)| (id, image.trim()));
                Command::Portrait(id.to_string(), image.to_string())
            }
            "status" => Command::Status,
            "share" => Command::Share,
            "reset" => Command::Reset,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "" => return Err(String::new()),
            _ => Command::Say(line.to_string()),
        })
    }

    /// The game event for this command, if it has one
    pub fn into_event(self, default_credential: Option<&str>) -> Option<Event> {
        let credential =
            |given: Option<String>| given.or_else(|| default_credential.map(str::to_string));
        Some(match self {
            Command::New(key) => Event::StartNew {
                credential: credential(key).unwrap_or_default(),
            },
            Command::Resume(key) => Event::Resume {
                credential: credential(key).unwrap_or_default(),
            },
            Command::Stop => Event::StopDraw,
            Command::Next => Event::ConfirmTalent,
            Command::Pick(id) => Event::ToggleCompanion { id },
            Command::Go => Event::BeginPlaythrough,
            Command::Say(text) => Event::PlayerMessage { text },
            Command::Interact(action, companion_id) => Event::Interact {
                companion_id,
                action,
            },
            Command::Portrait(companion_id, image) => Event::SetPortrait {
                companion_id,
                image,
            },
            Command::Reset => Event::Reset,
            Command::Status | Command::Share | Command::Help | Command::Quit => return None,
        })
    }
}

/// Incremental printer of broadcast state
struct View {
    catalog: Arc<Catalog>,
    last: Option<Arc<GameState>>,
    shown_messages: usize,
}

impl View {
    fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            last: None,
            shown_messages: 0,
        }
    }

    fn render(&mut self, event: UiEvent) {
        match event {
            UiEvent::StateChanged { state } => self.render_state(state),
            UiEvent::TitleScreen { can_resume } => {
                if can_resume {
                    println!("{RESUME_HINT}");
                }
            }
            UiEvent::Notice(notice) => match notice.kind {
                NoticeKind::Blocking => println!("!! {}", notice.message),
                NoticeKind::Toast => println!("~ {}", notice.message),
            },
            UiEvent::Rejected { message } => println!("x {message}"),
        }
    }

    fn render_state(&mut self, state: Arc<GameState>) {
        let previous = self.last.replace(state.clone());
        let entered = previous
            .as_ref()
            .is_none_or(|p| p.phase.name() != state.phase.name());

        match &state.phase {
            GamePhase::Intro { resuming } if entered => {
                self.shown_messages = 0;
                if *resuming {
                    println!("Restoring your story...");
                } else {
                    println!("Back at the title screen. `new` or `resume`.");
                }
            }
            GamePhase::Warp if entered => println!("Warping through the star river..."),
            GamePhase::TalentDraw { rolling: true, .. } if entered => {
                println!("The wardrobe spins. Type `stop`.");
            }
            GamePhase::TalentReveal => {
                if let Some(outfit) = &state.playthrough.outfit {
                    println!("Talent: [{}] {}", outfit.name, outfit.description);
                    println!("  {}: {}", outfit.power_name, outfit.power_effect);
                    println!("  ({} style) {}", outfit.style, outfit.image);
                    println!("Type `next` to continue.");
                }
            }
            GamePhase::CompanionSelect => {
                if entered {
                    for companion in &self.catalog.companions {
                        println!(
                            "  {:<12} {} ({}), {}",
                            companion.id(),
                            companion.name(),
                            companion.profile.species,
                            companion.profile.archetype
                        );
                    }
                    println!("`pick <id>` to choose, then `go`.");
                } else {
                    let names: Vec<_> =
                        state.playthrough.companions.iter().map(Companion::name).collect();
                    println!("Selected: {}", names.join(", "));
                }
            }
            GamePhase::Playing { pending } => {
                let messages = &state.playthrough.messages;
                self.shown_messages = self.shown_messages.min(messages.len());
                for message in &messages[self.shown_messages..] {
                    print_message(message);
                }
                self.shown_messages = messages.len();
                if pending.is_some() {
                    println!("(the narrator is writing...)");
                }
            }
            _ => {}
        }
    }

    fn status(&self) {
        let Some(state) = &self.last else {
            println!("No story yet.");
            return;
        };
        for companion in &state.playthrough.companions {
            let stats = companion.stats;
            println!(
                "  {} [{}] favor {} heir {} | portrait {}",
                companion.name(),
                stats.relationship.label(),
                stats.favorability,
                stats.pregnancy,
                state.portrait_for(companion)
            );
        }
    }

    fn share(&self) {
        match self.last.as_ref().and_then(|s| s.story_excerpt()) {
            Some(excerpt) => println!("{excerpt}"),
            None => println!("Nothing to share yet."),
        }
    }
}

fn print_message(message: &ChatMessage) {
    match message.role {
        _ if message.is_directive() => {
            let text = message.text.trim_start_matches(DIRECTIVE_PREFIX).trim();
            println!("* {text}");
        }
        ChatRole::Player => println!("You: {}", message.text),
        ChatRole::Narrator => println!("\n{}\n", message.text),
    }
}

/// Drive the game from stdin until `quit` or end of input
pub async fn run(
    handle: GameHandle,
    catalog: Arc<Catalog>,
    default_credential: Option<String>,
) -> std::io::Result<()> {
    let mut ui_rx = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let scenario = &catalog.scenario;
    println!("== {} == (type `help`)\n{}", scenario.title, scenario.intro_text);
    let mut view = View::new(catalog.clone());

    if handle.can_resume {
        println!("{RESUME_HINT}");
    }

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = match Command::parse(&line) {
                    Ok(command) => command,
                    Err(usage) => {
                        if !usage.is_empty() {
                            println!("{usage}");
                        }
                        continue;
                    }
                };
                match command {
                    Command::Quit => break,
                    Command::Help => println!("{HELP}"),
                    Command::Status => view.status(),
                    Command::Share => view.share(),
                    command => {
                        if let Some(event) = command.into_event(default_credential.as_deref()) {
                            if handle.dispatch(event).await.is_err() {
                                tracing::error!("Game runtime is gone");
                                break;
                            }
                        }
                    }
                }
            }
            event = ui_rx.recv() => match event {
                Ok(event) => view.render(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Terminal fell behind the game");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    Ok(())
}
