use std::fmt;

use runecove_core::PlayerId;
use runecove_hunt::{format_cooldown, AscendancyLedger, MAX_STAGE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CommandError {}

/// Admin commands over the ascendancy ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuntCommand {
    Help,
    /// Show or set a player's dialogue stage.
    Stage {
        player: PlayerId,
        stage: Option<u8>,
    },
    /// Report a player's hunt standing.
    Progress {
        player: PlayerId,
    },
    /// Wipe a player's hunt record (completion, stage, cooldown, dialogue).
    Reset {
        player: PlayerId,
    },
    /// Forget seen dialogue for one player, or everyone.
    DialogueClear {
        player: Option<PlayerId>,
    },
    /// List completions in placement order.
    Winners,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub lines: Vec<String>,
}

pub fn parse_command(input: &str) -> Result<HuntCommand, CommandError> {
    let input = input.trim();
    let input = input.strip_prefix('/').unwrap_or(input).trim();
    if input.is_empty() {
        return Ok(HuntCommand::Help);
    }

    let mut parts = input.split_whitespace();
    let cmd = parts
        .next()
        .ok_or_else(|| CommandError::new("Missing command"))?
        .to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    match cmd.as_str() {
        "help" | "?" => Ok(HuntCommand::Help),
        "stage" => {
            if !(1..=2).contains(&args.len()) {
                return Err(CommandError::new("Usage: stage <player> [value]"));
            }
            let player = parse_player(args[0])?;
            let stage = if args.len() == 2 {
                let value: u8 = args[1]
                    .parse()
                    .map_err(|_| CommandError::new("Invalid stage value"))?;
                if value > MAX_STAGE {
                    return Err(CommandError::new(format!("Stage must be 0..={MAX_STAGE}")));
                }
                Some(value)
            } else {
                None
            };
            Ok(HuntCommand::Stage { player, stage })
        }
        "progress" => {
            if args.len() != 1 {
                return Err(CommandError::new("Usage: progress <player>"));
            }
            Ok(HuntCommand::Progress {
                player: parse_player(args[0])?,
            })
        }
        "reset" => {
            if args.len() != 1 {
                return Err(CommandError::new("Usage: reset <player>"));
            }
            Ok(HuntCommand::Reset {
                player: parse_player(args[0])?,
            })
        }
        "dialogue" => {
            if args.first().copied() != Some("clear") || args.len() > 2 {
                return Err(CommandError::new("Usage: dialogue clear [player]"));
            }
            let player = match args.get(1) {
                Some(raw) => Some(parse_player(raw)?),
                None => None,
            };
            Ok(HuntCommand::DialogueClear { player })
        }
        "winners" => Ok(HuntCommand::Winners),
        _ => Err(CommandError::new(format!(
            "Unknown command: {cmd}. Try help"
        ))),
    }
}

fn parse_player(raw: &str) -> Result<PlayerId, CommandError> {
    let raw = raw.strip_prefix("player-").unwrap_or(raw);
    raw.parse::<u64>()
        .map(PlayerId)
        .map_err(|_| CommandError::new(format!("Invalid player id: {raw}")))
}

pub fn execute_command(
    ledger: &mut AscendancyLedger,
    cmd: HuntCommand,
    now_ms: u64,
) -> CommandOutput {
    let mut out = CommandOutput::default();
    match cmd {
        HuntCommand::Help => {
            out.lines.extend(help_lines());
        }
        HuntCommand::Stage { player, stage } => match stage {
            Some(value) => {
                ledger.set_stage(player, value);
                out.lines.push(format!("Set {player} stage to {value}"));
            }
            None => {
                out.lines
                    .push(format!("{player} is at stage {}", ledger.stage(player)));
            }
        },
        HuntCommand::Progress { player } => {
            if ledger.has_completed(player) {
                out.lines.push(format!(
                    "{player} completed the hunt (placement {})",
                    ledger.placement_of(player)
                ));
            } else {
                out.lines.push(format!("{player} has not completed the hunt"));
            }
            out.lines
                .push(format!("Dialogue stage: {}", ledger.stage(player)));
            let remaining = ledger.cooldown_remaining(player, now_ms);
            if remaining > 0 {
                out.lines.push(format!(
                    "Encounter cooldown: {} remaining",
                    format_cooldown(remaining)
                ));
            }
        }
        HuntCommand::Reset { player } => {
            ledger.clear_completion(player);
            ledger.clear_stage(player);
            ledger.clear_cooldown(player);
            ledger.clear_dialogue(player);
            out.lines.push(format!("Cleared hunt record for {player}"));
        }
        HuntCommand::DialogueClear { player } => match player {
            Some(player) => {
                if ledger.clear_dialogue(player) {
                    out.lines.push(format!("Cleared seen dialogue for {player}"));
                } else {
                    out.lines
                        .push(format!("{player} had no seen dialogue"));
                }
            }
            None => {
                ledger.clear_all_dialogue();
                out.lines.push("Cleared seen dialogue for everyone".into());
            }
        },
        HuntCommand::Winners => {
            if ledger.completion_count() == 0 {
                out.lines.push("No completions yet".into());
            }
            for (index, player) in ledger.completions().iter().enumerate() {
                out.lines.push(format!("{}. {player}", index + 1));
            }
        }
    }
    out
}

fn help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  stage <player> [value]   - show or set dialogue stage".to_string(),
        "  progress <player>        - show hunt standing".to_string(),
        "  reset <player>           - wipe a player's hunt record".to_string(),
        "  dialogue clear [player]  - forget seen dialogue".to_string(),
        "  winners                  - list completions in order".to_string(),
    ]
}
