use anyhow::{bail, Context, Result};
use sabq_editor::{
    BlockEdit, BlockRenderer, BlockType, ConfigStore, Direction, DraftSession, EditorConfig,
    HttpArticleClient, LoadPolicy, SaveOutcome,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: sabq-draft [--draft <file>] [--api <url>] [--lenient] <command>
Commands:
  show
  append <type>
  move <block-id> <up|down>
  remove <block-id>
  reorder <dragged-id> <target-id>
  set <block-id> <field> <value>
  add-item <block-id>
  edit-item <block-id> <index> <value>
  remove-item <block-id> <index>
  pull <article-id>
  push";

#[derive(Debug, PartialEq)]
enum Command {
    Show,
    Append(BlockType),
    Move { block_id: String, direction: Direction },
    Remove(String),
    Reorder { dragged_id: String, target_id: String },
    Edit { block_id: String, edit: BlockEdit },
    Pull(String),
    Push,
}

#[derive(Debug)]
struct DraftArgs {
    draft_path: PathBuf,
    api_url: Option<String>,
    lenient: bool,
    command: Command,
}

fn next_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    what: &str,
) -> Result<String, String> {
    iter.next()
        .map(|value| value.to_string())
        .ok_or_else(|| format!("Missing {what}"))
}

fn parse_index(raw: &str) -> Result<usize, String> {
    raw.parse::<usize>()
        .map_err(|_| format!("Invalid item index: {raw}"))
}

/// `set` understands `level` as a number and `ordered` as a boolean; every
/// other field is text.
fn field_edit(field: &str, value: &str) -> Result<BlockEdit, String> {
    match field {
        "level" => value
            .parse::<i64>()
            .map(BlockEdit::SetLevel)
            .map_err(|_| format!("Invalid heading level: {value}")),
        "ordered" => match value {
            "true" | "yes" | "1" => Ok(BlockEdit::SetToggle {
                field: field.to_string(),
                value: true,
            }),
            "false" | "no" | "0" => Ok(BlockEdit::SetToggle {
                field: field.to_string(),
                value: false,
            }),
            _ => Err(format!("Invalid value for ordered: {value}")),
        },
        _ => Ok(BlockEdit::SetText {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_args(args: &[String]) -> Result<DraftArgs, String> {
    let mut draft_path = PathBuf::from("draft.json");
    let mut api_url: Option<String> = None;
    let mut lenient = false;
    let mut command: Option<Command> = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let parsed = match arg.as_str() {
            "--draft" => {
                draft_path = PathBuf::from(next_value(&mut iter, "--draft value")?);
                continue;
            }
            "--api" => {
                api_url = Some(next_value(&mut iter, "--api value")?);
                continue;
            }
            "--lenient" => {
                lenient = true;
                continue;
            }
            "--help" | "-h" => return Err(String::new()),
            "show" => Command::Show,
            "append" => {
                let raw = next_value(&mut iter, "block type")?;
                let block_type =
                    BlockType::parse(&raw).ok_or_else(|| format!("Unknown block type: {raw}"))?;
                Command::Append(block_type)
            }
            "move" => {
                let block_id = next_value(&mut iter, "block id")?;
                let raw = next_value(&mut iter, "direction")?;
                let direction =
                    Direction::parse(&raw).ok_or_else(|| format!("Invalid direction: {raw}"))?;
                Command::Move {
                    block_id,
                    direction,
                }
            }
            "remove" => Command::Remove(next_value(&mut iter, "block id")?),
            "reorder" => Command::Reorder {
                dragged_id: next_value(&mut iter, "dragged block id")?,
                target_id: next_value(&mut iter, "target block id")?,
            },
            "set" => {
                let block_id = next_value(&mut iter, "block id")?;
                let field = next_value(&mut iter, "field name")?;
                let value = next_value(&mut iter, "field value")?;
                Command::Edit {
                    block_id,
                    edit: field_edit(&field, &value)?,
                }
            }
            "add-item" => Command::Edit {
                block_id: next_value(&mut iter, "block id")?,
                edit: BlockEdit::AddItem,
            },
            "edit-item" => {
                let block_id = next_value(&mut iter, "block id")?;
                let index = parse_index(&next_value(&mut iter, "item index")?)?;
                let value = next_value(&mut iter, "item text")?;
                Command::Edit {
                    block_id,
                    edit: BlockEdit::EditItem { index, value },
                }
            }
            "remove-item" => {
                let block_id = next_value(&mut iter, "block id")?;
                let index = parse_index(&next_value(&mut iter, "item index")?)?;
                Command::Edit {
                    block_id,
                    edit: BlockEdit::RemoveItem { index },
                }
            }
            "pull" => Command::Pull(next_value(&mut iter, "article id")?),
            "push" => Command::Push,
            _ => return Err(format!("Unknown argument: {arg}")),
        };
        if command.is_some() {
            return Err(format!("Unexpected extra command: {arg}"));
        }
        command = Some(parsed);
    }

    let command = command.ok_or_else(|| "Missing command".to_string())?;
    Ok(DraftArgs {
        draft_path,
        api_url,
        lenient,
        command,
    })
}

fn load_config(api_url: Option<&str>) -> EditorConfig {
    let mut config = match ConfigStore::default_store().and_then(|store| store.load()) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "using default editor config");
            EditorConfig::default()
        }
    };
    config.apply_env_overrides();
    if let Some(url) = api_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
    }
    config
}

fn read_draft(path: &Path, policy: LoadPolicy, config: &EditorConfig) -> Result<DraftSession> {
    if !path.exists() {
        info!(path = %path.display(), "starting a new draft");
        return Ok(DraftSession::new(config.locale));
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid json", path.display()))?;
    let Value::Object(record) = value else {
        bail!("{} must contain a json object", path.display());
    };
    DraftSession::from_article(record, policy, config.locale)
        .with_context(|| format!("{} has invalid content blocks", path.display()))
}

fn write_draft(path: &Path, session: &DraftSession) -> Result<()> {
    let data = serde_json::to_string_pretty(&session.to_document())?;
    std::fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn client(config: &EditorConfig) -> HttpArticleClient {
    HttpArticleClient::new(
        &config.api_base_url,
        Duration::from_secs(config.timeout_secs),
    )
}

fn pull(config: &EditorConfig, policy: LoadPolicy, article_id: &str, path: &Path) -> Result<()> {
    let session = DraftSession::open(&client(config), article_id, policy, config.locale)
        .with_context(|| format!("failed to pull article {article_id}"))?;
    write_draft(path, &session)?;
    println!(
        "pulled article {article_id} ({} blocks) into {}",
        session.blocks().len(),
        path.display()
    );
    Ok(())
}

fn run(args: DraftArgs) -> Result<()> {
    let config = load_config(args.api_url.as_deref());
    run_with(&config, args)
}

fn run_with(config: &EditorConfig, args: DraftArgs) -> Result<()> {
    let policy = if args.lenient {
        LoadPolicy::Lenient
    } else {
        config.load_policy
    };

    let command = match args.command {
        Command::Pull(article_id) => {
            return pull(config, policy, &article_id, &args.draft_path);
        }
        command => command,
    };

    let mut session = read_draft(&args.draft_path, policy, config)?;
    let renderer = BlockRenderer::default();
    let mut saved = false;
    match command {
        Command::Show => {
            let views = renderer.render_all(session.store(), &config.view());
            println!("{}", serde_json::to_string_pretty(&views)?);
            return Ok(());
        }
        Command::Append(block_type) => println!("{}", session.append(block_type)),
        Command::Move {
            block_id,
            direction,
        } => {
            session.move_block(&block_id, direction);
        }
        Command::Remove(block_id) => {
            session.remove(&block_id);
        }
        Command::Reorder {
            dragged_id,
            target_id,
        } => {
            if session.begin_drag(&dragged_id) {
                session.drop_on(&target_id);
            }
        }
        Command::Edit { block_id, edit } => {
            session.apply_edit(&renderer, &block_id, &edit);
        }
        Command::Push => {
            let outcome = session.save_with(&client(config));
            if let Some(notification) = session.notifications().latest() {
                println!("{}: {}", notification.title, notification.message);
            }
            if outcome != SaveOutcome::Saved {
                bail!("article was not saved");
            }
            saved = true;
        }
        Command::Pull(_) => {}
    }

    let changes = session.take_changes();
    for change in &changes {
        debug!(?change, "block changed");
    }
    if saved || !changes.is_empty() {
        write_draft(&args.draft_path, &session)?;
    } else {
        println!("nothing changed");
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let args = std::env::args().collect::<Vec<_>>();
    let parsed = match parse_args(&args) {
        Ok(value) => value,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("{message}");
            }
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(parsed) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
