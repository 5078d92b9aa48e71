use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

use rs_mail_labeler::config::{Config, load_config, resolve_db_path, resolve_inbox_paths};
use rs_mail_labeler::daemon::discovery::find_inbox;
use rs_mail_labeler::daemon::{DaemonConfig, apply_once, run_daemon};
use rs_mail_labeler::domain::LabelRule;
use rs_mail_labeler::domain::rule::{EXPORT_FILE_NAME, PRESET_COLORS};
use rs_mail_labeler::mail::eml::inbox_from_dir;
use rs_mail_labeler::store::RuleStore;
use rs_mail_labeler::store::sqlite::SqliteRepo;
use rs_mail_labeler::terminal::run_tui;

#[derive(Parser)]
#[command(name = "rs_mail_labeler")]
#[command(about = "Label inbox rows with user-defined rules", long_about = None)]
struct Cli {
    /// Rule database (overrides db_path from the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create, edit, import and export rules
    Rules {
        #[command(subcommand)]
        cmd: RulesCommand,
    },

    /// Label the inbox snapshot once and exit
    Apply {
        #[arg(long)]
        inbox: Option<PathBuf>,
    },

    /// Keep the inbox snapshot labelled as rows and rules change
    Watch {
        /// Snapshot files to wait for, in order (defaults to inbox_paths from the config)
        #[arg(long)]
        inbox: Vec<PathBuf>,

        /// Poll interval in milliseconds
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Build inbox snapshots
    Inbox {
        #[command(subcommand)]
        cmd: InboxCommand,
    },

    /// Browse rules and preview their labels
    Tui {
        #[arg(long)]
        inbox: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum RulesCommand {
    List,
    Add(RuleArgs),
    /// Replace the rule at POSITION (as shown by `rules list`)
    Update {
        position: usize,
        #[command(flatten)]
        rule: RuleArgs,
    },
    Delete {
        position: usize,
    },
    /// Replace all rules with the contents of FILE ("-" for stdin)
    Import {
        file: PathBuf,
    },
    /// Write all rules to FILE ("-" for stdout)
    Export {
        #[arg(default_value = EXPORT_FILE_NAME)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum InboxCommand {
    /// Build a snapshot from a directory of .eml files
    FromEml {
        dir: PathBuf,
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RuleArgs {
    #[arg(long)]
    label: String,
    /// `#rrggbb`, or 1-5 for one of the preset colors
    #[arg(long)]
    color: Option<String>,
    /// Comma-separated; matched against sender name and address
    #[arg(long)]
    sender: Option<String>,
    /// Comma-separated; matched against the sender address
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    subject: Option<String>,
    /// Comma-separated; matched against the snippet
    #[arg(long)]
    content: Option<String>,
}

impl RuleArgs {
    fn into_rule(self, cfg: &Config) -> LabelRule {
        let trimmed = |v: Option<String>| v.map(|s| s.trim().to_string());
        LabelRule {
            label: self.label.trim().to_string(),
            color: match self.color {
                Some(c) => preset_color(&c).map_or(c, str::to_string),
                None => cfg.default_color().to_string(),
            },
            sender: trimmed(self.sender),
            email: trimmed(self.email),
            subject: trimmed(self.subject),
            content: trimmed(self.content),
        }
    }
}

fn preset_color(choice: &str) -> Option<&'static str> {
    let n: usize = choice.trim().parse().ok()?;
    PRESET_COLORS.get(n.checked_sub(1)?).copied()
}

fn to_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| anyhow!("rule positions start at 1"))
}

fn print_rules(rules: &[LabelRule]) {
    if rules.is_empty() {
        println!("No rules found. Use \"rules add\" to create one.");
        return;
    }
    for (i, rule) in rules.iter().enumerate() {
        println!("Rule {}: {} [{}]", i + 1, rule.label, rule.color);
        for line in rule.describe_conditions() {
            println!("  {line}");
        }
    }
}

fn resolve_inbox(cfg: &Config, explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p);
    }
    let candidates = resolve_inbox_paths(cfg)?;
    find_inbox(&candidates).ok_or_else(|| anyhow!("no inbox snapshot found"))
}

fn run_rules(store: &RuleStore<SqliteRepo>, cfg: &Config, cmd: RulesCommand) -> Result<()> {
    match cmd {
        RulesCommand::List => print_rules(&store.list()?),

        RulesCommand::Add(args) => {
            let index = store.create(args.into_rule(cfg))?;
            println!("Added rule {}", index + 1);
        }

        RulesCommand::Update { position, rule } => {
            store.update(to_index(position)?, rule.into_rule(cfg))?;
            println!("Updated rule {position}");
        }

        RulesCommand::Delete { position } => {
            let removed = store.delete(to_index(position)?)?;
            println!("Deleted rule {position}: {}", removed.label);
        }

        RulesCommand::Import { file } => {
            let mut text = String::new();
            if file.as_os_str() == "-" {
                std::io::stdin().read_to_string(&mut text)?;
            } else {
                text = std::fs::read_to_string(&file)?;
            }
            match store.import_from(&text) {
                Ok(n) => println!("Rules imported successfully! ({n} rules)"),
                Err(e) => return Err(anyhow!("Error importing rules: {e}")),
            }
        }

        RulesCommand::Export { file } => {
            let json = store.export_to()?;
            if file.as_os_str() == "-" {
                println!("{json}");
            } else {
                std::fs::write(&file, json)?;
                println!("Exported rules to {}", file.display());
            }
        }
    }
    Ok(())
}

fn run_apply(store: &RuleStore<SqliteRepo>, cfg: &Config, inbox: Option<PathBuf>) -> Result<()> {
    let no_rules = store.list()?.is_empty();
    if no_rules {
        log::warn!("No label rules found");
        println!("No label rules found");
    }

    let path = match resolve_inbox(cfg, inbox) {
        Ok(p) => p,
        // nothing to label and nothing to clean up
        Err(_) if no_rules => return Ok(()),
        Err(e) => return Err(e),
    };

    if !no_rules {
        println!("Applying rules...");
    }
    let report = apply_once(store, &path).inspect_err(|e| log::error!("{e:#}"))?;

    if no_rules {
        if report.cleared > 0 {
            println!("Removed {} stale labels", report.cleared);
        }
    } else {
        println!(
            "Rules applied successfully! ({} rows, {} labels)",
            report.rows, report.created
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;

    let db_path = match cli.db {
        Some(p) => p,
        None => resolve_db_path(&cfg)?,
    };
    let store = RuleStore::new(SqliteRepo::open(&db_path)?);

    match cli.cmd {
        Command::Rules { cmd } => run_rules(&store, &cfg, cmd),

        Command::Apply { inbox } => run_apply(&store, &cfg, inbox),

        Command::Watch { inbox, interval } => {
            let inbox_paths = if inbox.is_empty() {
                resolve_inbox_paths(&cfg)?
            } else {
                inbox
            };
            let poll_interval = interval
                .map(std::time::Duration::from_millis)
                .unwrap_or_else(|| cfg.poll_interval());

            run_daemon(
                &store,
                DaemonConfig {
                    poll_interval,
                    bootstrap_delay: cfg.bootstrap_delay(),
                    inbox_paths,
                },
            )
        }

        Command::Inbox {
            cmd: InboxCommand::FromEml { dir, out },
        } => {
            let snapshot = inbox_from_dir(&dir)?;
            let out = match out {
                Some(p) => p,
                None => resolve_inbox_paths(&cfg)?
                    .into_iter()
                    .next()
                    .ok_or_else(|| anyhow!("no inbox path configured"))?,
            };
            snapshot.save_to(&out)?;
            println!("Wrote {} rows to {}", snapshot.rows.len(), out.display());
            Ok(())
        }

        Command::Tui { inbox } => {
            let inbox = match inbox {
                Some(p) => Some(p),
                None => find_inbox(&resolve_inbox_paths(&cfg)?),
            };
            run_tui(&store, inbox)
        }
    }
}
