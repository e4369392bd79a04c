// date-recur command line
// Main entry point

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};

use date_recur::models::date_recur::DateRecurItem;
use date_recur::models::occurrence::StorageFormat;
use date_recur::models::recurrence::Timestamp;
use date_recur::services::materialize::MaterializationPolicy;
use date_recur::services::recurrence::RecurrenceRule;
use date_recur::services::settings::SettingsService;

#[derive(Parser)]
#[command(name = "date-recur")]
#[command(about = "Evaluate RFC 5545 recurrence rules and materialize their occurrences")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RuleArgs {
    /// Rule text; use \n between RRULE, RDATE, EXRULE and EXDATE lines
    #[arg(long)]
    rule: String,

    /// First occurrence (RFC 3339 or YYYYMMDDTHHMMSS[Z])
    #[arg(long)]
    start: String,

    /// End of the first occurrence
    #[arg(long)]
    end: Option<String>,

    /// IANA timezone the rule is evaluated in
    #[arg(long)]
    tz: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the summary and canonical text of a rule
    Describe {
        #[command(flatten)]
        rule: RuleArgs,
    },
    /// List occurrences as JSON
    Occurrences {
        #[command(flatten)]
        rule: RuleArgs,

        /// Only occurrences starting at or after this instant
        #[arg(long)]
        from: Option<String>,

        /// Only occurrences starting at or before this instant
        #[arg(long)]
        to: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the records that would be written to occurrence storage
    Materialize {
        #[command(flatten)]
        rule: RuleArgs,

        /// Reference time for the precreate horizon (defaults to now)
        #[arg(long)]
        now: Option<String>,

        /// date or datetime (defaults to the settings value)
        #[arg(long)]
        format: Option<StorageFormat>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let settings_path = match cli.settings {
        Some(path) => path,
        None => SettingsService::default_path()?,
    };
    let settings = SettingsService::new(settings_path).get()?;
    log::debug!("Using settings {:?}", settings);

    match cli.command {
        Commands::Describe { rule } => {
            let tz = rule.tz.clone().unwrap_or_else(|| settings.default_timezone.clone());
            let recurrence = build_rule(&rule, &tz)?;
            println!("{}", recurrence.human_readable());
            println!("{}", recurrence.rrule_text());
            println!("infinite: {}", recurrence.is_infinite());
        }
        Commands::Occurrences {
            rule,
            from,
            to,
            limit,
        } => {
            let tz = rule.tz.clone().unwrap_or_else(|| settings.default_timezone.clone());
            let recurrence = build_rule(&rule, &tz)?.with_max_occurrences(settings.max_occurrences);
            let zone = parse_zone(&tz)?;
            let from = from.map(|value| parse_instant(&value, &zone)).transpose()?;
            let to = to.map(|value| parse_instant(&value, &zone)).transpose()?;

            let occurrences = recurrence.occurrences(from, to, limit)?;
            println!("{}", serde_json::to_string_pretty(&occurrences)?);
        }
        Commands::Materialize { rule, now, format } => {
            let tz = rule.tz.clone().unwrap_or_else(|| settings.default_timezone.clone());
            let zone = parse_zone(&tz)?;
            let mut policy =
                MaterializationPolicy::from_settings(&settings).map_err(|e| anyhow!(e))?;
            if let Some(format) = format {
                policy = policy.with_format(format);
            }

            let mut item = DateRecurItem::new(parse_instant(&rule.start, &zone)?, tz)
                .with_rrule(rule.rule.replace("\\n", "\n"));
            if let Some(end) = &rule.end {
                item = item.with_end(parse_instant(end, &zone)?);
            }
            let now = match now {
                Some(value) => parse_instant(&value, &zone)?,
                None => Utc::now(),
            };

            let records = policy.materialize_item(&item, now)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }

    Ok(())
}

fn build_rule(args: &RuleArgs, tz: &str) -> Result<RecurrenceRule> {
    let zone = parse_zone(tz)?;
    let start = parse_instant(&args.start, &zone)?;
    let end = args
        .end
        .as_deref()
        .map(|value| parse_instant(value, &zone))
        .transpose()?;

    let text = args.rule.replace("\\n", "\n");
    RecurrenceRule::new(&text, start, end, tz)
        .with_context(|| format!("Could not build recurrence from '{}'", args.rule))
}

fn parse_zone(tz: &str) -> Result<Tz> {
    tz.parse::<Tz>()
        .map_err(|_| anyhow!("Unknown timezone '{}'", tz))
}

/// Accepts RFC 3339 or the compact rule timestamp forms; floating values are
/// read in `zone`.
fn parse_instant(value: &str, zone: &Tz) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    Timestamp::parse(value)
        .and_then(|timestamp| timestamp.resolve(zone, NaiveTime::MIN))
        .map(|instant| instant.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("Could not parse '{}' as a date", value))
}
