//! # FHIR Date/Time CLI Tool
//!
//! Command-line access to the date/time value type: parse a value, adjust
//! its precision, zone or fields, and print the result.
//!
//! ## Command Line Options
//!
//! ```text
//! <VALUE>                            Date/time text to parse
//!     --v3                           Treat VALUE as an HL7 V3 timestamp
//!     --kind <KIND>                  Datatype: date, date-time, instant [default: date-time]
//!     --precision <PRECISION>        Re-render at this precision
//!     --offset-minutes <MINUTES>     Switch to a fixed offset
//!     --zulu                         Switch to UTC (Z)
//!     --add <FIELD=AMOUNT>           Shift a calendar field (repeatable)
//!     --human                        Print the human readable form
//!     --local                        With --human, convert to the local zone first
//!     --json                         Print a JSON summary
//!     --log-level <LEVEL>            Log filter when RUST_LOG is unset [default: warn]
//! -h, --help                         Print help
//! ```
//!
//! ## Usage Examples
//!
//! ```bash
//! fhir-datetime 20130202201303-0500 --v3
//! fhir-datetime 2015-04-11T12:22:01-04:00 --add hour=2 --json
//! fhir-datetime 2012-01-05T12:00:00-08:00 --human
//! ```

use clap::{Parser, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::date_time::DateTimeValue;
use crate::error::DateTimeError;
use crate::kind::{DateKind, DateTimeKind, InstantKind, TemporalKind};
use crate::precision::{CalendarField, TemporalPrecision};
use crate::v3;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors surfaced by the CLI
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    DateTime(#[from] DateTimeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// FHIR datatype the input is read as
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Datatype {
    Date,
    DateTime,
    Instant,
}

#[derive(Parser, Debug)]
#[command(name = "fhir-datetime")]
#[command(about = "Parse, adjust and render FHIR date/time values")]
pub struct Args {
    /// Date/time text to parse
    pub value: String,

    /// Treat the value as an HL7 V3 compact timestamp
    #[arg(long)]
    pub v3: bool,

    /// Datatype to read the value as
    #[arg(long, value_enum, default_value_t = Datatype::DateTime)]
    pub kind: Datatype,

    /// Re-render the value at this precision
    #[arg(long, value_enum)]
    pub precision: Option<TemporalPrecision>,

    /// Switch to a fixed offset, in minutes east of UTC
    #[arg(long, allow_hyphen_values = true)]
    pub offset_minutes: Option<i32>,

    /// Switch to UTC, written with a Z suffix
    #[arg(long, conflicts_with = "offset_minutes")]
    pub zulu: bool,

    /// Shift a calendar field (format: field=amount, e.g. hour=2 or day=-1)
    #[arg(long = "add", value_parser = parse_add)]
    pub add: Vec<(CalendarField, i32)>,

    /// Print the human readable form
    #[arg(long, conflicts_with = "json")]
    pub human: bool,

    /// With --human, convert to the local zone before rendering
    #[arg(long, requires = "human")]
    pub local: bool,

    /// Print a JSON summary
    #[arg(long)]
    pub json: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// JSON summary printed with `--json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueReport {
    pub value: Option<String>,
    pub datatype: &'static str,
    pub precision: TemporalPrecision,
    pub timezone: Option<String>,
    pub zulu: bool,
    pub epoch_millis: Option<i64>,
}

impl<K: TemporalKind> From<&DateTimeValue<K>> for ValueReport {
    fn from(value: &DateTimeValue<K>) -> Self {
        let zone = value.zone();
        ValueReport {
            value: value.value_as_string().map(str::to_string),
            datatype: K::NAME,
            precision: value.precision(),
            timezone: zone.is_present().then(|| zone.to_string()),
            zulu: value.is_time_zone_zulu(),
            epoch_millis: value.time_millis(),
        }
    }
}

/// Parse a field=amount pair
fn parse_add(s: &str) -> Result<(CalendarField, i32), String> {
    let (field, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid field adjustment: {}", s))?;
    let field = field.parse::<CalendarField>().map_err(|e| e.to_string())?;
    let amount = amount
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid amount '{}': {}", amount, e))?;
    Ok((field, amount))
}

/// Installs the log subscriber. `RUST_LOG` wins over `--log-level`.
pub fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main CLI execution function
pub fn run_cli(args: Args) -> CliResult<()> {
    init_logging(&args.log_level);
    let output = evaluate(&args)?;
    println!("{}", output);
    Ok(())
}

/// Evaluates the arguments and returns the text to print.
pub fn evaluate(args: &Args) -> CliResult<String> {
    match args.kind {
        Datatype::Date => evaluate_as::<DateKind>(args),
        Datatype::DateTime => evaluate_as::<DateTimeKind>(args),
        Datatype::Instant => evaluate_as::<InstantKind>(args),
    }
}

fn evaluate_as<K: TemporalKind>(args: &Args) -> CliResult<String> {
    let input = if args.v3 {
        match v3::to_fhir_syntax(&args.value) {
            Some(rewritten) => rewritten,
            None => return Err(CliError::InvalidArgument("blank V3 timestamp".to_string())),
        }
    } else {
        args.value.clone()
    };
    let mut value: DateTimeValue<K> = input.parse()?;
    info!("Parsed {} as {} at {} precision", args.value, K::NAME, value.precision());

    if let Some(precision) = args.precision {
        value.set_precision(precision)?;
    }
    if let Some(minutes) = args.offset_minutes {
        value.set_offset_minutes(minutes)?;
    }
    if args.zulu {
        value.set_time_zone_zulu(true);
    }
    for (field, amount) in &args.add {
        debug!("Adding {} {:?}", amount, field);
        value.add(*field, *amount)?;
    }

    if args.human {
        let text = if args.local {
            value.to_human_display_local_timezone()?
        } else {
            value.to_human_display()?
        };
        return Ok(text);
    }
    if args.json {
        return Ok(serde_json::to_string_pretty(&ValueReport::from(&value))?);
    }
    Ok(value.to_string())
}
