//! Command-line entry for rollcall.
//!
//! # Responsibility
//! - Load classroom snapshots into the attendance store.
//! - Expose merge, summary, mark, report and classify use-cases.
//!
//! Settings come from `ROLLCALL_*` variables first; flags override them.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use rollcall_core::db::{open_db, open_db_in_memory};
use rollcall_core::{
    build_report, classify_material, compute_stats, import_snapshot, init_logging, render_text,
    AttendanceService, AttendanceStatus, ClassroomSnapshot, CoreConfig, SortOrder,
    SqliteClassroomRepository, SqliteSessionRepository,
};
use rusqlite::Connection;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rollcall", version, about = "Classroom attendance roster tools")]
struct Cli {
    /// SQLite database file; in-memory when omitted.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Classroom snapshot (JSON) imported before the command runs.
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Absolute directory for rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    #[arg(long, global = true, value_enum)]
    sort: Option<SortArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Roster,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Name => SortOrder::Name,
            SortArg::Roster => SortOrder::Roster,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Present,
    Absent,
    Unmarked,
}

impl From<StatusArg> for AttendanceStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Present => AttendanceStatus::Present,
            StatusArg::Absent => AttendanceStatus::Absent,
            StatusArg::Unmarked => AttendanceStatus::Unmarked,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import the snapshot and exit.
    Import,
    /// Print one session's merged attendance and stats as JSON.
    Merge {
        #[arg(long)]
        classroom: String,
        #[arg(long)]
        session: String,
    },
    /// Print cross-session stats as seen by a caller.
    Summary {
        #[arg(long)]
        classroom: String,
        /// Caller email; owners get the whole-class view.
        #[arg(long = "as")]
        caller: String,
    },
    /// Change one student's status as the given caller.
    Mark {
        #[arg(long)]
        classroom: String,
        #[arg(long)]
        session: String,
        #[arg(long)]
        student: String,
        #[arg(long, value_enum)]
        status: StatusArg,
        #[arg(long = "as")]
        caller: String,
    },
    /// Render the paginated attendance report.
    Report {
        #[arg(long)]
        classroom: String,
        /// Summary perspective; defaults to the classroom's primary teacher.
        #[arg(long = "as")]
        caller: Option<String>,
        #[arg(long)]
        rows_per_page: Option<usize>,
        #[arg(long)]
        utc_offset_minutes: Option<i32>,
        /// Emit JSON instead of a text table.
        #[arg(long)]
        json: bool,
    },
    /// Classify a material as file, link or video.
    Classify {
        #[arg(long = "type")]
        declared: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        file_name: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MergeOutput<'a> {
    session_id: &'a str,
    records: &'a [rollcall_core::AttendanceRecord],
    stats: rollcall_core::AttendanceStats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }

    let snapshot = cli.snapshot.as_ref();
    match cli.command {
        Command::Import => {
            with_service(&config, snapshot, |_| Ok(()))?;
            println!("imported");
        }
        Command::Merge { classroom, session } => with_service(&config, snapshot, |service| {
            let board = service.open_board(&classroom, &session, config.sort_order)?;
            let output = MergeOutput {
                session_id: board.session_id(),
                records: board.records(),
                stats: compute_stats(board.records()),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        })?,
        Command::Summary { classroom, caller } => with_service(&config, snapshot, |service| {
            let summary = service.classroom_summary(&classroom, &caller)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        })?,
        Command::Mark {
            classroom,
            session,
            student,
            status,
            caller,
        } => with_service(&config, snapshot, |service| {
            let access = service.load_access(&classroom)?;
            let caller = access.caller(&caller);
            let mut board = service.open_board(&classroom, &session, config.sort_order)?;
            let stats = service.mark(&mut board, &caller, &student, status.into())?;
            info!("event=cli_mark module=cli status=ok session_id={session}");
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        })?,
        Command::Report {
            classroom,
            caller,
            rows_per_page,
            utc_offset_minutes,
            json,
        } => with_service(&config, snapshot, |service| {
            let access = service.load_access(&classroom)?;
            let caller = caller.unwrap_or_else(|| access.teacher_email());
            let mut options = config.report_options();
            if let Some(rows) = rows_per_page {
                options.rows_per_page = rows;
            }
            if let Some(minutes) = utc_offset_minutes {
                options.utc_offset_minutes = minutes;
            }

            let sessions = service.merged_sessions(&classroom, config.sort_order)?;
            let summary = service.classroom_summary(&classroom, &caller)?;
            let report = build_report(&access.classroom.name, &sessions, summary, options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_text(&report));
            }
            Ok(())
        })?,
        Command::Classify {
            declared,
            url,
            file_name,
        } => {
            let kind = classify_material(declared.as_deref(), url.as_deref(), file_name.as_deref());
            println!("{}", kind.as_str());
        }
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<CoreConfig> {
    let mut config = CoreConfig::from_env();
    if let Some(db) = &cli.db {
        config.db_path = Some(db.clone());
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(sort) = cli.sort {
        config.sort_order = sort.into();
    }
    config.validate()?;
    Ok(config)
}

type StoreService<'conn> =
    AttendanceService<SqliteClassroomRepository<'conn>, SqliteSessionRepository<'conn>>;

/// Opens the store, imports the snapshot and runs `command` against it.
fn with_service<F>(config: &CoreConfig, snapshot: Option<&PathBuf>, command: F) -> Result<()>
where
    F: for<'conn> FnOnce(&StoreService<'conn>) -> Result<()>,
{
    let conn = open_store(config, snapshot)?;
    let service = AttendanceService::new(
        SqliteClassroomRepository::new(&conn),
        SqliteSessionRepository::new(&conn),
        config.saved_clear_after_ms,
    );
    command(&service)
}

fn open_store(config: &CoreConfig, snapshot: Option<&PathBuf>) -> Result<Connection> {
    let conn = match &config.db_path {
        Some(path) => open_db(path)
            .with_context(|| format!("failed to open database `{}`", path.display()))?,
        None => open_db_in_memory().context("failed to open in-memory database")?,
    };

    match snapshot {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read snapshot `{}`", path.display()))?;
            let snapshot = ClassroomSnapshot::from_json(&text)?;
            import_snapshot(&conn, &snapshot)?;
        }
        None if config.db_path.is_none() => {
            bail!("nothing to read: pass --snapshot, --db or set ROLLCALL_DB")
        }
        None => {}
    }
    Ok(conn)
}
