use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tracker_sql::prelude::*;
use tracker_sql::sqlite::SqliteOptionsBuilder;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run tracker SQL templates against a SQLite database")]
struct Args {
    /// Database file; an in-memory database is used when omitted.
    #[arg(long)]
    database: Option<PathBuf>,
    /// Create the database file if it does not exist.
    #[arg(long)]
    create: bool,
    /// JSON settings file (dialect, property cache TTL).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Dialect used to render templates; ignored when --config sets one.
    #[arg(long, value_enum, default_value = "sqlite")]
    dialect: DialectKind,
    /// Create the tracker tables before anything else runs.
    #[arg(long)]
    init_schema: bool,
    /// Print the rendered statements instead of executing them.
    #[arg(long)]
    dry_run: bool,
    /// A `;`-separated script executed as one transaction.
    #[arg(long)]
    script: Option<PathBuf>,
    /// A single SELECT template whose rows are printed.
    #[arg(long)]
    query: Option<String>,
}

fn load_config(args: &Args) -> Result<DatabaseConfig, TrackerDbError> {
    match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|err| {
                TrackerDbError::ConfigError(format!("{}: {err}", path.display()))
            })?;
            DatabaseConfig::from_json_str(&json)
        }
        None => Ok(DatabaseConfig::default().with_dialect(args.dialect.dialect())),
    }
}

fn read_script(args: &Args) -> Result<Option<String>, TrackerDbError> {
    args.script
        .as_ref()
        .map(|path| {
            std::fs::read_to_string(path).map_err(|err| {
                TrackerDbError::ConfigError(format!("{}: {err}", path.display()))
            })
        })
        .transpose()
}

fn print_records(records: &RecordSet) {
    println!("{}", records.columns().join("\t"));
    for record in records {
        let cells: Vec<String> = record
            .values()
            .iter()
            .map(|value| match value {
                SqlValue::Null => "NULL".to_owned(),
                SqlValue::Text(text) => text.clone(),
                other => format!("{other:?}"),
            })
            .collect();
        println!("{}", cells.join("\t"));
    }
}

fn dry_run(config: &DatabaseConfig, script: Option<&str>, query: Option<&str>) -> Result<(), TrackerDbError> {
    let statements = match script {
        Some(script) => split_script(script)?,
        None => Vec::new(),
    };
    for template in statements.iter().map(String::as_str).chain(query) {
        let compiled = compile_template(template, &config.dialect)?;
        if compiled.parameter_count() > 0 {
            return Err(TrackerDbError::ParameterError(format!(
                "{} unbound parameter(s) in: {template}",
                compiled.parameter_count()
            )));
        }
        println!("{};", compiled.to_sql(&[], &config.dialect)?);
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), TrackerDbError> {
    let config = load_config(args)?;
    let script = read_script(args)?;
    if args.dry_run {
        return dry_run(&config, script.as_deref(), args.query.as_deref());
    }

    let builder = match &args.database {
        Some(path) => SqliteOptionsBuilder::new(path.to_string_lossy()),
        None => SqliteOptionsBuilder::in_memory(),
    };
    let db = builder.create(args.create).config(config).build()?;

    if args.init_schema {
        let created = install_schema(&db)?;
        tracing::info!(statements = created, "schema installed");
    }
    if let Some(script) = &script {
        let executed = db.execute_script(script)?;
        tracing::info!(statements = executed, "script committed");
    }
    if let Some(query) = &args.query {
        let records = db.create_statement(query)?.execute_query()?;
        print_records(&records);
    }
    for notification in db.take_notifications() {
        tracing::debug!(?notification, "notification");
    }
    db.close()
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "tracker-sql failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
