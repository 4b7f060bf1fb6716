use anyhow::{Context, bail};
use campusnest_cli::generator::{self, GenerateConfig};
use campusnest_config::{DatabaseConfig, ImportConfig};
use campusnest_db::{PgStudentStore, init_db_pool, run_migrations};
use campusnest_import::{
    ImportOptions, ImportSession, ParseLimits, ParsedCsv, UploadedFile, import_student_batch,
    student_csv_template,
};
use campusnest_models::ids::{ImportSessionId, UserId};
use campusnest_models::imports::ImportAudit;
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use dotenvy::dotenv;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

/// Row errors printed by `check` before summarizing the rest.
const MAX_PRINTED_ROW_ERRORS: usize = 20;

#[derive(Parser)]
#[command(name = "campusnest-cli")]
#[command(about = "CampusNest CLI - Student import tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the empty student import template
    Template {
        /// Output file (prints to stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Validate a student CSV without importing it
    Check {
        /// CSV file to validate
        file: PathBuf,
    },
    /// Import a student CSV into the database
    Import {
        /// CSV file to import
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,

        /// User id recorded as the importer
        #[arg(long)]
        actor: Option<Uuid>,
    },
    /// Generate a CSV of fake students
    Generate {
        /// Number of valid students
        #[arg(short = 'c', long, default_value = "1000")]
        count: usize,

        /// Output file
        #[arg(short = 'o', long, default_value = "students.csv")]
        output: PathBuf,

        /// Extra rows repeating earlier ID numbers
        #[arg(long, default_value = "0")]
        duplicates: usize,

        /// Extra rows that fail validation
        #[arg(long, default_value = "0")]
        invalid: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    campusnest_observability::init_basic_console_logging();

    let cli = Cli::parse();
    let config = ImportConfig::from_env();

    match cli.command {
        Commands::Template { output } => handle_template(output),
        Commands::Check { file } => handle_check(&file, &config),
        Commands::Import { file, yes, actor } => handle_import(&file, &config, yes, actor).await,
        Commands::Generate {
            count,
            output,
            duplicates,
            invalid,
        } => handle_generate(count, &output, duplicates, invalid),
    }
}

fn handle_template(output: Option<PathBuf>) -> anyhow::Result<()> {
    let template = student_csv_template().context("Failed to build the CSV template")?;
    match output {
        Some(path) => {
            std::fs::write(&path, template)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Template written to {}", path.display());
        }
        None => print!("{}", template),
    }
    Ok(())
}

fn read_upload(path: &Path) -> anyhow::Result<UploadedFile> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(UploadedFile::new(file_name, None, bytes))
}

fn print_parse_report(parsed: &ParsedCsv) {
    println!(
        "📄 {} rows: {} valid, {} invalid",
        parsed.total_count(),
        parsed.valid_count(),
        parsed.invalid_count()
    );

    let errors: Vec<_> = parsed.errors.values().flatten().collect();
    for error in errors.iter().take(MAX_PRINTED_ROW_ERRORS) {
        println!("   ❌ {}", error);
    }
    if errors.len() > MAX_PRINTED_ROW_ERRORS {
        println!("   ... and {} more", errors.len() - MAX_PRINTED_ROW_ERRORS);
    }
}

fn handle_check(path: &Path, config: &ImportConfig) -> anyhow::Result<()> {
    let file = read_upload(path)?;
    let limits = ParseLimits {
        max_file_bytes: config.max_file_bytes,
    };
    let parsed = campusnest_import::parse_student_csv(&file, &limits)?;
    print_parse_report(&parsed);

    if parsed.invalid_count() > 0 {
        bail!("{} row(s) need fixing before import", parsed.invalid_count());
    }
    println!("✅ File is ready to import");
    Ok(())
}

async fn handle_import(
    path: &Path,
    config: &ImportConfig,
    yes: bool,
    actor: Option<Uuid>,
) -> anyhow::Result<()> {
    let file = read_upload(path)?;
    let limits = ParseLimits {
        max_file_bytes: config.max_file_bytes,
    };

    let mut session = ImportSession::new();
    session.upload(&file, &limits)?;
    if let Some(parsed) = session.parsed() {
        print_parse_report(parsed);
    }

    let ticket = session.begin_import()?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Import {} students?", ticket.len()))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Import cancelled");
            return Ok(());
        }
    }

    let db_config = DatabaseConfig::from_env().context("DATABASE_URL must be set")?;
    let pool = init_db_pool(&db_config)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool).await.context("Failed to run migrations")?;
    let store = PgStudentStore::new(pool);

    let options = ImportOptions {
        chunk_size: config.chunk_size,
        detail_limit: config.detail_limit,
        audit: ImportAudit {
            imported_by: actor.map(UserId::from),
            session_id: Some(ImportSessionId::new()),
        },
    };

    let start_time = Instant::now();
    println!("📥 Importing {} students...", ticket.len());

    let outcome = import_student_batch(&store, ticket.students(), &options, |progress| {
        println!(
            "   batch {}/{}: {} of {} processed ({}%)",
            progress.current_batch,
            progress.total_batches,
            progress.imported_count,
            progress.total_count,
            progress.percentage
        );
    })
    .await;

    let failure = outcome.as_ref().err().map(ToString::to_string);
    session.finish(ticket, outcome)?;

    if let Some(message) = failure {
        bail!(message);
    }
    if let Some(result) = session.result() {
        print!("\n{}", result.summary());
    }
    println!("✅ Done in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

fn handle_generate(
    count: usize,
    output: &Path,
    duplicates: usize,
    invalid: usize,
) -> anyhow::Result<()> {
    let start_time = Instant::now();
    println!("🎲 Generating {} students...", count);

    let rows = generator::generate_rows(&GenerateConfig {
        count,
        duplicates,
        invalid,
    });
    generator::write_csv(output, &rows)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "✅ Wrote {} rows to {} in {:.2}s",
        rows.len(),
        output.display(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}
