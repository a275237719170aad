use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, Confirm, DeleteOutcome, HttpRecordGateway, RecordGateway, RecordListController,
};
use shared::{
    domain::{RecordId, StudentId, SubjectId},
    protocol::Record,
};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "averages", about = "Manage student averages on the grades service")]
struct Args {
    /// Service root, e.g. http://localhost:8081/servicesRest/WsColegio
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every average currently stored
    List {
        #[arg(long)]
        json: bool,
    },
    /// Create a new average
    Add {
        #[arg(long)]
        student: i64,
        #[arg(long)]
        subject: i64,
        #[arg(long, required = true, num_args = 3, value_names = ["S1", "S2", "S3"])]
        scores: Vec<f64>,
    },
    /// Change an existing average; omitted fields keep their value
    Edit {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        student: Option<i64>,
        #[arg(long)]
        subject: Option<i64>,
        #[arg(long, num_args = 3, value_names = ["S1", "S2", "S3"])]
        scores: Option<Vec<f64>>,
    },
    /// Delete an average after confirmation
    Delete {
        #[arg(long)]
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Asks on the terminal unless `--yes` was given.
struct TerminalConfirm {
    assume_yes: bool,
}

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        if write_prompt(&mut tokio::io::stdout(), prompt).await.is_err() {
            return false;
        }

        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(_) => is_affirmative(&line),
            Err(_) => false,
        }
    }
}

async fn write_prompt<W: AsyncWrite + Unpin>(out: &mut W, prompt: &str) -> std::io::Result<()> {
    out.write_all(format!("{prompt} [y/N] ").as_bytes()).await?;
    out.flush().await
}

fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "s" | "si"
    )
}

fn scores_array(scores: &[f64]) -> Result<[f64; 3]> {
    scores
        .try_into()
        .map_err(|_| anyhow!("expected exactly three scores, got {}", scores.len()))
}

fn print_table(records: &[Record]) {
    if records.is_empty() {
        println!("No averages stored.");
        return;
    }
    println!(
        "{:>6}  {:>8}  {:>8}  {:>6}  {:>6}  {:>6}  {:>7}",
        "id", "student", "subject", "s1", "s2", "s3", "average"
    );
    for record in records {
        let id = record
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:>6}  {:>8}  {:>8}  {:>6.2}  {:>6.2}  {:>6.2}  {:>7.2}",
            id,
            record.student_id,
            record.subject_id,
            record.score1,
            record.score2,
            record.score3,
            record.display_average()
        );
    }
}

/// A write can succeed while the follow-up refresh fails; surface that too.
fn ensure_no_notice<G: RecordGateway, C: Confirm>(
    ctl: &mut RecordListController<G, C>,
) -> Result<()> {
    match ctl.take_notice() {
        Some(notice) => bail!(notice.summary()),
        None => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(base_url) = &args.base_url {
        settings = settings.with_base_url(base_url);
    }
    info!(base_url = %settings.base_url, "using grades service");

    let gateway = HttpRecordGateway::from_settings(&settings)
        .with_context(|| format!("failed to set up client for {}", settings.base_url))?;
    let assume_yes = matches!(args.command, Command::Delete { yes: true, .. });
    let mut ctl = RecordListController::new(gateway, TerminalConfirm { assume_yes });

    match args.command {
        Command::List { json } => {
            ctl.load().await.context("failed to load averages")?;
            if json {
                println!("{}", serde_json::to_string_pretty(ctl.records())?);
            } else {
                print_table(ctl.records());
            }
        }
        Command::Add {
            student,
            subject,
            scores,
        } => {
            let draft = ctl.draft_mut();
            draft.student_id = StudentId(student);
            draft.subject_id = SubjectId(subject);
            draft.set_scores(scores_array(&scores)?);
            let receipt = ctl.save().await.context("failed to create average")?;
            println!("Created (HTTP {}).", receipt.status);
            ensure_no_notice(&mut ctl)?;
            print_table(ctl.records());
        }
        Command::Edit {
            id,
            student,
            subject,
            scores,
        } => {
            ctl.load().await.context("failed to load averages")?;
            let existing = ctl
                .records()
                .iter()
                .find(|r| r.id == Some(RecordId(id)))
                .cloned()
                .with_context(|| format!("no average with id {id}"))?;
            ctl.begin_edit(&existing);

            let draft = ctl.draft_mut();
            if let Some(student) = student {
                draft.student_id = StudentId(student);
            }
            if let Some(subject) = subject {
                draft.subject_id = SubjectId(subject);
            }
            if let Some(scores) = scores {
                draft.set_scores(scores_array(&scores)?);
            }
            let receipt = ctl.save().await.context("failed to update average")?;
            println!("Updated average {id} (HTTP {}).", receipt.status);
            ensure_no_notice(&mut ctl)?;
            print_table(ctl.records());
        }
        Command::Delete { id, .. } => {
            match ctl
                .delete_record(Some(RecordId(id)))
                .await
                .context("failed to delete average")?
            {
                DeleteOutcome::Skipped => println!("Nothing to delete: id {id} is not valid."),
                DeleteOutcome::Declined => println!("Kept average {id}."),
                DeleteOutcome::Removed(receipt) => {
                    println!("Deleted average {id} (HTTP {}).", receipt.status);
                    ensure_no_notice(&mut ctl)?;
                    print_table(ctl.records());
                }
            }
        }
    }

    Ok(())
}
