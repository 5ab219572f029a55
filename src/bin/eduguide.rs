//! CLI binary for eduguide.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `CompanionConfig`, drives one flow per subcommand and prints the result.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use eduguide::counselling::{
    canonical_state, step_title, Branch, Category, CollegeType, Direction, Gender,
    LocationPreference, Priority, ProcessingTimeline, Region, Strategy, PROCESSING_STAGES,
};
use eduguide::report::{render_counselling, render_dashboard, render_printable, render_solutions};
use eduguide::{
    AnalysisReport, ChatSession, CompanionConfig, CounsellingFlow, DraftStore, Exam, FileStore,
    ProcessingStatus, ProgressCallback, WebhookClient,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

fn spinner(prefix: &str, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS),
    );
    bar.set_prefix(prefix.to_string());
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress for mock-test uploads: a spinner carrying the current
/// processing stage, switched to a page bar while a PDF is rasterised.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        Arc::new(Self {
            bar: spinner("Preparing", "Reading upload…"),
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
    }

    fn back_to_spinner(&self) {
        self.bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rendering {total_pages} PDF page(s)…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(page_num, Instant::now());
        }
    }

    fn on_page_complete(&self, page_num: usize, total: usize, encoded_len: usize) {
        let elapsed_ms = self
            .start_times
            .lock()
            .ok()
            .and_then(|mut t| t.remove(&page_num))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{:>7} KB", encoded_len / 1024)),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, _total_pages: usize) {
        self.back_to_spinner();
    }

    fn on_status(&self, status: ProcessingStatus) {
        self.bar.set_prefix(format!("{:>3}%", status.percent()));
        self.bar.set_message(status.to_string());
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Talk to the motivation coach (interactive; /clear, /exam neet, /quit)
  eduguide chat --exam neet

  # One-shot message
  eduguide chat "I scored 90 in my last mock and feel stuck"

  # Remember the exam you are preparing for
  eduguide exam set upsc

  # Step-by-step solutions for a question paper (JPG, PNG or PDF)
  eduguide solutions paper.pdf

  # Full analysis of a paper and your answer sheet, plus a printable report
  eduguide analyze paper.jpg answers.jpg --html report.html

  # Save the analysis as JSON and render the printable report later
  eduguide analyze paper.jpg answers.jpg --json > analysis.json
  eduguide report analysis.json -o report.html

  # JoSAA choice filling (fields are kept in a draft until submission)
  eduguide counsel --main-rank 15000 --category general --gender male \
      --home-state "Tamil Nadu" --branch cse --branch ece --save-draft
  eduguide counsel --strategy balanced

ENVIRONMENT VARIABLES:
  EDUGUIDE_WEBHOOK_BASE   Base URL of all four webhooks
  EDUGUIDE_STORAGE_DIR    Where the exam choice and counselling draft are kept
  PDFIUM_LIB_PATH         Path to libpdfium (PDF question papers only)
  RUST_LOG                Override log filtering (e.g. eduguide=debug)
"#;

/// Exam-preparation companion for JEE, NEET and UPSC aspirants.
#[derive(Parser, Debug)]
#[command(
    name = "eduguide",
    version,
    about = "Exam-preparation companion: motivation chat, mock-test analysis and JoSAA choice filling",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: Common,
}

#[derive(Args, Debug)]
struct Common {
    /// Base URL of the webhooks; each endpoint path is appended to it.
    #[arg(long, global = true, env = "EDUGUIDE_WEBHOOK_BASE")]
    webhook_base: Option<String>,

    /// Chat endpoint URL (overrides --webhook-base).
    #[arg(long, global = true, env = "EDUGUIDE_CHAT_URL")]
    chat_url: Option<String>,

    /// Counselling endpoint URL (overrides --webhook-base).
    #[arg(long, global = true, env = "EDUGUIDE_COUNSELLING_URL")]
    counselling_url: Option<String>,

    /// Solutions endpoint URL (overrides --webhook-base).
    #[arg(long, global = true, env = "EDUGUIDE_SOLUTIONS_URL")]
    solutions_url: Option<String>,

    /// Analysis endpoint URL (overrides --webhook-base).
    #[arg(long, global = true, env = "EDUGUIDE_ANALYSIS_URL")]
    analysis_url: Option<String>,

    /// Chat wait bound in seconds.
    #[arg(long, global = true, env = "EDUGUIDE_CHAT_TIMEOUT", default_value_t = 30)]
    chat_timeout: u64,

    /// Counselling wait bound in seconds.
    #[arg(long, global = true, env = "EDUGUIDE_COUNSELLING_TIMEOUT", default_value_t = 90)]
    counselling_timeout: u64,

    /// Solutions/analysis wait bound in seconds.
    #[arg(long, global = true, env = "EDUGUIDE_MOCK_TEST_TIMEOUT", default_value_t = 120)]
    mock_test_timeout: u64,

    /// Pages of a PDF question paper to render.
    #[arg(long, global = true, env = "EDUGUIDE_MAX_PDF_PAGES", default_value_t = 3)]
    max_pdf_pages: usize,

    /// PDF render scale factor.
    #[arg(long, global = true, env = "EDUGUIDE_RENDER_SCALE", default_value_t = 2.0)]
    render_scale: f32,

    /// JPEG quality for rendered pages (1–100).
    #[arg(long, global = true, env = "EDUGUIDE_JPEG_QUALITY", default_value_t = 85)]
    jpeg_quality: u8,

    /// Upload size ceiling in MB.
    #[arg(long, global = true, env = "EDUGUIDE_MAX_UPLOAD_MB", default_value_t = 10)]
    max_upload_mb: u64,

    /// Directory for the saved exam choice and counselling draft.
    #[arg(long, global = true, env = "EDUGUIDE_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// Disable spinners and progress bars.
    #[arg(long, global = true, env = "EDUGUIDE_NO_PROGRESS")]
    no_progress: bool,

    /// Disable colours in rendered reports.
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "EDUGUIDE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "EDUGUIDE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chat with the motivation coach.
    Chat {
        /// Exam context (defaults to the saved exam).
        #[arg(long)]
        exam: Option<Exam>,
        /// Send this message and exit instead of starting a session.
        message: Vec<String>,
    },
    /// Show or change the saved exam.
    Exam {
        #[command(subcommand)]
        action: ExamAction,
    },
    /// Step-by-step solutions for a question paper.
    Solutions {
        /// Question paper (JPG, PNG or PDF).
        paper: PathBuf,
        #[arg(long)]
        exam: Option<Exam>,
        /// Print the solutions as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Performance analysis of an answer sheet against its question paper.
    Analyze {
        /// Question paper (JPG or PNG).
        paper: PathBuf,
        /// Answer sheet (JPG or PNG).
        answer_sheet: PathBuf,
        #[arg(long)]
        exam: Option<Exam>,
        /// Print the normalised analysis as JSON (loadable by `report`).
        #[arg(long)]
        json: bool,
        /// Also write the printable HTML report here.
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Render a saved analysis (from `analyze --json`) as printable HTML.
    Report {
        input: PathBuf,
        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// JoSAA choice filling. Values are merged into the saved draft.
    Counsel(CounselArgs),
}

#[derive(Subcommand, Debug)]
enum ExamAction {
    Show,
    Set { exam: Exam },
}

#[derive(Args, Debug)]
struct CounselArgs {
    /// JEE Main all-India rank.
    #[arg(long)]
    main_rank: Option<String>,
    /// JEE Advanced all-India rank.
    #[arg(long)]
    advanced_rank: Option<String>,
    /// General, OBC-NCL, SC, ST, EWS or PwD.
    #[arg(long)]
    category: Option<Category>,
    /// Male, Female or Other.
    #[arg(long)]
    gender: Option<Gender>,
    #[arg(long)]
    home_state: Option<String>,
    /// Branch in preference order; repeat the flag (cse, ece, ee, me, ce,
    /// che, ae, bt, mme, other, or the full name). Replaces the draft's list.
    #[arg(long = "branch", value_parser = parse_branch)]
    branches: Vec<Branch>,
    /// IIT, NIT, IIIT or GFTI; repeat the flag. Replaces the draft's list.
    #[arg(long = "college-type")]
    college_types: Vec<CollegeType>,
    /// any, home or region.
    #[arg(long)]
    location: Option<LocationPreference>,
    /// North, South, East or West (with --location region).
    #[arg(long)]
    region: Option<Region>,
    /// Conservative, Balanced or Aggressive.
    #[arg(long)]
    strategy: Option<Strategy>,
    /// All four priorities, most important first (placement, reputation,
    /// branch, location).
    #[arg(long = "priority", value_parser = parse_priority)]
    priorities: Vec<Priority>,
    /// Save the merged draft and exit without submitting.
    #[arg(long)]
    save_draft: bool,
    /// Start from an empty form instead of the saved draft.
    #[arg(long)]
    discard_draft: bool,
}

fn parse_branch(s: &str) -> Result<Branch, String> {
    let branch = match s.trim().to_ascii_lowercase().as_str() {
        "cse" | "cs" => Branch::ComputerScience,
        "ece" => Branch::ElectronicsCommunication,
        "ee" => Branch::ElectricalEngineering,
        "me" => Branch::MechanicalEngineering,
        "ce" => Branch::CivilEngineering,
        "che" => Branch::ChemicalEngineering,
        "ae" => Branch::AerospaceEngineering,
        "bt" => Branch::Biotechnology,
        "mme" => Branch::MetallurgicalEngineering,
        "other" => Branch::OtherBranches,
        _ => return s.parse(),
    };
    Ok(branch)
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    let priority = match s.trim().to_ascii_lowercase().as_str() {
        "placement" => Priority::PlacementRecord,
        "reputation" | "ranking" | "college" => Priority::CollegeReputation,
        "branch" => Priority::BranchPreference,
        "location" | "proximity" => Priority::LocationProximity,
        _ => return s.parse(),
    };
    Ok(priority)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let common = &cli.common;

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would tear through the spinners; keep them at
    // error level unless the user asked for detail.
    let show_progress = !common.quiet && !common.no_progress && io::stderr().is_terminal();
    let filter = if common.verbose {
        "debug"
    } else if common.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let colour = !common.no_color && io::stdout().is_terminal();
    let drafts = open_drafts(common)?;

    match &cli.command {
        Command::Chat { exam, message } => {
            let config = build_config(common, None)?;
            run_chat(&config, drafts, *exam, message.join(" "), show_progress).await
        }
        Command::Exam { action } => {
            match action {
                ExamAction::Show => {
                    let exam = drafts.load_exam().context("Failed to read saved exam")?;
                    println!("{} {}", exam.icon(), exam.name());
                }
                ExamAction::Set { exam } => {
                    drafts.save_exam(*exam).context("Failed to save exam")?;
                    if !common.quiet {
                        eprintln!("{} Exam set to {}", green("✔"), bold(exam.name()));
                    }
                }
            }
            Ok(())
        }
        Command::Solutions { paper, exam, json } => {
            let progress = show_progress.then(CliProgressCallback::new_dynamic);
            let config = build_config(common, progress.clone())?;
            let mut session = eduguide::MockTestSession::new(&config, WebhookClient::new(), drafts)
                .context("Failed to open mock-test session")?;
            if let Some(e) = exam {
                session.set_exam(*e).context("Failed to save exam")?;
            }
            session
                .select_question_paper(paper)
                .await
                .with_context(|| format!("Cannot use {}", paper.display()))?;

            let outcome = session.generate_solutions().await;
            if let Some(p) = &progress {
                p.finish();
            }
            let report = outcome.map_err(|e| {
                anyhow::anyhow!("{}", session.error().map(str::to_owned).unwrap_or_else(|| e.to_string()))
            })?;

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialise solutions")?
                );
            } else {
                print!("{}", render_solutions(&report, colour));
            }
            Ok(())
        }
        Command::Analyze {
            paper,
            answer_sheet,
            exam,
            json,
            html,
        } => {
            let progress = show_progress.then(CliProgressCallback::new_dynamic);
            let config = build_config(common, progress.clone())?;
            let mut session = eduguide::MockTestSession::new(&config, WebhookClient::new(), drafts)
                .context("Failed to open mock-test session")?;
            if let Some(e) = exam {
                session.set_exam(*e).context("Failed to save exam")?;
            }
            session
                .select_question_paper(paper)
                .await
                .with_context(|| format!("Cannot use {}", paper.display()))?;
            session
                .select_answer_sheet(answer_sheet)
                .await
                .with_context(|| format!("Cannot use {}", answer_sheet.display()))?;

            let outcome = session.generate_analysis().await;
            if let Some(p) = &progress {
                p.finish();
            }
            let report = outcome.map_err(|e| {
                anyhow::anyhow!("{}", session.error().map(str::to_owned).unwrap_or_else(|| e.to_string()))
            })?;

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialise analysis")?
                );
            } else {
                print!("{}", render_dashboard(&report, colour));
            }
            if let Some(path) = html {
                write_printable(&report, path).await?;
                if !common.quiet {
                    eprintln!("{} Printable report → {}", green("✔"), bold(&path.display().to_string()));
                }
            }
            Ok(())
        }
        Command::Report { input, output } => {
            let raw = tokio::fs::read_to_string(input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let report: AnalysisReport = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a saved analysis", input.display()))?;
            match output {
                Some(path) => write_printable(&report, path).await?,
                None => println!("{}", render_printable(&report).context("Failed to render report")?),
            }
            Ok(())
        }
        Command::Counsel(args) => {
            let config = build_config(common, None)?;
            run_counsel(&config, drafts, args, show_progress, colour).await
        }
    }
}

/// Map CLI args to `CompanionConfig`.
fn build_config(
    common: &Common,
    progress: Option<Arc<CliProgressCallback>>,
) -> Result<CompanionConfig> {
    let mut builder = CompanionConfig::builder();
    if let Some(base) = &common.webhook_base {
        builder = builder.webhook_base(base);
    }
    if let Some(url) = &common.chat_url {
        builder = builder.chat_url(url.clone());
    }
    if let Some(url) = &common.counselling_url {
        builder = builder.counselling_url(url.clone());
    }
    if let Some(url) = &common.solutions_url {
        builder = builder.solutions_url(url.clone());
    }
    if let Some(url) = &common.analysis_url {
        builder = builder.analysis_url(url.clone());
    }
    builder = builder
        .chat_timeout_secs(common.chat_timeout)
        .counselling_timeout_secs(common.counselling_timeout)
        .mock_test_timeout_secs(common.mock_test_timeout)
        .max_pdf_pages(common.max_pdf_pages)
        .render_scale(common.render_scale)
        .jpeg_quality(common.jpeg_quality)
        .max_upload_mb(common.max_upload_mb);
    if let Some(dir) = &common.storage_dir {
        builder = builder.storage_dir(dir.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

fn open_drafts(common: &Common) -> Result<DraftStore> {
    let store = match &common.storage_dir {
        Some(dir) => FileStore::new(dir.clone()),
        None => FileStore::in_data_dir().context("No data directory for saved drafts")?,
    };
    Ok(DraftStore::new(Arc::new(store)))
}

async fn write_printable(report: &AnalysisReport, path: &Path) -> Result<()> {
    let html = render_printable(report).context("Failed to render report")?;
    tokio::fs::write(path, html)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

// ── chat ─────────────────────────────────────────────────────────────────────

async fn run_chat(
    config: &CompanionConfig,
    drafts: DraftStore,
    exam: Option<Exam>,
    message: String,
    show_progress: bool,
) -> Result<()> {
    let mut session = ChatSession::new(config, WebhookClient::new(), drafts)
        .context("Failed to open chat session")?;
    if let Some(exam) = exam {
        session.set_exam(exam).context("Failed to save exam")?;
    }

    if !message.trim().is_empty() {
        send_and_print(&mut session, &message, show_progress).await;
        return Ok(());
    }

    println!("{} {}\n", cyan("AI"), session.messages()[0].content);
    eprintln!("{}", dim("/clear to restart, /exam <jee|neet|upsc> to switch, /quit to leave"));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", bold(">"));
        io::stdout().flush().ok();
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let line = line.trim();
        match line {
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                println!("{} {}\n", cyan("AI"), session.messages()[0].content);
            }
            cmd if cmd.starts_with("/exam") => {
                match cmd.trim_start_matches("/exam").trim().parse::<Exam>() {
                    Ok(exam) => {
                        if let Err(e) = session.set_exam(exam) {
                            eprintln!("{} Could not save exam choice: {e}", red("✘"));
                        }
                        println!("{} {}\n", cyan("AI"), session.messages()[0].content);
                    }
                    Err(e) => eprintln!("{} {e}", red("✘")),
                }
            }
            text => send_and_print(&mut session, text, show_progress).await,
        }
    }
    Ok(())
}

async fn send_and_print(session: &mut ChatSession, text: &str, show_progress: bool) {
    let Some(pending) = session.begin_send(text) else {
        return;
    };
    let typing = (show_progress && session.is_typing()).then(|| spinner("", "typing…"));
    let outcome = pending.wait().await;
    if let Some(bar) = typing {
        bar.finish_and_clear();
    }
    let reply = session.finish(outcome);
    if reply.is_error() {
        println!("{} {}\n", red("AI"), reply.content);
    } else {
        println!("{} {}\n", cyan("AI"), reply.content);
    }
}

// ── counsel ──────────────────────────────────────────────────────────────────

async fn run_counsel(
    config: &CompanionConfig,
    drafts: DraftStore,
    args: &CounselArgs,
    show_progress: bool,
    colour: bool,
) -> Result<()> {
    if args.discard_draft {
        drafts.clear_draft().context("Failed to discard draft")?;
    }
    let mut flow = CounsellingFlow::new(config, WebhookClient::new(), drafts)
        .context("Failed to open counselling session")?;
    apply_args(&mut flow, args)?;

    if args.save_draft {
        flow.save_draft().context("Failed to save draft")?;
        eprintln!("{} Draft saved", green("✔"));
        return Ok(());
    }

    let wizard = flow.wizard_mut();
    while !wizard.is_last_step() {
        if !wizard.next() {
            report_step_errors(wizard.step(), wizard.errors().iter());
            bail!(
                "Step {} is incomplete; pass the missing fields (add --save-draft to keep them)",
                wizard.step()
            );
        }
    }

    let timeline = ProcessingTimeline::start();
    let bar = show_progress.then(|| spinner("  0%", PROCESSING_STAGES[0].text));
    let outcome = {
        let submit = flow.submit();
        tokio::pin!(submit);
        let mut ticker = tokio::time::interval(Duration::from_millis(500));
        loop {
            tokio::select! {
                result = &mut submit => break result,
                _ = ticker.tick() => {
                    if let Some(bar) = &bar {
                        let point = timeline.now();
                        bar.set_prefix(format!("{:>3.0}%", point.percent));
                        bar.set_message(PROCESSING_STAGES[point.stage].text);
                    }
                }
            }
        }
    };
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    match outcome {
        Ok(response) => {
            let record = flow.submitted().cloned().unwrap_or_default();
            print!("{}", render_counselling(&response, &record, colour));
            Ok(())
        }
        Err(eduguide::EduGuideError::Validation(errors)) => {
            report_step_errors(flow.wizard().step(), errors.iter());
            bail!("The form is incomplete")
        }
        Err(e) => {
            let banner = flow.error().map(str::to_owned).unwrap_or_else(|| e.to_string());
            bail!("{banner}")
        }
    }
}

fn apply_args(flow: &mut CounsellingFlow, args: &CounselArgs) -> Result<()> {
    let wizard = flow.wizard_mut();
    if let Some(rank) = &args.main_rank {
        wizard.set_main_rank(rank.clone());
    }
    if let Some(rank) = &args.advanced_rank {
        wizard.set_advanced_rank(rank.clone());
    }
    if let Some(category) = args.category {
        wizard.set_category(category);
    }
    if let Some(gender) = args.gender {
        wizard.set_gender(gender);
    }
    if let Some(state) = &args.home_state {
        let canonical = canonical_state(state)
            .with_context(|| format!("Unknown state '{state}'"))?;
        wizard.set_home_state(canonical);
    }
    if !args.branches.is_empty() {
        for b in wizard.record().branches.clone() {
            wizard.toggle_branch(b);
        }
        for &b in &args.branches {
            if !wizard.record().branches.contains(&b) {
                wizard.toggle_branch(b);
            }
        }
    }
    if !args.college_types.is_empty() {
        for c in wizard.record().college_types.clone() {
            wizard.toggle_college_type(c);
        }
        for &c in &args.college_types {
            if !wizard.record().college_types.contains(&c) {
                wizard.toggle_college_type(c);
            }
        }
    }
    if let Some(mode) = args.location {
        wizard.set_location_preference(mode);
    }
    if let Some(region) = args.region {
        wizard.set_preferred_region(region);
    }
    if let Some(strategy) = args.strategy {
        wizard.set_strategy(strategy);
    }
    if !args.priorities.is_empty() {
        let mut wanted = args.priorities.clone();
        wanted.dedup();
        if wanted.len() != Priority::ALL.len() || Priority::ALL.iter().any(|p| !wanted.contains(p)) {
            bail!("--priority must name all four priorities exactly once");
        }
        for (target, want) in wanted.iter().enumerate() {
            let Some(mut at) = wizard.record().priorities.as_slice().iter().position(|p| p == want)
            else {
                continue;
            };
            while at > target && wizard.move_priority(at, Direction::Up) {
                at -= 1;
            }
        }
    }
    Ok(())
}

fn report_step_errors<'a>(step: u8, errors: impl Iterator<Item = (&'a str, &'a str)>) {
    let (title, _) = step_title(step);
    eprintln!("{} {}", red("✘"), bold(&format!("Step {step}: {title}")));
    for (field, message) in errors {
        eprintln!("  {} {}  {}", red("•"), message, dim(&format!("({field})")));
    }
}
