use std::fmt;
use std::sync::Arc;

use learn_core::model::Phase;
use services::{
    ChatContentGenerator, Clock, ContentGenerator, SessionError, SessionSettings, SessionStore,
    SessionView, StaticContentGenerator,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    ContentNotConfigured,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::ContentNotConfigured => {
                write!(f, "LEARN_AI_API_KEY is not set (use --offline for the built-in primer)")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--topic <text>] [--objective <text>]... [--offline] [--json]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --topic       what to learn (prompted for when omitted)");
    eprintln!("  --objective   a learning goal; may be repeated");
    eprintln!("  --offline     use the built-in Rust ownership primer instead of the AI service");
    eprintln!("  --json        print session views as JSON");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_TOPIC, LEARN_AI_API_KEY, LEARN_AI_BASE_URL, LEARN_AI_MODEL,");
    eprintln!("  LEARN_MIN_RELEVANCE, LEARN_MASTERY_THRESHOLD, RUST_LOG");
}

#[derive(Debug, Default)]
struct Args {
    topic: Option<String>,
    objectives: Vec<String>,
    offline: bool,
    json: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            topic: std::env::var("LEARN_TOPIC")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            ..Self::default()
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--topic" => parsed.topic = Some(require_value(args, "--topic")?),
                "--objective" => parsed.objectives.push(require_value(args, "--objective")?),
                "--offline" => parsed.offline = true,
                "--json" => parsed.json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

//
// ─── TERMINAL ──────────────────────────────────────────────────────────────────
//

struct Terminal {
    lines: Lines<BufReader<Stdin>>,
    json: bool,
}

impl Terminal {
    fn new(json: bool) -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            json,
        }
    }

    /// `None` once stdin is closed.
    async fn ask(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;
        Ok(self.lines.next_line().await?.map(|l| l.trim().to_string()))
    }

    async fn confirm(&mut self, prompt: &str, default: bool) -> std::io::Result<Option<bool>> {
        let Some(answer) = self.ask(prompt).await? else {
            return Ok(None);
        };
        Ok(Some(match answer.to_ascii_lowercase().as_str() {
            "" => default,
            "y" | "yes" => true,
            _ => false,
        }))
    }

    fn show(&self, view: &SessionView) -> Result<(), serde_json::Error> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(view)?);
            return Ok(());
        }
        match view.phase {
            Phase::Input => println!("\nSession cleared."),
            Phase::Learning => {
                println!("\n== {} ({}) ==\n", view.topic, view.relevance_score);
                println!("{}\n", view.summary);
            }
            Phase::Quiz => {
                println!("\nQuiz: {} questions", view.question_count);
            }
            Phase::Complete => {
                if let Some(result) = &view.result {
                    println!(
                        "\nScore: {}% ({}/{} correct){}",
                        result.score,
                        result.correct_count,
                        result.answered_count,
                        if result.mastered { ", mastered" } else { "" }
                    );
                }
            }
            Phase::Remediation => {
                for entry in &view.remediation {
                    println!("\nQ{}: {}", entry.question_index + 1, entry.question);
                    println!("  Answer: {}", entry.correct_answer);
                    println!("  {}", entry.explanation);
                }
            }
        }
        Ok(())
    }
}

//
// ─── SESSION LOOP ──────────────────────────────────────────────────────────────
//

enum Outcome {
    Finished,
    Quit,
}

async fn take_quiz(
    store: &SessionStore,
    term: &mut Terminal,
) -> Result<Option<SessionView>, Box<dyn std::error::Error>> {
    let view = store.begin_quiz().await?;
    term.show(&view)?;
    let questions = view.questions.unwrap_or_default();

    loop {
        let mut answers = Vec::with_capacity(questions.len());
        for (i, question) in questions.iter().enumerate() {
            println!("\n{}. {}", i + 1, question.question);
            for (o, option) in question.options.iter().enumerate() {
                println!("   {}) {option}", o + 1);
            }
            let Some(raw) = term.ask("> ").await? else {
                return Ok(None);
            };
            answers.push(
                raw.parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1)),
            );
        }

        match store.submit_answers(&answers).await {
            Ok(view) => return Ok(Some(view)),
            Err(SessionError::MalformedSubmission(err)) => {
                println!("\n{err}; try again.");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

async fn study(
    store: &SessionStore,
    term: &mut Terminal,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    loop {
        if term.ask("Press enter to start the quiz ").await?.is_none() {
            return Ok(Outcome::Quit);
        }
        let Some(view) = take_quiz(store, term).await? else {
            return Ok(Outcome::Quit);
        };
        term.show(&view)?;

        let Some(result) = store.result().await else {
            return Ok(Outcome::Finished);
        };
        let threshold = store.settings().mastery_threshold;
        if !term.json && !result.is_mastered(threshold) {
            println!("Mastery starts at {threshold}%.");
        }
        if !result.has_missed() {
            return Ok(Outcome::Finished);
        }
        match term.confirm("Review the questions you missed? [Y/n] ", true).await? {
            None => return Ok(Outcome::Quit),
            Some(false) => return Ok(Outcome::Finished),
            Some(true) => {}
        }

        let view = store.request_review().await?;
        term.show(&view)?;
        let view = store.finish_review().await?;

        match term.confirm("\nRetake the quiz? [y/N] ", false).await? {
            Some(true) => term.show(&view)?,
            Some(false) => return Ok(Outcome::Finished),
            None => return Ok(Outcome::Quit),
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let content: Arc<dyn ContentGenerator> = if args.offline {
        Arc::new(StaticContentGenerator::ownership_primer()?)
    } else {
        let chat = ChatContentGenerator::from_env();
        if !chat.enabled() {
            return Err(ArgsError::ContentNotConfigured.into());
        }
        Arc::new(chat)
    };

    let settings = SessionSettings::from_env();
    let store = SessionStore::new(content, Clock::system(), settings);
    let mut term = Terminal::new(args.json);

    let topic = match args.topic {
        Some(topic) => topic,
        None => match term.ask("What do you want to learn? ").await? {
            Some(topic) => topic,
            None => return Ok(()),
        },
    };

    info!(topic = %topic.trim(), offline = args.offline, "starting session");
    let view = store.start(&topic, &args.objectives).await?;
    term.show(&view)?;

    let outcome = study(&store, &mut term).await?;
    if matches!(outcome, Outcome::Finished) {
        println!("\nDone.");
    }

    let view = store.reset().await?;
    term.show(&view)?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
