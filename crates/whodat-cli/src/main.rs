use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use whodat_core::{Answer, KnowledgeBase, Session, SessionConfig, TurnOutput};

/// Interactive identification game over a JSON knowledge base.
#[derive(Debug, Parser)]
#[command(name = "whodat", author, version, about = "Guess-who engine CLI")]
struct Cli {
    /// Path to the candidate dataset (JSON array of {name, attributes}).
    #[arg(long, value_name = "FILE", default_value = "data/characters.json")]
    dataset: PathBuf,

    /// Path to the question bank (JSON map from attribute key to text).
    #[arg(long, value_name = "FILE", default_value = "data/questions.json")]
    questions: PathBuf,

    /// RNG seed for reproducible question sampling.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let dataset = fs::read_to_string(&cli.dataset)
        .with_context(|| format!("reading dataset at {}", cli.dataset.display()))?;
    let questions = fs::read_to_string(&cli.questions)
        .with_context(|| format!("reading question bank at {}", cli.questions.display()))?;
    let kb = std::sync::Arc::new(KnowledgeBase::from_json(&dataset, &questions)?);

    let config = SessionConfig::from_env();
    let mut session = match cli.seed {
        Some(seed) => Session::with_seed(kb.clone(), config, seed),
        None => Session::new(kb.clone(), config),
    };

    println!(
        "Welcome to whodat: {} candidates, {} traits. I will ask at least {} questions.",
        kb.candidate_count(),
        kb.attribute_count(),
        config.min_questions
    );
    println!("Answer with yes/no/probably/probably not (y/n/p/pn), or 'quit' to stop.");
    tracing::debug!(seed = session.seed(), "session created");

    let mut output = session.start();
    loop {
        match output {
            TurnOutput::Playing {
                question_text,
                attribute_key,
                questions_asked,
            } => {
                let answer = match read_answer(&question_text, questions_asked)? {
                    Some(answer) => answer,
                    None => {
                        println!("Goodbye!");
                        return Ok(());
                    }
                };
                tracing::debug!(attribute = %attribute_key, answer = %answer, "integrating answer");
                output = session.answer(&attribute_key, answer)?;
                for (name, prob) in session.top_candidates(5) {
                    tracing::debug!(candidate = %name, probability = prob, "ranking");
                }
            }
            TurnOutput::MakeGuess { guess, certainty } => {
                tracing::info!(guess = %guess, certainty, "emitting guess");
                let accepted = read_yes_no(&format!(
                    "I am {:.1}% sure. Are you thinking of {guess}?",
                    certainty * 100.0
                ))?;
                if accepted {
                    session.confirm_guess()?;
                    println!("Great! I knew it!");
                    return Ok(());
                }
                println!("Oh, I was mistaken about {guess}. Let me try again.");
                output = session.reject_guess(&guess)?;
            }
            TurnOutput::Failure {
                message,
                guess,
                certainty,
            } => {
                match guess {
                    Some(name) if certainty > 0.01 => println!(
                        "{message} My best guess was {name} ({:.1}%).",
                        certainty * 100.0
                    ),
                    _ => println!("{message}"),
                }
                return Ok(());
            }
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Asks one question; `None` means the player quit.
fn read_answer(question_text: &str, questions_asked: u32) -> Result<Option<Answer>> {
    loop {
        let raw = prompt(&format!(
            "Q{}: {question_text} (yes/no/probably/probably not):",
            questions_asked + 1
        ))?;
        if raw.eq_ignore_ascii_case("quit") {
            return Ok(None);
        }
        match raw.parse::<Answer>() {
            Ok(answer) => return Ok(Some(answer)),
            Err(err) => println!("{err}"),
        }
    }
}

fn read_yes_no(question: &str) -> Result<bool> {
    loop {
        let raw = prompt(&format!("{question} (yes/no):"))?;
        match raw.to_ascii_lowercase().as_str() {
            "yes" | "y" => return Ok(true),
            "no" | "n" => return Ok(false),
            _ => println!("Please answer yes or no."),
        }
    }
}

fn prompt(text: &str) -> Result<String> {
    print!("{text} ");
    io::stdout().flush()?;
    let mut line = String::new();
    let bytes = io::stdin().read_line(&mut line)?;
    if bytes == 0 {
        bail!("input closed");
    }
    Ok(line.trim().to_string())
}
