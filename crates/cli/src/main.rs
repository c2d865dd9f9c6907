use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use triage_agents::TriagePipeline;
use triage_core::{TriageRecord, DEFAULT_CITY, DISCLAIMER};
use triage_llm::{GeminiConfig, Generator, ScriptedGenerator};
use triage_observability::{init_tracing, AppMetrics};

#[derive(Debug, Parser)]
#[command(name = "triage")]
#[command(about = "TriageAI symptom router")]
struct Cli {
    /// Use canned replies instead of calling Gemini (no credential needed).
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full triage for one symptom.
    Run {
        #[arg(long)]
        symptom: String,
        #[arg(long, env = "TRIAGE_DEFAULT_CITY", default_value = DEFAULT_CITY)]
        city: String,
        #[arg(long)]
        json: bool,
    },
    /// Only classify and route a symptom.
    Classify {
        #[arg(long)]
        symptom: String,
    },
    /// Prompt for symptoms until `exit` or end of input.
    Interactive {
        #[arg(long, env = "TRIAGE_DEFAULT_CITY", default_value = DEFAULT_CITY)]
        city: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("triage_cli");
    let cli = Cli::parse();

    let pipeline = build_pipeline(cli.offline)?;

    match cli.command {
        Command::Run {
            symptom,
            city,
            json,
        } => {
            let record = match pipeline.submit(&symptom, &city).await {
                Ok(record) => record,
                Err(err) if err.is_input_error() => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
                Err(err) => return Err(err).context("triage failed"),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_record(&record);
            }
        }
        Command::Classify { symptom } => {
            let classified = match pipeline.classify(&symptom).await {
                Ok(classified) => classified,
                Err(err) if err.is_input_error() => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
                Err(err) => return Err(err).context("classification failed"),
            };
            println!("category:       {}", classified.category);
            println!("classification: {}", classified.classification.as_str());
            println!("branch:         {}", classified.branch);
        }
        Command::Interactive { city } => run_interactive(pipeline, &city).await?,
    }

    Ok(())
}

async fn run_interactive(pipeline: TriagePipeline<Generator>, default_city: &str) -> Result<()> {
    println!("TriageAI interactive mode. type 'exit' to quit.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let Some(symptom) = prompt_line(&mut lines, "Enter your symptom: ")? else {
            break;
        };
        if symptom.eq_ignore_ascii_case("exit") || symptom.eq_ignore_ascii_case("quit") {
            break;
        }

        let Some(city) = prompt_line(&mut lines, &format!("Enter your city/state [{default_city}]: "))? else {
            break;
        };
        let city = if city.is_empty() {
            default_city.to_string()
        } else {
            city
        };

        match pipeline.submit(&symptom, &city).await {
            Ok(record) => print_record(&record),
            Err(err) if err.is_input_error() => println!("\n{err}\n"),
            Err(err) => println!("\nTriage failed: {err}\n"),
        }
    }

    Ok(())
}

fn prompt_line<B: BufRead>(lines: &mut io::Lines<B>, prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}

fn print_record(record: &TriageRecord) {
    println!("\n## Diagnosis\n{}\n", record.answer);
    println!("## Advice\n{}\n", record.advice);
    println!("## Diet Suggestion\n{}\n", record.diet);
    println!("## Recommended Doctors & Hospitals\n{}\n", record.follow_up);
    println!("{DISCLAIMER}\n");
}

fn build_pipeline(offline: bool) -> Result<TriagePipeline<Generator>> {
    let generator = if offline {
        Generator::scripted(ScriptedGenerator::offline_demo())
    } else {
        let config = GeminiConfig::from_env()?;
        Generator::gemini(&config).context("failed to build Gemini client")?
    };

    Ok(TriagePipeline::new(Arc::new(generator), AppMetrics::shared()))
}
