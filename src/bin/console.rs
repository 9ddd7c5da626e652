use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use equity_research_generator::llm::LlmClient;
use equity_research_generator::llm::gemini::GeminiProvider;
use equity_research_generator::pipeline::fetch_report;
use equity_research_generator::pipeline::orchestrator::ReportRequest;
use equity_research_generator::ui::{Event, Screen, render};
use equity_research_generator::{Config, llm};

/// Interactive terminal front-end: one search at a time, driven by the
/// screen state machine. Telemetry export stays on the server; the console
/// only logs locally.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let provider: Arc<dyn llm::Provider> = Arc::new(GeminiProvider::new(
        config.gemini_api_key.as_deref().unwrap_or(""),
    ));
    let llm_client = LlmClient::new(provider);

    println!("Equity research console. Type a company name, or \"quit\" to exit.");

    let mut screen = Screen::Search;
    loop {
        screen = match screen {
            Screen::Search => {
                let Some(input) = read_line("company> ")? else {
                    break;
                };
                if input == "quit" || input == "exit" {
                    break;
                }
                Screen::Search.apply(Event::Submit { company: input })
            }
            Screen::Loading { company } => {
                println!("Analyzing market data for \"{company}\"...");
                let request = ReportRequest {
                    company: company.clone(),
                };
                let result = fetch_report(&config, &llm_client, &request)
                    .await
                    .map(|generated| Box::new(generated.report))
                    .map_err(|e| e.user_message());
                Screen::Loading { company }.apply(Event::Settled { result })
            }
            Screen::Error { message } => {
                println!("Analysis failed: {message}");
                if read_line("[Enter] back to search ")?.is_none() {
                    break;
                }
                Screen::Error { message }.apply(Event::Back)
            }
            Screen::Dashboard { report } => {
                print!("{}", render::render_report(&report));
                if read_line("[Enter] new search ")?.is_none() {
                    break;
                }
                Screen::Dashboard { report }.apply(Event::Back)
            }
        };
    }

    Ok(())
}

/// Trimmed line from stdin, or `None` on EOF.
fn read_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        println!();
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
