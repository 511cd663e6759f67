use crate::session::{evaluate, CredentialState, Evaluation};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub path: String,
    pub token: Option<SecretString>,
    pub api_url: Url,
    pub json: bool,
}

/// Evaluate the navigation gate for one path and print the outcome.
/// # Errors
/// Returns an error if the result cannot be serialized.
pub fn execute(args: &Args) -> Result<()> {
    let token = args.token.as_ref().map(ExposeSecret::expose_secret);
    let evaluation = evaluate(&args.path, token);

    if args.json {
        let output =
            serde_json::to_string_pretty(&evaluation).context("Failed to serialize evaluation")?;
        println!("{output}");
    } else {
        println!("{}", render(&args.path, &evaluation));
        println!("backend: {}", args.api_url);
    }

    Ok(())
}

fn render(path: &str, evaluation: &Evaluation) -> String {
    let credential = match evaluation.credential {
        CredentialState::Absent => "no credential".to_string(),
        CredentialState::Invalid => "invalid credential (would be dropped)".to_string(),
        CredentialState::Valid { session } => format!("{:?}", session.stage()),
    };
    format!(
        "{path} [{:?}] {credential}: {}",
        evaluation.route, evaluation.decision
    )
}
