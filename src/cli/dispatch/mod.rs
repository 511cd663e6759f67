use crate::cli::{
    actions::{check, server, Action},
    commands::CMD_CHECK,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use url::Url;

/// # Errors
/// Returns an error if required arguments are missing or malformed.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let api_url = matches
        .get_one::<String>("api-url")
        .map_or(crate::api::DEFAULT_API_URL, String::as_str);
    let api_url = Url::parse(api_url).context("invalid SOLVANA_API_URL")?;

    if let Some(sub) = matches.subcommand_matches(CMD_CHECK) {
        let path = sub
            .get_one::<String>("path")
            .cloned()
            .context("missing required argument: <path>")?;
        let token = sub
            .get_one::<String>("token")
            .map(|t| SecretString::from(t.clone()));
        return Ok(Action::Check(check::Args {
            path,
            token,
            api_url,
            json: sub.get_flag("json"),
        }));
    }

    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let web_root = matches.get_one::<String>("web-root").map(PathBuf::from);

    Ok(Action::Server(server::Args {
        port,
        web_root,
        api_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn test_handler_server() {
        temp_env::with_vars(
            [
                ("SOLVANA_WEB_ROOT", None::<&str>),
                ("SOLVANA_PORT", None),
                ("SOLVANA_API_URL", None),
            ],
            || {
                let matches = commands::new().get_matches_from(vec!["solvana", "-p", "9090"]);
                let action = handler(&matches);
                match action {
                    Ok(Action::Server(args)) => {
                        assert_eq!(args.port, 9090);
                        assert_eq!(args.web_root, None);
                        assert_eq!(args.api_url.as_str(), crate::api::DEFAULT_API_URL);
                    }
                    other => panic!("unexpected action: {other:?}"),
                }
            },
        );
    }

    #[test]
    fn test_handler_check() {
        temp_env::with_vars([("SOLVANA_TOKEN", None::<&str>)], || {
            let matches = commands::new().get_matches_from(vec![
                "solvana",
                "check",
                "/pets",
                "--token",
                "x.y.z",
            ]);
            match handler(&matches) {
                Ok(Action::Check(args)) => {
                    assert_eq!(args.path, "/pets");
                    assert!(args.token.is_some());
                    assert!(!args.json);
                }
                other => panic!("unexpected action: {other:?}"),
            }
        });
    }

    #[test]
    fn test_handler_rejects_bad_api_url() {
        let matches =
            commands::new().get_matches_from(vec!["solvana", "--api-url", "not a url"]);
        assert!(handler(&matches).is_err());
    }
}
