use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "campus_assistant")]
#[command(
    about = "Campus assistant chat bot for Bangladesh Agricultural University",
    long_about = "Campus assistant chat bot for Bangladesh Agricultural University\n\nRuns a Telegram long-polling bot unless --ask is given.\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default probe path when --config is not provided:\n    1. $XDG_CONFIG_HOME/campus-assistant/config.toml\n    2. ~/.config/campus-assistant/config.toml"
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Answer one message, print the reply and exit.
    #[arg(long, value_name = "TEXT")]
    pub ask: Option<String>,

    /// Echo outbound HTTP traffic to stderr with secrets redacted.
    #[arg(long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::CliArgs;
    use clap::Parser;

    #[test]
    fn parse_defaults() {
        let args = CliArgs::try_parse_from(["campus_assistant"]).expect("should parse");
        assert_eq!(args.config, None);
        assert_eq!(args.ask, None);
        assert!(!args.verbose);
    }

    #[test]
    fn parse_config_flag() {
        let args = CliArgs::try_parse_from(["campus_assistant", "--config", "/tmp/custom.toml"])
            .expect("parse");
        assert_eq!(
            args.config.as_deref(),
            Some(std::path::Path::new("/tmp/custom.toml"))
        );
    }

    #[test]
    fn parse_one_shot_question() {
        let args = CliArgs::try_parse_from([
            "campus_assistant",
            "--verbose",
            "--ask",
            "When is the first bus to town?",
        ])
        .expect("parse");
        assert_eq!(args.ask.as_deref(), Some("When is the first bus to town?"));
        assert!(args.verbose);
    }
}
