use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tubedrop")]
#[command(author, version, about = "Telegram bot that delivers YouTube videos in a chosen quality", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (default)
    Run,

    /// Print usage statistics from the database
    Stats {
        /// Number of entries in the top lists
        #[arg(short, long, default_value_t = 5)]
        top: usize,
    },

    /// List the quality options offered for a video
    Formats {
        /// Video link or 11-character video id
        target: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no_command() {
        let cli = Cli::try_parse_from(["tubedrop"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_parses_subcommands() {
        let cli = Cli::try_parse_from(["tubedrop", "stats", "--top", "3"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Stats { top: 3 }));

        let cli = Cli::try_parse_from(["tubedrop", "formats", "dQw4w9WgXcQ"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Formats {
                target: "dQw4w9WgXcQ".to_string()
            })
        );
    }
}
