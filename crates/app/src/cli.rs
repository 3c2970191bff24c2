use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(long, default_value = "all")]
    pub mode: Mode,
    /// Print a signed bearer token for this user id and exit.
    #[arg(long, value_name = "USER_ID")]
    pub issue_token: Option<String>,
    /// Mark the issued token as an admin token.
    #[arg(long, default_value_t = false, requires = "issue_token")]
    pub admin: bool,
    #[arg(long, default_value_t = 86_400, requires = "issue_token")]
    pub token_ttl_secs: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    All,
    Api,
    Migrate,
}

impl Mode {
    pub fn run_api(self) -> bool {
        matches!(self, Mode::All | Mode::Api)
    }

    pub fn run_migrations(self) -> bool {
        matches!(self, Mode::All | Mode::Migrate)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Mode};

    #[test]
    fn defaults_to_all() {
        let cli = Cli::parse_from(["commentary"]);
        assert_eq!(cli.mode, Mode::All);
        assert!(cli.mode.run_api() && cli.mode.run_migrations());
        assert!(cli.issue_token.is_none());
    }

    #[test]
    fn admin_requires_issue_token() {
        assert!(Cli::try_parse_from(["commentary", "--admin"]).is_err());
        let cli = Cli::parse_from(["commentary", "--issue-token", "mod-1", "--admin"]);
        assert_eq!(cli.issue_token.as_deref(), Some("mod-1"));
        assert!(cli.admin);
    }

    #[test]
    fn migrate_mode_skips_api() {
        let cli = Cli::parse_from(["commentary", "--mode", "migrate"]);
        assert!(!cli.mode.run_api());
        assert!(cli.mode.run_migrations());
    }
}
