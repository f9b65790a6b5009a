use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::query::{QueryDefaults, DEFAULT_LIMIT};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Student records service")]
pub struct Config {
    /// Directory holding students.sqlite3. In stdio mode it may instead be
    /// chosen at runtime with `workspace.select`.
    #[arg(long, global = true, env = "STUDENTSD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Mode {
    /// Serve the REST API over HTTP.
    Serve(ServeArgs),
    /// Answer newline-delimited JSON requests on stdin/stdout (the default).
    Stdio(QueryArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "STUDENTSD_LISTEN", default_value = "127.0.0.1:5000")]
    pub listen: SocketAddr,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Page size used when a request omits `limit` or sends 0
    #[arg(
        long,
        env = "STUDENTSD_DEFAULT_PAGE_SIZE",
        default_value_t = DEFAULT_LIMIT,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub default_page_size: u32,

    /// Largest page size a request may ask for; unbounded when unset
    #[arg(
        long,
        env = "STUDENTSD_MAX_PAGE_SIZE",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_page_size: Option<u32>,
}

impl Default for QueryArgs {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_LIMIT,
            max_page_size: None,
        }
    }
}

impl QueryArgs {
    pub fn defaults(&self) -> QueryDefaults {
        let limit = match self.max_page_size {
            Some(max) => self.default_page_size.min(max),
            None => self.default_page_size,
        };
        QueryDefaults {
            limit,
            max_limit: self.max_page_size,
        }
    }
}

impl Config {
    pub const DEFAULT_WORKSPACE: &'static str = "studentsd-data";

    /// Workspace for HTTP mode, which always needs one.
    pub fn serve_workspace(&self) -> PathBuf {
        self.workspace
            .clone()
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_WORKSPACE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_stdio() {
        let cfg = Config::try_parse_from(["studentsd"]).expect("parse");
        assert!(cfg.command.is_none());
        assert!(cfg.workspace.is_none());
    }

    #[test]
    fn serve_flags_parse() {
        let cfg = Config::try_parse_from([
            "studentsd",
            "serve",
            "--listen",
            "0.0.0.0:8080",
            "--default-page-size",
            "10",
            "--max-page-size",
            "100",
            "--workspace",
            "/tmp/students",
        ])
        .expect("parse");
        let Some(Mode::Serve(args)) = cfg.command.clone() else {
            panic!("expected serve mode");
        };
        assert_eq!(args.listen.port(), 8080);
        assert_eq!(
            args.query.defaults(),
            QueryDefaults {
                limit: 10,
                max_limit: Some(100)
            }
        );
        assert_eq!(cfg.serve_workspace(), PathBuf::from("/tmp/students"));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(Config::try_parse_from(["studentsd", "serve", "--max-page-size", "0"]).is_err());
    }

    #[test]
    fn default_page_size_respects_the_cap() {
        let q = QueryArgs {
            default_page_size: 25,
            max_page_size: Some(10),
        };
        assert_eq!(q.defaults().limit, 10);
    }
}
