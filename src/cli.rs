// src/cli.rs
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::decode::TextEncoding;

#[derive(Parser, Debug)]
#[command(
    name = "ciha-summary",
    version,
    about = "Summarise DATASUS CIHA diagnostic procedures by state, year, sex, age and body region"
)]
pub struct Cli {
    /// YAML configuration file; defaults apply to anything it leaves out.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download monthly archives into the data directory.
    Fetch(FetchArgs),
    /// Summarise every archive in the data directory.
    Process(ProcessArgs),
    /// Fetch, then process.
    Run(RunArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct FetchArgs {
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[arg(long)]
    pub start_year: Option<u16>,

    #[arg(long)]
    pub end_year: Option<u16>,

    /// Comma-separated state codes, e.g. `SP,RJ`.
    #[arg(long, value_delimiter = ',')]
    pub states: Option<Vec<String>>,

    /// Seconds to wait between downloads.
    #[arg(long)]
    pub delay: Option<u64>,

    /// Download again even when the file is already present.
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ProcessArgs {
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Text encoding of the archives (cp850, latin1, utf8).
    #[arg(long)]
    pub encoding: Option<TextEncoding>,

    #[arg(long)]
    pub threads: Option<usize>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub threads: Option<usize>,
}

impl FetchArgs {
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(dir) = &self.data_dir {
            cfg.data_dir = dir.clone();
        }
        if let Some(y) = self.start_year {
            cfg.fetch.start_year = y;
        }
        if let Some(y) = self.end_year {
            cfg.fetch.end_year = y;
        }
        if let Some(states) = &self.states {
            cfg.fetch.states = states.iter().map(|s| s.trim().to_uppercase()).collect();
        }
        if let Some(d) = self.delay {
            cfg.fetch.delay_secs = d;
        }
        if self.overwrite {
            cfg.fetch.skip_existing = false;
        }
    }
}

impl ProcessArgs {
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(dir) = &self.data_dir {
            cfg.data_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if let Some(enc) = self.encoding {
            cfg.encoding = enc;
        }
        if self.threads.is_some() {
            cfg.threads = self.threads;
        }
    }
}

impl RunArgs {
    pub fn apply(&self, cfg: &mut Config) {
        self.fetch.apply(cfg);
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if self.threads.is_some() {
            cfg.threads = self.threads;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_overrides() {
        let cli = Cli::try_parse_from([
            "ciha-summary",
            "process",
            "--data-dir",
            "/srv/ciha",
            "--encoding",
            "latin1",
            "--config",
            "ciha.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ciha.yaml")));

        let Command::Process(args) = cli.command else {
            panic!("expected process");
        };
        let mut cfg = Config::default();
        args.apply(&mut cfg);
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/ciha"));
        assert_eq!(cfg.output_dir, PathBuf::from("output"));
        assert_eq!(cfg.encoding, TextEncoding::Latin1);
    }

    #[test]
    fn run_overrides_fetch_settings() {
        let cli = Cli::try_parse_from([
            "ciha-summary",
            "run",
            "--states",
            "sp,rj",
            "--start-year",
            "2020",
            "--end-year",
            "2021",
            "--overwrite",
            "--threads",
            "2",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let mut cfg = Config::default();
        args.apply(&mut cfg);
        assert_eq!(cfg.fetch.states, vec!["SP", "RJ"]);
        assert_eq!((cfg.fetch.start_year, cfg.fetch.end_year), (2020, 2021));
        assert!(!cfg.fetch.skip_existing);
        assert_eq!(cfg.threads, Some(2));
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert!(Cli::try_parse_from(["ciha-summary", "process", "--encoding", "ebcdic"]).is_err());
    }
}
