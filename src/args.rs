//! Command-line argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "h5j")]
#[command(version, about = "Inspect and decode h5j microscopy containers", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List the encoders of the configured codec family
    Encoders,

    /// Print attributes, geometry and channel layout as JSON
    Info {
        /// h5j file
        file: PathBuf,
    },

    /// Write the max intensity projection of one channel as raw samples
    ///
    /// 16-bit channels are written little-endian.
    Mip {
        /// h5j file
        file: PathBuf,
        /// Output file
        out: PathBuf,
        /// Channel letter; defaults to every signal channel, which only
        /// works for single-channel containers
        #[arg(value_parser = parse_channel)]
        channel: Option<String>,
    },
}

fn parse_channel(value: &str) -> Result<String, String> {
    match value {
        "R" | "G" | "B" | "Y" => Ok(value.to_string()),
        other => Err(format!("expected one of R, G, B, Y, got '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_encoders() {
        let args = Args::try_parse_from(["h5j", "encoders"]).unwrap();
        assert_eq!(args.command, Command::Encoders);
    }

    #[test]
    fn test_unknown_input_is_rejected() {
        assert!(Args::try_parse_from(["h5j"]).is_err());
        assert!(Args::try_parse_from(["h5j", "encoders", "--verbose"]).is_err());
        assert!(Args::try_parse_from(["h5j", "transcode"]).is_err());

        let help = Args::try_parse_from(["h5j", "--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_parse_mip() {
        let args = Args::try_parse_from(["h5j", "mip", "stack.h5j", "mip.raw", "G"]).unwrap();
        assert_eq!(
            args.command,
            Command::Mip {
                file: PathBuf::from("stack.h5j"),
                out: PathBuf::from("mip.raw"),
                channel: Some("G".to_string()),
            }
        );
        assert!(Args::try_parse_from(["h5j", "mip", "stack.h5j", "mip.raw", "Q"]).is_err());
        assert!(Args::try_parse_from(["h5j", "mip", "stack.h5j"]).is_err());
    }
}
