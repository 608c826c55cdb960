use std::{
    io::{Read, Write},
    path::PathBuf,
    process::ExitCode,
    time::SystemTime,
};

use clap::{Arg, ArgAction, ArgMatches, Command};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{error, info, span, Level};

use crate::filesystem::Filesystem;

mod adapters;
mod config;
mod filesystem;
mod fs;
mod model;
mod util;

fn cli() -> Command {
    let path = |name: &'static str| Arg::new(name).required(true);

    Command::new("cdnfs")
        .about("Filesystem operations against the configured CDN object store")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("cdnfs.toml"),
        )
        .subcommand_required(true)
        .subcommand(Command::new("get").about("Print an object").arg(path("PATH")))
        .subcommand(Command::new("lines").about("Print an object line by line").arg(path("PATH")))
        .subcommand(
            Command::new("put")
                .about("Upload stdin, or --from FILE, to PATH")
                .arg(path("PATH"))
                .arg(Arg::new("from").long("from").value_parser(clap::value_parser!(PathBuf)))
                .arg(Arg::new("mode").long("mode").help("octal mode, e.g. 644")),
        )
        .subcommand(
            Command::new("cp")
                .arg(path("SRC"))
                .arg(path("DEST"))
                .arg(Arg::new("overwrite").long("overwrite").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("mv")
                .arg(path("SRC"))
                .arg(path("DEST"))
                .arg(Arg::new("overwrite").long("overwrite").action(ArgAction::SetTrue)),
        )
        .subcommand(Command::new("rm").arg(path("PATH")))
        .subcommand(Command::new("stat").arg(path("PATH")))
        .subcommand(Command::new("ls").arg(path("PATH")))
        .subcommand(
            Command::new("chmod")
                .arg(Arg::new("MODE").required(true))
                .arg(path("PATH")),
        )
        .subcommand(Command::new("url").about("Print the public URL").arg(path("PATH")))
}

fn parse_mode(value: Option<&String>) -> Result<Option<u32>, String> {
    value
        .map(|mode| {
            u32::from_str_radix(mode.trim_start_matches("0o"), 8)
                .map_err(|err| format!("invalid mode {}: {}", mode, err))
        })
        .transpose()
}

fn format_time(value: Option<SystemTime>) -> String {
    value
        .and_then(|t| OffsetDateTime::from(t).format(&Rfc3339).ok())
        .unwrap_or_else(|| "-".to_string())
}

fn run(fs: &fs::ObjectFS, command: &str, args: &ArgMatches) -> Result<bool, String> {
    let arg = |name: &str| args.get_one::<String>(name).map(String::as_str).unwrap_or("");
    let mut stdout = std::io::stdout().lock();

    let ok = match command {
        "get" => match fs.get_contents(arg("PATH")) {
            Some(bytes) => stdout.write_all(&bytes).is_ok(),
            None => false,
        },
        "lines" => match fs.get_contents_array(arg("PATH")) {
            Some(lines) => lines.iter().all(|line| stdout.write_all(line.as_bytes()).is_ok()),
            None => false,
        },
        "put" => {
            let mode = parse_mode(args.get_one::<String>("mode"))?;
            let contents = match args.get_one::<PathBuf>("from") {
                Some(from) => std::fs::read(from).map_err(|err| err.to_string())?,
                None => {
                    let mut buf = Vec::new();
                    std::io::stdin()
                        .read_to_end(&mut buf)
                        .map_err(|err| err.to_string())?;
                    buf
                }
            };
            fs.put_contents(arg("PATH"), &contents, mode)
        }
        "cp" => fs.copy(arg("SRC"), arg("DEST"), args.get_flag("overwrite")),
        "mv" => fs.move_file(arg("SRC"), arg("DEST"), args.get_flag("overwrite")),
        "rm" => fs.delete(arg("PATH"), false),
        "stat" => {
            let path = arg("PATH");
            let exists = fs.exists(path);
            let capabilities = fs.capabilities();
            let report = format!(
                "exists: {}\nis_dir: {}\ndirectories: {}\natomic_move: {}\nsize: {}\nmtime: {}\nmode: {:o}\nreadable: {}\n",
                exists,
                !exists,
                capabilities.directories,
                capabilities.atomic_move,
                fs.size(path).map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                format_time(fs.mtime(path)),
                fs.getchmod(path).unwrap_or(0),
                fs.is_readable(path),
            );
            stdout.write_all(report.as_bytes()).is_ok() && exists
        }
        "ls" => match fs.dirlist(arg("PATH"), true, false) {
            Some(entries) => entries
                .iter()
                .all(|entry| writeln!(stdout, "{}", entry).is_ok()),
            None => false,
        },
        "chmod" => {
            let mode = parse_mode(args.get_one::<String>("MODE"))?;
            fs.chmod(arg("PATH"), mode, false)
        }
        "url" => match fs.try_public_url(arg("PATH")) {
            Ok(url) => writeln!(stdout, "{}", url).is_ok(),
            Err(err) => return Err(err.to_string()),
        },
        other => return Err(format!("unknown command: {}", other)),
    };

    Ok(ok)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .json()
        .with_writer(std::io::stderr)
        .init();

    let span = span!(Level::INFO, "main", context = "main");
    let _e = span.enter();
    info!("called");

    let matches = cli().get_matches();

    let config_path = match matches.get_one::<PathBuf>("config") {
        Some(path) => path.clone(),
        None => PathBuf::from("cdnfs.toml"),
    };
    info!(config = %config_path.display(), "args");

    let provider = match config::TomlConfig::load(&config_path) {
        Err(err) => {
            error!(error_message=%err, error_group="load_config");
            return ExitCode::FAILURE;
        }
        Ok(provider) => provider,
    };

    let settings = match provider.filesystem() {
        Err(err) => {
            error!(error_message=%err, error_group="load_config");
            return ExitCode::FAILURE;
        }
        Ok(settings) => settings,
    };

    let mut fs = fs::ObjectFS::new(Box::new(provider), Box::new(adapters::s3::S3Connector))
        .with_upload_basedir(settings.upload_basedir);
    if let Some(staging_dir) = settings.staging_dir {
        fs = fs.with_staging_dir(staging_dir);
    }

    if !fs.connect() {
        return ExitCode::FAILURE;
    }

    let Some((command, args)) = matches.subcommand() else {
        return ExitCode::FAILURE;
    };

    match run(&fs, command, args) {
        Err(err) => {
            error!(error_message=%err, error_group="command");
            ExitCode::FAILURE
        }
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        let cases = vec![
            (Some("644"), Ok(Some(0o644))),
            (Some("0644"), Ok(Some(0o644))),
            (Some("0o600"), Ok(Some(0o600))),
            (None, Ok(None)),
        ];

        for (input, expected) in cases {
            let input = input.map(str::to_string);
            assert_eq!(parse_mode(input.as_ref()), expected, "failed for case: {:?}", input);
        }

        assert!(parse_mode(Some(&"999".to_string())).is_err());
    }

    #[test]
    fn test_cli() {
        cli().debug_assert();

        let matches = cli()
            .try_get_matches_from(["cdnfs", "--config", "x.toml", "put", "wp-content/a.txt", "--mode", "600"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("x.toml"))
        );

        let (command, args) = matches.subcommand().unwrap();
        assert_eq!(command, "put");
        assert_eq!(args.get_one::<String>("mode").map(String::as_str), Some("600"));
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(None), "-");
        assert_eq!(
            format_time(Some(SystemTime::UNIX_EPOCH)),
            "1970-01-01T00:00:00Z"
        );
    }
}
