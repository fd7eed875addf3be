//TODO: update clap to remove the need for this
#![allow(dangerous_implicit_autorefs)]

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use clap::{
    crate_authors, crate_description, crate_name, crate_version, App, AppSettings, Arg, ArgMatches,
    SubCommand,
};
use log::LevelFilter;
use unixar::{append, append_all, delete, extract, list, Config, DEFAULT_CONFIG};

fn required<'a>(matches: &'a ArgMatches, name: &str) -> anyhow::Result<&'a OsStr> {
    matches
        .value_of_os(name)
        .ok_or_else(|| anyhow!("missing argument '{}'", name))
}

fn names(matches: &ArgMatches) -> Vec<OsString> {
    matches
        .values_of_os("members")
        .map(|values| values.map(OsStr::to_os_string).collect())
        .unwrap_or_default()
}

fn main() -> anyhow::Result<()> {
    let default_config = DEFAULT_CONFIG.to_string_lossy();
    let help_config = format!("Configuration file (defaults to '{}')", &default_config);

    let arg_config = Arg::with_name("config")
        .help(&help_config)
        .long("config")
        .takes_value(true)
        .value_name("FILE")
        .global(true);

    let arg_debug = Arg::with_name("debug")
        .help("Log every archive operation")
        .long("debug")
        .global(true);

    let arg_archive = Arg::with_name("archive")
        .help("Archive file")
        .required(true)
        .value_name("ARCHIVE");

    let arg_members = Arg::with_name("members")
        .help("Member names")
        .required(true)
        .multiple(true)
        .value_name("MEMBER");

    let matches = App::new(crate_name!())
        .author(crate_authors!(", "))
        .about(crate_description!())
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(&arg_config)
        .arg(&arg_debug)
        .subcommand(
            SubCommand::with_name("append")
                .alias("q")
                .about("Append files to the archive, creating it if needed")
                .arg(&arg_archive)
                .arg(
                    Arg::with_name("files")
                        .help("Files to append")
                        .required(true)
                        .multiple(true)
                        .value_name("FILE"),
                ),
        )
        .subcommand(
            SubCommand::with_name("append-all")
                .alias("A")
                .about("Append every regular file in a directory")
                .arg(&arg_archive)
                .arg(
                    Arg::with_name("dir")
                        .help("Directory to read (defaults to '.')")
                        .value_name("DIR")
                        .default_value("."),
                ),
        )
        .subcommand(
            SubCommand::with_name("extract")
                .alias("x")
                .about("Extract members and remove them from the archive")
                .arg(&arg_archive)
                .arg(&arg_members)
                .arg(
                    Arg::with_name("directory")
                        .help("Directory to extract into (defaults to '.')")
                        .short("C")
                        .long("directory")
                        .takes_value(true)
                        .value_name("DIR")
                        .default_value("."),
                ),
        )
        .subcommand(
            SubCommand::with_name("list")
                .alias("t")
                .about("List archive members")
                .arg(&arg_archive)
                .arg(
                    Arg::with_name("verbose")
                        .help("Show mode, owner, size and modification time")
                        .short("v")
                        .long("verbose"),
                ),
        )
        .subcommand(
            SubCommand::with_name("delete")
                .alias("d")
                .about("Delete members from the archive")
                .arg(&arg_archive)
                .arg(&arg_members),
        )
        .get_matches();

    let (name, sub_matches) = matches.subcommand();
    let sub_matches = sub_matches.ok_or_else(|| anyhow!("no subcommand given"))?;

    let mut logger = env_logger::Builder::new();
    logger.filter_level(LevelFilter::Warn).parse_default_env();
    if matches.is_present("debug") || sub_matches.is_present("debug") {
        logger.filter_module("unixar", LevelFilter::Debug);
    }
    logger.init();

    let config = match sub_matches
        .value_of_os("config")
        .or_else(|| matches.value_of_os("config"))
    {
        Some(path) => Config::open(Path::new(path))?,
        None => Config::load_default()?,
    };

    let archive = required(sub_matches, "archive")?;
    match name {
        "append" => {
            let files: Vec<PathBuf> = sub_matches
                .values_of_os("files")
                .map(|values| values.map(PathBuf::from).collect())
                .unwrap_or_default();
            append(archive, &files, &config)?;
        }
        "append-all" => append_all(archive, required(sub_matches, "dir")?, &config)?,
        "extract" => extract(
            archive,
            &names(sub_matches),
            required(sub_matches, "directory")?,
            &config,
        )?,
        "list" => {
            let stdout = io::stdout();
            list(
                archive,
                sub_matches.is_present("verbose"),
                &config,
                &mut stdout.lock(),
            )?;
        }
        "delete" => delete(archive, &names(sub_matches), &config)?,
        other => return Err(anyhow!("unknown subcommand '{}'", other)),
    }
    Ok(())
}
