/*
 * sss: shamir secret sharing over GF(2^8) with authenticated shares
 * Copyright (C) 2018-2022 Aleksa Sarai <cyphar@cyphar.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

mod keyshare;

use std::{
    error::Error as StdError,
    fs::File,
    io,
    io::{prelude::*, BufReader},
};

use anyhow::{anyhow, ensure, Context, Error};
use log::{debug, info};
use clap::{Arg, ArgAction, ArgMatches, Command};
use zeroize::Zeroizing;

extern crate sss_core;
use sss_core::{SECRET_LENGTH, SHARE_LENGTH};

const ENCODINGS: [&str; 4] = ["base32z", "base58btc", "base64url", "base16"];

pub(crate) fn encoding_arg() -> Arg {
    Arg::new("encoding")
        .long("encoding")
        .value_name("BASE")
        .help("Multibase encoding used for printed shares. Any multibase encoding is accepted when reading shares.")
        .value_parser(ENCODINGS)
        .default_value(ENCODINGS[0])
        .action(ArgAction::Set)
}

pub(crate) fn encoding(matches: &ArgMatches) -> Result<multibase::Base, Error> {
    let name = matches
        .get_one::<String>("encoding")
        .context("--encoding argument has no default")?;
    Ok(match name.as_str() {
        "base32z" => multibase::Base::Base32Z,
        "base58btc" => multibase::Base::Base58Btc,
        "base64url" => multibase::Base::Base64Url,
        "base16" => multibase::Base::Base16Lower,
        other => return Err(anyhow!("unknown encoding '{}'", other)),
    })
}

pub(crate) fn parse_usize(matches: &ArgMatches, name: &str) -> Result<usize, Error> {
    matches
        .get_one::<String>(name)
        .with_context(|| format!("required --{} argument not provided", name))?
        .parse()
        .with_context(|| format!("--{} argument was not an unsigned integer", name))
}

/// Read exactly `N` bytes of secret data from a path ("-" for stdin).
pub(crate) fn read_secret<const N: usize>(input_path: &str) -> Result<Zeroizing<[u8; N]>, Error> {
    let (mut stdin_reader, mut file_reader);
    let input: &mut dyn Read = if input_path == "-" {
        stdin_reader = io::stdin();
        &mut stdin_reader
    } else {
        file_reader = File::open(input_path)
            .with_context(|| format!("failed to open secret data file '{}'", input_path))?;
        &mut file_reader
    };
    let mut buffer_input = BufReader::new(input);

    let mut data = Zeroizing::new(Vec::new());
    buffer_input
        .read_to_end(&mut data)
        .with_context(|| format!("failed to read secret data from '{}'", input_path))?;
    ensure!(
        data.len() == N,
        "secret data must be exactly {} bytes long (got {} bytes)",
        N,
        data.len()
    );

    let mut secret = Zeroizing::new([0u8; N]);
    secret.copy_from_slice(&data);
    Ok(secret)
}

/// Write recovered secret data to a path ("-" for stdout).
pub(crate) fn write_secret(output_path: &str, secret: &[u8]) -> Result<(), Error> {
    let (mut stdout_writer, mut file_writer);
    let output_file: &mut dyn Write = if output_path == "-" {
        stdout_writer = io::stdout();
        &mut stdout_writer
    } else {
        file_writer = File::create(output_path)
            .with_context(|| format!("failed to open output file '{}' for writing", output_path))?;
        &mut file_writer
    };

    output_file
        .write_all(secret)
        .context("write secret data to file")?;
    output_file.flush().context("flush secret data")?;
    info!("wrote {} bytes of secret data to '{}'", secret.len(), output_path);

    Ok(())
}

/// Read multibase-encoded shares, one per line, until EOF or an empty line.
pub(crate) fn read_shares<R: BufRead>(input: R) -> Result<Vec<Vec<u8>>, Error> {
    let shares = input
        .lines()
        .map(|line| line.context("failed to read shares"))
        .take_while(|line| !matches!(line.as_deref().map(str::trim), Ok("")))
        .enumerate()
        .map(|(idx, line)| {
            let (base, data) = multibase::decode(line?.trim())
                .map_err(|err| anyhow!("failed to decode share {}: {}", idx + 1, err))?;
            debug!("decoded share {} ({:?}, {} bytes)", idx + 1, base, data.len());
            Ok(data)
        })
        .collect::<Result<Vec<_>, Error>>()?;
    info!("read {} shares", shares.len());

    Ok(shares)
}

pub(crate) fn print_shares<S: AsRef<[u8]>>(shares: &[S], base: multibase::Base) {
    for share in shares {
        println!("{}", multibase::encode(base, share));
    }
    info!("printed {} shares using {:?}", shares.len(), base);
}

// sss split -n <COUNT> -k <THRESHOLD> [--encoding <BASE>] INPUT
fn split_cli() -> Command {
    Command::new("split")
            .about(format!("Split a {}-byte secret into shares. Each share is {} bytes before encoding.", SECRET_LENGTH, SHARE_LENGTH))
            .arg(Arg::new("count")
                .short('n')
                .long("count")
                .value_name("NUM SHARES")
                .help("Number of shares to create (at most 255).")
                .action(ArgAction::Set)
                .required(true))
            .arg(Arg::new("threshold")
                .short('k')
                .long("threshold")
                .value_name("THRESHOLD")
                .help("Number of shares required to recover the secret (must not be larger than --count).")
                .action(ArgAction::Set)
                .required(true))
            .arg(encoding_arg())
            .arg(Arg::new("INPUT")
                .help(r#"Path to file containing the secret ("-" to read from stdin)."#)
                .action(ArgAction::Set)
                .allow_hyphen_values(true)
                .required(true)
                .index(1))
}

fn split(matches: &ArgMatches) -> Result<(), Error> {
    let count = parse_usize(matches, "count")?;
    let threshold = parse_usize(matches, "threshold")?;
    let base = encoding(matches)?;
    let input_path = matches
        .get_one::<String>("INPUT")
        .context("required INPUT argument not provided")?;

    let secret = read_secret::<SECRET_LENGTH>(input_path)?;
    let shares = sss_core::create_shares(&secret, count, threshold).context("creating shares")?;
    print_shares(&shares, base);

    Ok(())
}

// sss combine OUTPUT
fn combine_cli() -> Command {
    Command::new("combine")
        .about("Recover a secret from shares read from stdin (one share per line, ending with an empty line or EOF).")
        .arg(
            Arg::new("OUTPUT")
                .help(r#"Path to write the recovered secret to ("-" to write to stdout)."#)
                .action(ArgAction::Set)
                .allow_hyphen_values(true)
                .required(true)
                .index(1),
        )
}

fn combine(matches: &ArgMatches) -> Result<(), Error> {
    let output_path = matches
        .get_one::<String>("OUTPUT")
        .context("required OUTPUT argument not provided")?;

    let shares = read_shares(io::stdin().lock())?;
    let secret = Zeroizing::new(
        sss_core::combine_shares(&shares)
            .context("combining shares")?
            .context("no secret could be recovered -- too few shares, or shares were tampered with")?,
    );

    write_secret(output_path, &secret[..])
}

fn cli() -> Command {
    Command::new("sss")
        .version("0.0.0")
        .author("Aleksa Sarai <cyphar@cyphar.com>")
        .about("Split secrets into tamper-evident Shamir shares, and recover them again.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (can be repeated). RUST_LOG takes precedence.")
                .action(ArgAction::Count)
                .global(true),
        )
        // sss split -n <COUNT> -k <THRESHOLD> [--encoding <BASE>] INPUT
        .subcommand(split_cli())
        // sss combine OUTPUT
        .subcommand(combine_cli())
        // sss keyshare ...
        .subcommand(keyshare::subcommands())
}

fn init_logging(matches: &ArgMatches) {
    let level = match matches.get_count("verbose") {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<(), Box<dyn StdError>> {
    let mut app = cli();
    let matches = app.get_matches_mut();
    init_logging(&matches);

    let ret = match matches.subcommand() {
        Some(("keyshare", sub_matches)) => keyshare::submatch(&mut app, sub_matches),
        Some(("split", sub_matches)) => split(sub_matches),
        Some(("combine", sub_matches)) => combine(sub_matches),
        Some((subcommand, _)) => {
            // We should never end up here.
            app.print_help()?;
            Err(anyhow!("unknown subcommand '{}'", subcommand))
        }
        None => {
            app.print_help()?;
            Err(anyhow!("no subcommand specified"))
        }
    }?;

    Ok(ret)
}

#[test]
fn verify_cli() {
    cli().debug_assert();
}

#[test]
fn read_shares_any_base() {
    let input = format!(
        "{}\n  {}  \n{}\n\n{}\n",
        multibase::encode(multibase::Base::Base32Z, [1u8, 2, 3]),
        multibase::encode(multibase::Base::Base58Btc, [4u8, 5]),
        multibase::encode(multibase::Base::Base16Lower, [6u8]),
        multibase::encode(multibase::Base::Base64Url, [7u8]),
    );
    let shares = read_shares(io::Cursor::new(input)).unwrap();
    assert_eq!(shares, vec![vec![1, 2, 3], vec![4, 5], vec![6]]);
}

#[test]
fn read_shares_bad_encoding() {
    let input = format!(
        "{}\n!not multibase\n",
        multibase::encode(multibase::Base::Base32Z, [1u8])
    );
    let err = read_shares(io::Cursor::new(input)).unwrap_err();
    assert_eq!(
        err.to_string().split(':').next(),
        Some("failed to decode share 2")
    );
}

#[test]
fn write_secret_to_file() {
    let path = std::env::temp_dir().join(format!("sss-write-secret-{}", std::process::id()));
    let path = path.to_str().unwrap();
    write_secret(path, &[0x2a; SECRET_LENGTH]).unwrap();
    assert_eq!(std::fs::read(path).unwrap(), vec![0x2a; SECRET_LENGTH]);
    std::fs::remove_file(path).unwrap();
}
