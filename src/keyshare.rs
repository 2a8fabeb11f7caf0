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

use std::io;

use anyhow::{anyhow, Context, Error};
use clap::{Arg, ArgAction, ArgMatches, Command};
use zeroize::Zeroizing;

use sss_core::{KEYSHARE_LENGTH, KEY_LENGTH};

use crate::{encoding, encoding_arg, parse_usize, print_shares, read_secret, read_shares, write_secret};

// sss keyshare split -n <COUNT> -k <THRESHOLD> [--encoding <BASE>] INPUT
fn keyshare_split_cli() -> Command {
    Command::new("split")
                .about(format!("Split a {}-byte key into keyshares. Each keyshare is {} bytes before encoding.", KEY_LENGTH, KEYSHARE_LENGTH))
                .arg(Arg::new("count")
                    .short('n')
                    .long("count")
                    .value_name("NUM SHARES")
                    .help("Number of keyshares to create (at most 255).")
                    .action(ArgAction::Set)
                    .required(true))
                .arg(Arg::new("threshold")
                    .short('k')
                    .long("threshold")
                    .value_name("THRESHOLD")
                    .help("Number of keyshares required to recover the key (must not be larger than --count).")
                    .action(ArgAction::Set)
                    .required(true))
                .arg(encoding_arg())
                .arg(Arg::new("INPUT")
                    .help(r#"Path to file containing the key ("-" to read from stdin). The key must be uniformly random."#)
                    .action(ArgAction::Set)
                    .allow_hyphen_values(true)
                    .required(true)
                    .index(1))
}

fn keyshare_split(matches: &ArgMatches) -> Result<(), Error> {
    let count = parse_usize(matches, "count")?;
    let threshold = parse_usize(matches, "threshold")?;
    let base = encoding(matches)?;
    let input_path = matches
        .get_one::<String>("INPUT")
        .context("required INPUT argument not provided")?;

    let key = read_secret::<KEY_LENGTH>(input_path)?;
    let keyshares =
        sss_core::create_keyshares(&key, count, threshold).context("creating keyshares")?;
    print_shares(&keyshares, base);

    Ok(())
}

// sss keyshare combine OUTPUT
fn keyshare_combine_cli() -> Command {
    Command::new("combine")
        .about("Recover a key from keyshares read from stdin (one keyshare per line, ending with an empty line or EOF). Too few or altered keyshares produce the wrong key without any error.")
        .arg(
            Arg::new("OUTPUT")
                .help(r#"Path to write the recovered key to ("-" to write to stdout)."#)
                .action(ArgAction::Set)
                .allow_hyphen_values(true)
                .required(true)
                .index(1),
        )
}

fn keyshare_combine(matches: &ArgMatches) -> Result<(), Error> {
    let output_path = matches
        .get_one::<String>("OUTPUT")
        .context("required OUTPUT argument not provided")?;

    let keyshares = read_shares(io::stdin().lock())?;
    let key = Zeroizing::new(
        sss_core::combine_keyshares(&keyshares).context("combining keyshares")?,
    );

    write_secret(output_path, &key[..])
}

pub(crate) fn submatch(app: &mut Command, matches: &ArgMatches) -> Result<(), Error> {
    match matches.subcommand() {
        Some(("split", sub_matches)) => keyshare_split(sub_matches),
        Some(("combine", sub_matches)) => keyshare_combine(sub_matches),
        Some((subcommand, _)) => {
            // We should never end up here.
            app.print_help()?;
            Err(anyhow!("unknown subcommand 'keyshare {}'", subcommand))
        }
        None => {
            app.print_help()?;
            Err(anyhow!("no 'keyshare' subcommand specified"))
        }
    }
}

pub(crate) fn subcommands() -> Command {
    Command::new("keyshare")
            .about("Split and combine raw keys with no tamper detection. Combining too few or altered keyshares silently yields the wrong key, so only use this for uniformly random keys that are verified some other way.")
            // sss keyshare split -n <COUNT> -k <THRESHOLD> [--encoding <BASE>] INPUT
            .subcommand(keyshare_split_cli())
            // sss keyshare combine OUTPUT
            .subcommand(keyshare_combine_cli())
}
