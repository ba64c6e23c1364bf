//! Built-in command table.
//!
//! Each handler checks its argument count and formats one protocol command.
//! Formatted commands longer than [`MAX_COMMAND_LEN`] are refused rather
//! than truncated.

use std::ops::RangeInclusive;

use crate::commands::{Action, Command};
use crate::error::CommandError;

/// Longest protocol command that will be sent, in bytes.
pub const MAX_COMMAND_LEN: usize = 254;

/// Longest SSID accepted by `wps_config`, in bytes.
const MAX_SSID_LEN: usize = 32;

/// Longest key accepted by `wps_config`, in bytes.
const MAX_KEY_LEN: usize = 64;

/// The command table, in the order used for ambiguity listings and help.
pub const COMMANDS: &[Command] = &[
    Command {
        name: "ping",
        usage: "",
        summary: "check that the daemon answers",
        handler: ping,
    },
    Command {
        name: "mib",
        usage: "",
        summary: "get MIB variables (dot1x, dot11, radius)",
        handler: mib,
    },
    Command {
        name: "relog",
        usage: "",
        summary: "reopen the daemon's log file",
        handler: relog,
    },
    Command {
        name: "sta",
        usage: "<addr>",
        summary: "get MIB variables for one station",
        handler: sta,
    },
    Command {
        name: "all_sta",
        usage: "",
        summary: "get MIB variables for all stations",
        handler: all_sta,
    },
    Command {
        name: "new_sta",
        usage: "<addr>",
        summary: "add a new station",
        handler: new_sta,
    },
    Command {
        name: "deauthenticate",
        usage: "<addr> [reason]",
        summary: "deauthenticate a station",
        handler: deauthenticate,
    },
    Command {
        name: "disassociate",
        usage: "<addr> [reason]",
        summary: "disassociate a station",
        handler: disassociate,
    },
    Command {
        name: "sa_query",
        usage: "<addr>",
        summary: "send SA Query to a station",
        handler: sa_query,
    },
    Command {
        name: "wps_pin",
        usage: "<uuid> <pin> [timeout] [addr]",
        summary: "add WPS Enrollee PIN",
        handler: wps_pin,
    },
    Command {
        name: "wps_check_pin",
        usage: "<pin>",
        summary: "verify PIN checksum",
        handler: wps_check_pin,
    },
    Command {
        name: "wps_pbc",
        usage: "",
        summary: "indicate button pushed to initiate PBC",
        handler: wps_pbc,
    },
    Command {
        name: "wps_oob",
        usage: "<type> <path> <method> [name]",
        summary: "use WPS with out-of-band (UFD/NFC)",
        handler: wps_oob,
    },
    Command {
        name: "wps_ap_pin",
        usage: "<cmd> [params..]",
        summary: "enable/disable AP PIN",
        handler: wps_ap_pin,
    },
    Command {
        name: "wps_config",
        usage: "<ssid> <auth> [encr] [key]",
        summary: "configure AP",
        handler: wps_config,
    },
    Command {
        name: "wpa2_config",
        usage: "<ssid> <passphrase>",
        summary: "configure AP for WPA2-PSK/CCMP",
        handler: wpa2_config,
    },
    Command {
        name: "get_config",
        usage: "",
        summary: "show current configuration",
        handler: get_config,
    },
    Command {
        name: "help",
        usage: "",
        summary: "show this usage help",
        handler: help,
    },
    Command {
        name: "interface",
        usage: "[ifname]",
        summary: "show interfaces/select interface",
        handler: interface,
    },
    Command {
        name: "level",
        usage: "<debug level>",
        summary: "change debug level",
        handler: level,
    },
    Command {
        name: "quit",
        usage: "",
        summary: "exit",
        handler: quit,
    },
    Command {
        name: "set",
        usage: "<name> <value>",
        summary: "set a configuration variable",
        handler: set,
    },
    Command {
        name: "get",
        usage: "<name>",
        summary: "get a configuration variable",
        handler: get,
    },
    Command {
        name: "raw",
        usage: "<command...>",
        summary: "send a command verbatim",
        handler: raw,
    },
];

fn expect_args(
    command: &'static str,
    args: &[String],
    range: RangeInclusive<usize>,
    reason: &str,
) -> Result<(), CommandError> {
    if range.contains(&args.len()) {
        Ok(())
    } else {
        Err(CommandError::InvalidArguments {
            command,
            reason: reason.to_string(),
        })
    }
}

/// Joins `verb` and `args` with single spaces, enforcing the length limit.
fn format_command<S: AsRef<str>>(verb: &str, args: &[S]) -> Result<Action, CommandError> {
    let mut line = verb.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg.as_ref());
    }
    if line.len() > MAX_COMMAND_LEN {
        return Err(CommandError::TooLong {
            command: verb.to_string(),
            len: line.len(),
            max: MAX_COMMAND_LEN,
        });
    }
    Ok(Action::Send(line))
}

/// Lowercase hex encoding, two digits per byte.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn ping(_: &[String]) -> Result<Action, CommandError> {
    format_command::<&str>("PING", &[])
}

fn mib(_: &[String]) -> Result<Action, CommandError> {
    format_command::<&str>("MIB", &[])
}

fn relog(_: &[String]) -> Result<Action, CommandError> {
    format_command::<&str>("RELOG", &[])
}

fn sta(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "sta",
        args,
        1..=1,
        "exactly one argument, STA address, is required.",
    )?;
    format_command("STA", args)
}

fn all_sta(_: &[String]) -> Result<Action, CommandError> {
    Ok(Action::AllStations)
}

fn new_sta(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "new_sta",
        args,
        1..=1,
        "exactly one argument, STA address, is required.",
    )?;
    format_command("NEW_STA", args)
}

fn deauthenticate(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "deauthenticate",
        args,
        1..=2,
        "STA address and an optional reason are required.",
    )?;
    format_command("DEAUTHENTICATE", args)
}

fn disassociate(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "disassociate",
        args,
        1..=2,
        "STA address and an optional reason are required.",
    )?;
    format_command("DISASSOCIATE", args)
}

fn sa_query(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "sa_query",
        args,
        1..=1,
        "exactly one argument, STA address, is required.",
    )?;
    format_command("SA_QUERY", args)
}

fn wps_pin(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "wps_pin",
        args,
        2..=4,
        "UUID and PIN are required, timeout and address are optional.",
    )?;
    format_command("WPS_PIN", args)
}

fn wps_check_pin(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "wps_check_pin",
        args,
        1..=2,
        "needs one argument, the PIN to be verified.",
    )?;
    format_command("WPS_CHECK_PIN", args)
}

fn wps_pbc(_: &[String]) -> Result<Action, CommandError> {
    format_command::<&str>("WPS_PBC", &[])
}

fn wps_oob(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "wps_oob",
        args,
        3..=4,
        "needs DEV_TYPE (ufd or nfc), PATH, METHOD (pin-e, pin-r or cred) \
         and, for NFC only, DEV_NAME.",
    )?;
    format_command("WPS_OOB", args)
}

fn wps_ap_pin(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "wps_ap_pin",
        args,
        1..=3,
        "a subcommand and up to two parameters are required.",
    )?;
    format_command("WPS_AP_PIN", args)
}

fn encode_ssid(command: &'static str, ssid: &str) -> Result<String, CommandError> {
    if ssid.len() > MAX_SSID_LEN {
        return Err(CommandError::InvalidArguments {
            command,
            reason: format!("SSID is longer than {} bytes.", MAX_SSID_LEN),
        });
    }
    Ok(hex_encode(ssid.as_bytes()))
}

fn encode_key(command: &'static str, key: &str) -> Result<String, CommandError> {
    if key.len() > MAX_KEY_LEN {
        return Err(CommandError::InvalidArguments {
            command,
            reason: format!("key is longer than {} bytes.", MAX_KEY_LEN),
        });
    }
    Ok(hex_encode(key.as_bytes()))
}

fn wps_config(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "wps_config",
        args,
        2..=4,
        "SSID and auth are required, encryption and key are optional.",
    )?;
    let mut parts = vec![encode_ssid("wps_config", &args[0])?];
    parts.extend(args[1..args.len().min(3)].iter().cloned());
    if let Some(key) = args.get(3) {
        parts.push(encode_key("wps_config", key)?);
    }
    format_command("WPS_CONFIG", &parts)
}

fn wpa2_config(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "wpa2_config",
        args,
        2..=2,
        "SSID and passphrase are required.",
    )?;
    let parts = [
        encode_ssid("wpa2_config", &args[0])?,
        "WPA2PSK".to_string(),
        "CCMP".to_string(),
        encode_key("wpa2_config", &args[1])?,
    ];
    format_command("WPS_CONFIG", &parts)
}

fn get_config(_: &[String]) -> Result<Action, CommandError> {
    format_command::<&str>("GET_CONFIG", &[])
}

fn help(_: &[String]) -> Result<Action, CommandError> {
    Ok(Action::Help)
}

fn interface(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "interface",
        args,
        0..=1,
        "at most one argument, the interface name, is accepted.",
    )?;
    Ok(Action::Interface(args.first().cloned()))
}

fn level(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "level",
        args,
        1..=1,
        "needs one argument (debug level).",
    )?;
    format_command("LEVEL", args)
}

fn quit(_: &[String]) -> Result<Action, CommandError> {
    Ok(Action::Quit)
}

fn set(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "set",
        args,
        2..=2,
        "needs two arguments (variable name and value).",
    )?;
    format_command("SET", args)
}

fn get(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "get",
        args,
        1..=1,
        "needs one argument (variable name).",
    )?;
    format_command("GET", args)
}

fn raw(args: &[String]) -> Result<Action, CommandError> {
    expect_args(
        "raw",
        args,
        1..=usize::MAX,
        "the command to send is required.",
    )?;
    format_command(&args[0], &args[1..])
}
