//! Configuration loading helpers for the controller and the daemon.
//!
//! Only the flags in [`CONFIG_CLI_FLAGS`] reach `ortho_config`; the first
//! other token is the lifecycle command.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use simple_daemon_config::{CONFIG_CLI_FLAGS, Config};

use crate::errors::AppError;

pub(crate) trait ConfigLoader {
    /// Loads configuration from `argv[0]` plus the configuration flags.
    ///
    /// Configuration flags must precede the command token; anything after it
    /// is treated as a command argument.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

fn process_config_flag(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Skip;
    }
    let (flag, has_inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (&*text, false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !has_inline_value,
        }
    } else {
        FlagAction::Skip
    }
}

pub(crate) struct ConfigArgumentSplit {
    /// `argv[0]` followed by the configuration flags and their values.
    pub(crate) config_arguments: Vec<OsString>,
    /// Index of the first token that is not configuration.
    pub(crate) command_start: usize,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let mut tokens = args.iter().enumerate();
    let Some((_, program)) = tokens.next() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_start: 0,
        };
    };

    let mut config_arguments = vec![program.clone()];
    let mut command_start = 1;
    let mut pending_value = false;
    for (index, argument) in tokens {
        if pending_value {
            pending_value = false;
        } else {
            match process_config_flag(argument) {
                FlagAction::Include { needs_value } => pending_value = needs_value,
                FlagAction::Skip => break,
            }
        }
        config_arguments.push(argument.clone());
        command_start = index + 1;
    }

    ConfigArgumentSplit {
        config_arguments,
        command_start,
    }
}
