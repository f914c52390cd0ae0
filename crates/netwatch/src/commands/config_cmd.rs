//! Config subcommand handlers.

use dialoguer::Input;

use netwatch_core::NetworkRange;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Ask for the first profile. `--yes` accepts every default without prompting.
fn wizard(yes: bool) -> Result<Config, CliError> {
    let mut cfg = Config::default();
    if yes {
        cfg.profiles.insert("default".into(), Profile::default());
        return Ok(cfg);
    }

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let default_topology = config::Config::topology_path(&profile_name, &Profile::default());
    let topology: String = Input::new()
        .with_prompt("Topology file")
        .default(default_topology.display().to_string())
        .interact_text()
        .map_err(prompt_err)?;

    let range: String = Input::new()
        .with_prompt("Network range to discover")
        .default(NetworkRange::DEFAULT.to_string())
        .validate_with(|input: &String| {
            input
                .parse::<NetworkRange>()
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    let interval_secs: u64 = Input::new()
        .with_prompt("Cycle interval (seconds)")
        .default(cfg.monitor.interval_secs)
        .validate_with(|input: &u64| {
            if *input >= 10 {
                Ok(())
            } else {
                Err("must be at least 10 seconds")
            }
        })
        .interact_text()
        .map_err(prompt_err)?;

    cfg.default_profile = Some(profile_name.clone());
    cfg.profiles.insert(
        profile_name,
        Profile {
            topology: Some(topology.into()),
            network_range: Some(range),
            interval_secs: Some(interval_secs),
        },
    );
    Ok(cfg)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::resolved_config_path(global);

    match args.command {
        ConfigCommand::Init => {
            if path.exists()
                && !util::confirm(
                    &format!("Overwrite {}?", path.display()),
                    "config init",
                    global.yes,
                )?
            {
                return Ok(());
            }
            if !global.quiet {
                eprintln!("netwatch configuration");
                eprintln!("   Config path: {}\n", path.display());
            }

            let cfg = wizard(global.yes)?;
            // Validate before writing so a bad answer never lands on disk.
            let (_, profile) = cfg.profile(None)?;
            cfg.to_monitor_config(&profile)?;

            config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("   Config written to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("<unprintable: {e}>")),
                |c| c.default_profile.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}
