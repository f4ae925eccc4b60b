//! Config subcommand handlers. None of these contact the server.

use dialoguer::{Input, Select};

use agrisage_config::{Config, Profile, TokenStoreKind};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = agrisage_config::config_path();
            eprintln!("agrisage configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = agrisage_config::load_config_or_default();

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(CliError::prompt)?;

            let server: String = Input::new()
                .with_prompt("Server URL")
                .default("http://localhost:8000".into())
                .interact_text()
                .map_err(CliError::prompt)?;
            server.parse::<url::Url>().map_err(|e| CliError::Validation {
                field: "server".into(),
                reason: format!("invalid URL '{server}': {e}"),
            })?;

            let store_choices = &[
                "System keyring (recommended)",
                "Token file in the data directory",
                "Don't persist (sign in every run)",
            ];
            let store_selection = Select::new()
                .with_prompt("Where should the session token be kept?")
                .items(store_choices)
                .default(0)
                .interact()
                .map_err(CliError::prompt)?;

            let mut profile = Profile::new(server);
            profile.token_store = match store_selection {
                0 => TokenStoreKind::Keyring,
                1 => TokenStoreKind::File,
                _ => TokenStoreKind::Memory,
            };

            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            let path = agrisage_config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Next: agrisage login");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = agrisage_config::load_config()?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| format!("{c:#?}"),
                |c| c.default_profile_name().to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = agrisage_config::load_config()?;
            let active = config::active_profile_name(global, &cfg);
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: agrisage config init");
                return Ok(());
            }
            let mut names: Vec<_> = cfg.profiles.iter().collect();
            names.sort_by(|a, b| a.0.cmp(b.0));
            for (name, profile) in names {
                let marker = if *name == active { " *" } else { "" };
                println!("{name}{marker}\t{}", profile.server);
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg: Config = agrisage_config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            agrisage_config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", agrisage_config::config_path().display());
            Ok(())
        }
    }
}
