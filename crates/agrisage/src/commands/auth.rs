//! Account command handlers: login, logout, register, whoami.

use dialoguer::Input;

use agrisage_core::{Advisor, Farmer, NewFarmer};

use crate::cli::{GlobalOpts, LoginArgs, RegisterArgs};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::util;

fn farmer_detail(f: &Farmer) -> String {
    output::detail_lines(&[
        ("ID", f.id.to_string()),
        ("Name", f.name.clone()),
        ("Email", f.email.clone()),
        ("Phone", f.phone.clone()),
        ("Location", f.location.clone()),
        ("Active", f.active.to_string()),
        ("Joined", util::date(&f.created_at)),
    ])
}

/// Remember the email on the profile so the next login can offer it.
fn remember_email(profile_name: &str, email: &str) {
    let Ok(mut cfg) = agrisage_config::load_config() else {
        return;
    };
    let Some(profile) = cfg.profiles.get_mut(profile_name) else {
        return;
    };
    if profile.email.as_deref() == Some(email) {
        return;
    }
    profile.email = Some(email.to_owned());
    if let Err(e) = agrisage_config::save_config(&cfg) {
        tracing::warn!(error = %e, "could not save email to profile");
    }
}

pub async fn login(
    advisor: &Advisor,
    args: LoginArgs,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let email = match args.email {
        Some(email) => email,
        None => {
            let remembered = agrisage_config::load_config_or_default()
                .profiles
                .get(&resolved.profile_name)
                .and_then(|p| p.email.clone());
            let mut prompt = Input::<String>::new().with_prompt("Email");
            if let Some(email) = remembered {
                prompt = prompt.default(email);
            }
            prompt.interact_text().map_err(CliError::prompt)?
        }
    };
    let password = util::read_password(args.password_stdin, "Password: ")?;

    advisor.login(&email, &password).await?;
    remember_email(&resolved.profile_name, &email);

    if !global.quiet {
        eprintln!("✓ Signed in as {email} (profile '{}')", resolved.profile_name);
    }
    Ok(())
}

pub fn logout(advisor: &Advisor, global: &GlobalOpts) -> Result<(), CliError> {
    advisor.logout()?;
    if !global.quiet {
        eprintln!("✓ Signed out");
    }
    Ok(())
}

pub async fn register(
    advisor: &Advisor,
    args: RegisterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let password = util::read_password(args.password_stdin, "Choose a password: ")?;
    let farmer = advisor
        .register(NewFarmer {
            name: args.name,
            email: args.email,
            phone: args.phone,
            location: args.location,
            password,
        })
        .await?;

    let out = output::render_single(&global.output, &farmer, farmer_detail, |f| f.id.to_string())?;
    output::print_output(&out, global.quiet);
    if !global.quiet {
        eprintln!("✓ Account created. Sign in with: agrisage login --email {}", farmer.email);
    }
    Ok(())
}

pub async fn whoami(advisor: &Advisor, global: &GlobalOpts) -> Result<(), CliError> {
    if !advisor.session().is_signed_in() {
        return Err(CliError::NotSignedIn {
            message: "no stored session".into(),
        });
    }
    let farmer = advisor.current_user().await?;
    let out = output::render_single(&global.output, &*farmer, farmer_detail, |f| f.email.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
