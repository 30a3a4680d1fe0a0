//! Birth profile and person profile commands

use crate::api::types::{
    PersonProfile, PersonProfileCreate, PersonProfileUpdate, Profile, ProfileCreate,
    ProfileUpdate,
};
use crate::cli::{PeopleCommand, ProfileCommand};
use crate::commands::{print_upgrade_hint, AppContext};
use crate::error::{Result, VaaniError};
use colored::Colorize;
use prettytable::{format, Table};

/// Handle `profile` subcommands
pub async fn handle_profile(ctx: &AppContext, command: ProfileCommand) -> Result<()> {
    let auth = ctx.require_account(false).await?;

    match command {
        ProfileCommand::Show => match auth.profile() {
            Some(profile) => print_profile(profile),
            None => println!(
                "{} Create one with {}",
                "No profile yet.".yellow(),
                "astravaani profile create --help".cyan()
            ),
        },
        ProfileCommand::Create {
            full_name,
            display_name,
            date_of_birth,
            time_of_birth,
            place_of_birth,
            mode,
            language,
            style,
        } => {
            if auth.has_profile() {
                return Err(VaaniError::Validation(
                    "You already have a profile; use `astravaani profile update`".to_string(),
                )
                .into());
            }
            let request = ProfileCreate {
                full_name,
                display_name,
                date_of_birth,
                time_of_birth,
                place_of_birth,
                guidance_mode: mode,
                language,
                response_style: style,
            };
            let profile = ctx.client.create_profile(&request).await?;
            println!("{}", "Profile created.".green());
            print_profile(&profile);
            println!("Start asking with {}", "astravaani chat".cyan());
        }
        ProfileCommand::Update {
            full_name,
            display_name,
            time_of_birth,
            place_of_birth,
            mode,
            language,
            style,
        } => {
            let update = ProfileUpdate {
                full_name,
                display_name,
                time_of_birth,
                place_of_birth,
                guidance_mode: mode,
                language,
                response_style: style,
            };
            let profile = ctx.client.update_profile(&update).await?;
            println!("{}", "Profile updated.".green());
            print_profile(&profile);
        }
    }
    Ok(())
}

fn print_profile(profile: &Profile) {
    println!("Name:     {}", profile.full_name.bold());
    if let Some(display) = &profile.display_name {
        println!("Called:   {}", display);
    }
    if let Some(dob) = profile.date_of_birth {
        println!("Born:     {}", dob);
    }
    match profile.time_of_birth {
        Some(time) => println!("Time:     {}", time.format("%H:%M")),
        None => println!("Time:     {}", "unknown".dimmed()),
    }
    if let Some(place) = &profile.place_of_birth {
        println!("Place:    {}", place);
    }
    println!(
        "Guidance: {} | language {} | style {}",
        profile.guidance_mode.as_str(),
        profile.language.as_str(),
        profile.response_style.as_str()
    );
}

/// Handle `people` subcommands
pub async fn handle_people(ctx: &AppContext, command: PeopleCommand) -> Result<()> {
    ctx.require_account(false).await?;

    match command {
        PeopleCommand::List => {
            let list = ctx.client.list_people().await?;
            if list.profiles.is_empty() {
                println!("{}", "No saved profiles yet.".yellow());
            } else {
                let mut table = Table::new();
                table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
                table.add_row(prettytable::row![
                    "ID".bold(),
                    "Name".bold(),
                    "Relation".bold(),
                    "Born".bold(),
                    "Chats".bold()
                ]);
                for person in &list.profiles {
                    let name = if person.is_primary {
                        format!("{} (primary)", person.name).cyan()
                    } else {
                        person.name.normal()
                    };
                    table.add_row(prettytable::row![
                        short_id(&person.id),
                        name,
                        person.relation_type,
                        person.date_of_birth,
                        person.conversation_count
                    ]);
                }
                println!("\nSaved profiles:");
                table.printstd();
                println!();
            }
            println!("{} of {} profiles used", list.total, list.max_profiles);
            if !list.can_add() {
                print_upgrade_hint("You've reached the profile limit for your plan.");
            }
        }
        PeopleCommand::Show { id } => {
            let person = ctx.client.get_person(&id).await?;
            print_person(&person);
        }
        PeopleCommand::Create {
            name,
            nickname,
            relation,
            date_of_birth,
            time_of_birth,
            place_of_birth,
            notes,
            primary,
        } => {
            let request = PersonProfileCreate {
                name,
                nickname,
                relation_type: relation,
                date_of_birth,
                time_of_birth,
                place_of_birth,
                notes,
                is_primary: primary,
            };
            let person = ctx.client.create_person(&request).await?;
            println!("{}", "Profile saved.".green());
            print_person(&person);
        }
        PeopleCommand::Update {
            id,
            name,
            nickname,
            relation,
            date_of_birth,
            time_of_birth,
            place_of_birth,
            notes,
        } => {
            let update = PersonProfileUpdate {
                name,
                nickname,
                relation_type: relation,
                date_of_birth,
                time_of_birth,
                place_of_birth,
                notes,
            };
            let person = ctx.client.update_person(&id, &update).await?;
            println!("{}", "Profile updated.".green());
            print_person(&person);
        }
        PeopleCommand::Delete { id } => {
            ctx.client.delete_person(&id).await?;
            println!("{}", format!("Deleted profile {}", id).green());
        }
        PeopleCommand::SetPrimary { id } => {
            let person = ctx.client.set_primary_person(&id).await?;
            println!(
                "{}",
                format!("{} is now your primary profile", person.name).green()
            );
        }
    }
    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn print_person(person: &PersonProfile) {
    let primary = if person.is_primary { " (primary)" } else { "" };
    println!("{}{}", person.name.bold(), primary.cyan());
    println!("ID:       {}", person.id);
    if let Some(nickname) = &person.nickname {
        println!("Nickname: {}", nickname);
    }
    println!("Relation: {}", person.relation_type);
    println!("Born:     {}", person.date_of_birth);
    if let Some(time) = person.time_of_birth {
        println!("Time:     {}", time.format("%H:%M"));
    }
    if let Some(place) = &person.place_of_birth {
        println!("Place:    {}", place);
    }
    if let Some(notes) = &person.notes {
        println!("Notes:    {}", notes);
    }
    println!("Chats:    {}", person.conversation_count);
}
