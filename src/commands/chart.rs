use crate::api::types::ChartSnapshot;
use crate::cli::ChartCommand;
use crate::commands::AppContext;
use crate::error::Result;
use colored::Colorize;

/// Handle `chart` subcommands
pub async fn handle_chart(ctx: &AppContext, command: ChartCommand) -> Result<()> {
    ctx.require_account(true).await?;

    match command {
        ChartCommand::Current => print_snapshot(&ctx.client.current_chart().await?)?,
        ChartCommand::Recompute { mode } => {
            let snapshot = ctx.client.recompute_chart(mode).await?;
            println!("{}", format!("Chart recomputed ({})", mode.as_str()).green());
            print_snapshot(&snapshot)?;
        }
        ChartCommand::Explain { data_point } => {
            let explanation = ctx.client.explain_data_point(&data_point).await?;
            print_prose(&explanation)?;
        }
        ChartCommand::Transits => {
            let transits = ctx.client.transits().await?;
            println!("{}", serde_json::to_string_pretty(&transits)?);
        }
        ChartCommand::Planet { name } => {
            let info = ctx.client.planet_info(&name).await?;
            print_prose(&info)?;
        }
    }
    Ok(())
}

fn print_snapshot(snapshot: &ChartSnapshot) -> Result<()> {
    println!(
        "Chart {} (version {}, mode {})",
        snapshot.id.bold(),
        snapshot.version,
        snapshot.mode.as_str()
    );
    let sections = [
        ("Astrology", &snapshot.astrology_data),
        ("Numerology", &snapshot.numerology_data),
        ("Transits", &snapshot.transit_data),
    ];
    for (title, data) in sections {
        if let Some(data) = data {
            println!("\n{}", title.cyan().bold());
            println!("{}", serde_json::to_string_pretty(data)?);
        }
    }
    Ok(())
}

/// Prefer an `explanation`/`description` string field, else dump the JSON
fn print_prose(value: &serde_json::Value) -> Result<()> {
    let prose = ["explanation", "description", "summary"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()));
    match prose {
        Some(text) => println!("{}", text),
        None => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
