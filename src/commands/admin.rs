use crate::api::types::{AdminSubscriptionQuery, AdminUserQuery};
use crate::cli::AdminCommand;
use crate::commands::AppContext;
use crate::error::Result;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle `admin` subcommands
pub async fn handle_admin(ctx: &AppContext, command: AdminCommand) -> Result<()> {
    ctx.require_account(false).await?;

    match command {
        AdminCommand::Stats => {
            let stats = ctx.client.admin_stats().await?;
            println!("Users:                 {}", stats.total_users);
            println!("Active (30 days):      {}", stats.active_users_30d);
            println!(
                "Subscriptions:         {} ({} active)",
                stats.total_subscriptions, stats.active_subscriptions
            );
            println!(
                "Revenue this month:    {}",
                format_rupees(stats.revenue_this_month_paise)
            );
            println!(
                "Revenue total:         {}",
                format_rupees(stats.revenue_total_paise)
            );
            println!(
                "Questions:             {} today, {} this month",
                stats.questions_today, stats.questions_this_month
            );
            if !stats.tier_breakdown.is_empty() {
                let breakdown: Vec<String> = stats
                    .tier_breakdown
                    .iter()
                    .map(|t| format!("{} {}", t.tier, t.count))
                    .collect();
                println!("Tiers:                 {}", breakdown.join(", "));
            }
        }
        AdminCommand::Users {
            page,
            page_size,
            search,
            tier,
        } => {
            let query = AdminUserQuery {
                page,
                page_size,
                search,
                tier,
            };
            let list = ctx.client.admin_users(&query).await?;

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
            table.add_row(prettytable::row![
                "ID".bold(),
                "Email".bold(),
                "Name".bold(),
                "Tier".bold(),
                "Active".bold(),
                "Questions (month)".bold(),
                "Joined".bold()
            ]);
            for user in &list.users {
                let active = if user.is_active {
                    "yes".green()
                } else {
                    "no".red()
                };
                table.add_row(prettytable::row![
                    user.id,
                    user.email,
                    user.full_name.as_deref().unwrap_or("-"),
                    user.tier,
                    active,
                    user.questions_used_monthly,
                    user.created_at.format("%Y-%m-%d")
                ]);
            }
            table.printstd();
            print_page_footer(list.page, list.page_size, list.total);
        }
        AdminCommand::ChangeTier { user_id, tier } => {
            let response = ctx.client.admin_change_tier(&user_id, tier).await?;
            println!("{}", response.message.green());
        }
        AdminCommand::ToggleActive { user_id } => {
            let response = ctx.client.admin_toggle_active(&user_id).await?;
            let state = if response.is_active {
                "active".green()
            } else {
                "disabled".red()
            };
            println!("User {} is now {}", user_id, state);
        }
        AdminCommand::Subscriptions {
            page,
            page_size,
            status,
            tier,
        } => {
            let query = AdminSubscriptionQuery {
                page,
                page_size,
                status,
                tier,
            };
            let list = ctx.client.admin_subscriptions(&query).await?;

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
            table.add_row(prettytable::row![
                "User".bold(),
                "Tier".bold(),
                "Status".bold(),
                "Amount".bold(),
                "Period End".bold(),
                "Created".bold()
            ]);
            for sub in &list.subscriptions {
                let status = if sub.cancel_at_period_end {
                    format!("{} (ending)", sub.status)
                } else {
                    sub.status.clone()
                };
                let period_end = sub
                    .current_period_end
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string());
                table.add_row(prettytable::row![
                    sub.user_email,
                    sub.tier,
                    status,
                    format_rupees(sub.amount_paise),
                    period_end,
                    sub.created_at.format("%Y-%m-%d")
                ]);
            }
            table.printstd();
            print_page_footer(list.page, list.page_size, list.total);
        }
    }
    Ok(())
}

fn print_page_footer(page: u32, page_size: u32, total: u64) {
    let size = u64::from(page_size.max(1));
    let pages = ((total + size - 1) / size).max(1);
    println!("Page {} of {} ({} total)", page, pages, total);
}

/// Render an amount in paise as rupees
fn format_rupees(paise: u64) -> String {
    format!("₹{}.{:02}", paise / 100, paise % 100)
}
