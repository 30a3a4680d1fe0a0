//! Usage, plans, and payment commands

use crate::api::types::{PaymentVerification, Tier, UpgradeSuggestion, UsageSnapshot};
use crate::chat::UsageGate;
use crate::commands::{print_upgrade_hint, AppContext};
use crate::error::Result;
use colored::Colorize;
use prettytable::{format, Table};

/// Show remaining questions, plan limits, and upgrade options
pub async fn show_usage(ctx: &AppContext) -> Result<()> {
    ctx.require_account(false).await?;
    let mut gate = UsageGate::new();
    gate.refresh(&ctx.client).await?;
    print_gate(&gate);

    match ctx.client.usage_status().await {
        Ok(usage) => print_limits(&usage),
        Err(e) => tracing::warn!("Could not load plan limits: {}", e),
    }

    match ctx.client.can_ask().await {
        Ok(answer) if answer.should_upgrade => print_upgrade_options(&answer.upgrade_tiers),
        Ok(_) => {}
        Err(e) => tracing::warn!("Could not load upgrade options: {}", e),
    }
    Ok(())
}

/// Print the usage gate in one or two lines
pub fn print_gate(gate: &UsageGate) {
    let Some(status) = gate.status() else {
        println!("Usage: {}", "unknown".dimmed());
        return;
    };

    let line = match (status.tier, status.lifetime_remaining) {
        (Tier::Free, Some(lifetime)) => format!(
            "Plan: {}  |  Free questions: {} left",
            status.tier.to_string().cyan(),
            lifetime
        ),
        _ => format!(
            "Plan: {}  |  Today: {} left  |  This month: {} left",
            status.tier.to_string().cyan(),
            status.daily_remaining,
            status.monthly_remaining
        ),
    };
    println!("{}", line);

    if let Some(message) = gate.limit_message() {
        print_upgrade_hint(message);
    }
}

fn print_limits(usage: &UsageSnapshot) {
    match usage.lifetime_limit {
        Some(limit) => println!(
            "Used {} of {} free questions",
            usage.lifetime_used.unwrap_or(0),
            limit
        ),
        None => println!(
            "Used {} of {} today and {} of {} this month",
            usage.daily_used, usage.daily_limit, usage.monthly_used, usage.monthly_limit
        ),
    }
    println!("Answers run up to {} characters", usage.max_response_chars);
}

fn print_upgrade_options(tiers: &[UpgradeSuggestion]) {
    if tiers.is_empty() {
        return;
    }
    println!("Upgrade options:");
    for suggestion in tiers {
        println!(
            "  {}  {}",
            suggestion.tier.to_string().cyan(),
            suggestion.price_display
        );
    }
}

/// List the subscription plans
pub async fn list_plans(ctx: &AppContext) -> Result<()> {
    let plans = ctx.client.plans().await?;

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "Tier".bold(),
        "Plan".bold(),
        "Price".bold(),
        "Questions".bold(),
        "Features".bold()
    ]);

    for plan in plans {
        let limits = &plan.limits;
        let questions = match (limits.lifetime_questions, limits.monthly_questions) {
            (Some(total), _) => format!("{} total", total),
            (None, Some(monthly)) => match limits.daily_limit {
                Some(daily) => format!("{}/month, {}/day", monthly, daily),
                None => format!("{}/month", monthly),
            },
            (None, None) => "-".to_string(),
        };

        table.add_row(prettytable::row![
            plan.tier.to_string().cyan(),
            plan.name,
            plan.price_display,
            questions,
            plan.features.join("\n")
        ]);
    }

    println!("\nPlans:");
    table.printstd();
    println!();
    println!("Use {} to upgrade.", "astravaani upgrade <tier>".cyan());
    println!();
    Ok(())
}

/// Create a payment order for `tier`
pub async fn upgrade(ctx: &AppContext, tier: Tier) -> Result<()> {
    ctx.require_account(false).await?;
    let order = ctx.client.upgrade(tier).await?;

    println!(
        "{}",
        format!(
            "Payment order created for {}",
            order.tier_name.as_deref().unwrap_or(order.tier.as_str())
        )
        .green()
    );
    println!("Order id: {}", order.order_id.bold());
    println!(
        "Amount:   {}",
        order
            .price_display
            .clone()
            .unwrap_or_else(|| format!("{} {} (minor units)", order.amount, order.currency))
    );
    if let Some(key) = &order.key_id {
        println!("Key id:   {}", key);
    }
    println!();
    println!(
        "Complete checkout, then run {}",
        "astravaani verify-payment --order-id .. --payment-id .. --signature ..".cyan()
    );
    Ok(())
}

/// Finish a purchase
pub async fn verify_payment(
    ctx: &AppContext,
    order_id: String,
    payment_id: String,
    signature: String,
) -> Result<()> {
    ctx.require_account(false).await?;
    let verification = PaymentVerification {
        razorpay_order_id: order_id,
        razorpay_payment_id: payment_id,
        razorpay_signature: signature,
    };
    let result = ctx.client.verify_payment(&verification).await?;
    let message = result
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("Payment verified");
    println!("{}", message.green());
    Ok(())
}

/// Show or cancel the current subscription
pub async fn subscription(ctx: &AppContext, cancel: bool) -> Result<()> {
    ctx.require_account(false).await?;

    if cancel {
        ctx.client.cancel_subscription().await?;
        println!(
            "{}",
            "Subscription cancelled. You keep your plan until the period ends.".green()
        );
        return Ok(());
    }

    let sub = ctx.client.current_subscription().await?;
    println!("Plan:   {}", sub.tier.to_string().cyan());
    println!("Status: {}", sub.status.as_str());
    if !sub.price_display.is_empty() {
        println!("Price:  {}", sub.price_display);
    }
    if let (Some(start), Some(end)) = (sub.current_period_start, sub.current_period_end) {
        println!("Period: {} to {}", start, end);
    }
    Ok(())
}

/// Past guidance conversations kept by the backend
pub async fn history(ctx: &AppContext, limit: Option<u32>, offset: u32) -> Result<()> {
    ctx.require_account(false).await?;
    let limit = limit.unwrap_or(ctx.config.chat.history_page_size);
    let entries = ctx.client.guidance_history(limit, offset).await?;
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
