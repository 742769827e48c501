//! Entitlement command handlers: status, gate, limits, evaluate.

use chrono::Utc;
use serde::Serialize;
use tabled::Tabled;
use tracing::debug;

use medscribe_core::{
    Entitlement, EntitlementVerdict, Evaluator, FreeTierLimits, PlanType, ResourceKind,
    Subscription, UsageSnapshot, UserId,
};

use crate::cli::{EvaluateArgs, GateArgs, GlobalOpts, PlanArg, ResourceArg, StatusArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

impl From<ResourceArg> for ResourceKind {
    fn from(arg: ResourceArg) -> Self {
        match arg {
            ResourceArg::Patient => ResourceKind::Patient,
            ResourceArg::Consultation => ResourceKind::Consultation,
        }
    }
}

impl From<PlanArg> for PlanType {
    fn from(arg: PlanArg) -> Self {
        match arg {
            PlanArg::Monthly => PlanType::Monthly,
            PlanArg::Yearly => PlanType::Yearly,
        }
    }
}

// ── Detail views ────────────────────────────────────────────────────

fn limit_cell(count: u32, within: bool, premium: bool, color: bool) -> String {
    let state = if premium {
        output::paint_flag("unlimited", true, color)
    } else if within {
        output::paint_flag("within limit", true, color)
    } else {
        output::paint_flag("limit reached", false, color)
    };
    format!("{count} ({state})")
}

fn verdict_pairs(
    verdict: &EntitlementVerdict,
    usage: UsageSnapshot,
    color: bool,
) -> Vec<(&'static str, String)> {
    let mut pairs = vec![(
        "Premium",
        output::paint_flag(util::yes_no(verdict.is_premium), verdict.is_premium, color),
    )];
    if verdict.is_premium {
        pairs.push(("Days left", verdict.days_remaining.to_string()));
        pairs.push(("Reminder due", util::yes_no(verdict.notification_due).into()));
    }
    pairs.push((
        "Patients",
        limit_cell(
            usage.patient_count,
            verdict.limits.patient,
            verdict.is_premium,
            color,
        ),
    ));
    pairs.push((
        "Consultations",
        limit_cell(
            usage.consultation_count,
            verdict.limits.consultation,
            verdict.is_premium,
            color,
        ),
    ));
    pairs
}

fn entitlement_detail(ent: &Entitlement, color: bool) -> String {
    let mut pairs = vec![("User", ent.user_id.to_string())];
    if let Some(ref sub) = ent.subscription {
        pairs.push(("Plan", sub.plan_type.to_string()));
        pairs.push(("Expires at", sub.expires_at.to_rfc3339()));
        pairs.push(("Active", util::yes_no(sub.is_active).into()));
    } else {
        pairs.push(("Plan", "free".into()));
    }
    pairs.extend(verdict_pairs(&ent.verdict, ent.usage, color));
    if ent.degraded {
        pairs.push((
            "Degraded",
            output::paint_flag("store lookup failed, free tier assumed", false, color),
        ));
    }
    output::detail_block(&pairs)
}

fn tier(verdict: &EntitlementVerdict) -> String {
    if verdict.is_premium { "premium" } else { "free" }.into()
}

// ── status ──────────────────────────────────────────────────────────

pub async fn status(args: &StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let user = UserId::parse(&args.user_id)?;
    let service = config::service_config(global)?.entitlement_service()?;
    let ent = service.entitlement(&user, Utc::now()).await?;

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &ent,
        |e| entitlement_detail(e, color),
        |e| tier(&e.verdict),
    )?;
    output::print_output(&out, global.quiet);

    if let Some(notice) = ent.expiry_notice().filter(|_| !global.quiet) {
        eprintln!("{}", notice.message());
    }
    Ok(())
}

// ── gate ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GateView {
    user_id: UserId,
    resource: ResourceKind,
    allowed: bool,
}

pub async fn gate(args: &GateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let user = UserId::parse(&args.user_id)?;
    let kind = ResourceKind::from(args.resource);
    let service = config::service_config(global)?.entitlement_service()?;
    let allowed = service.gate_action(&user, kind, Utc::now()).await?;
    debug!(%user, %kind, allowed, "gate evaluated");

    let view = GateView {
        user_id: user,
        resource: kind,
        allowed,
    };
    let color = output::should_color(global.color);
    let word = |v: &GateView| if v.allowed { "allowed" } else { "blocked" }.to_owned();
    let out = output::render_single(
        global.output,
        &view,
        |v| output::paint_flag(&word(v), v.allowed, color),
        word,
    )?;
    output::print_output(&out, global.quiet);

    if allowed {
        Ok(())
    } else {
        Err(CliError::LimitReached {
            user_id: view.user_id.to_string(),
            resource: kind.to_string(),
        })
    }
}

// ── limits ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LimitEntry {
    resource: ResourceKind,
    limit: u32,
    dashboard_limit: u32,
}

#[derive(Tabled)]
struct LimitRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Free limit")]
    limit: u32,
    #[tabled(rename = "Dashboard limit")]
    dashboard_limit: u32,
}

fn limit_entries(limits: FreeTierLimits) -> Vec<LimitEntry> {
    let dashboard = FreeTierLimits::dashboard();
    ResourceKind::ALL
        .iter()
        .map(|&kind| LimitEntry {
            resource: kind,
            limit: limits.for_resource(kind),
            dashboard_limit: dashboard.for_resource(kind),
        })
        .collect()
}

pub fn limits(global: &GlobalOpts) -> Result<(), CliError> {
    let limits = config::free_tier_limits(global)?;
    debug!(?limits, "free-tier limits resolved");

    let entries = limit_entries(limits);
    let out = output::render_list(
        global.output,
        &entries,
        |e| LimitRow {
            resource: e.resource.to_string(),
            limit: e.limit,
            dashboard_limit: e.dashboard_limit,
        },
        |e| format!("{} {}", e.resource, e.limit),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── evaluate ────────────────────────────────────────────────────────

pub fn evaluate(args: &EvaluateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let user = UserId::parse(&args.user_id)?;
    let now = args
        .now
        .as_deref()
        .map(|raw| util::parse_timestamp("now", raw))
        .transpose()?
        .unwrap_or_else(Utc::now);

    let subscription = args
        .expires_at
        .as_deref()
        .map(|raw| -> Result<Subscription, CliError> {
            let expires_at = util::parse_timestamp("expires-at", raw)?;
            let mut sub = Subscription::new(user.clone(), args.plan.into(), expires_at);
            sub.is_active = !args.inactive;
            Ok(sub)
        })
        .transpose()?;

    let usage = UsageSnapshot::new(args.patients, args.consultations);
    let evaluator = Evaluator::new(config::free_tier_limits(global)?);
    let verdict = evaluator.evaluate(user.as_str(), usage, subscription.as_ref(), now)?;

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &verdict,
        |v| output::detail_block(&verdict_pairs(v, usage, color)),
        tier,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
