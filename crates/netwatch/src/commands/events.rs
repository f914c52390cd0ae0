//! Event command handlers.

use chrono::{Duration as ChronoDuration, Utc};
use tabled::Tabled;

use netwatch_core::{
    BulkAcknowledgement, EntityId, Event, EventFilter, EventSeverity, EventSubject, EventType,
};

use crate::cli::{EventListArgs, EventsArgs, EventsCommand, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Type")]
    event_type: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Count")]
    count: u32,
    #[tabled(rename = "Message")]
    message: String,
}

impl EventRow {
    fn new(e: &Event, color: bool) -> Self {
        Self {
            id: e.id.to_string(),
            time: e.last_occurred_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            severity: output::paint_severity(e.severity, color),
            event_type: e.event_type.to_string(),
            state: e.state().to_string(),
            count: e.occurrence_count,
            message: e.message.clone(),
        }
    }
}

fn detail(e: &Event) -> String {
    let mut lines = vec![
        format!("ID:          {}", e.id),
        format!("Type:        {}", e.event_type),
        format!("Severity:    {}", e.severity),
        format!("State:       {}", e.state()),
        format!("Message:     {}", e.message),
        format!("Occurrences: {}", e.occurrence_count),
        format!("First seen:  {}", e.first_occurred_at.to_rfc3339()),
        format!("Last seen:   {}", e.last_occurred_at.to_rfc3339()),
    ];
    if let (Some(by), Some(at)) = (&e.acknowledged_by, e.acknowledged_at) {
        lines.push(format!("Acked:       {by} at {}", at.to_rfc3339()));
    }
    if let Some(ref notes) = e.notes {
        lines.push(format!("Notes:       {notes}"));
    }
    if let Some(at) = e.resolved_at {
        let by = e.resolved_by.as_deref().unwrap_or("-");
        let auto = if e.auto_resolved { " (auto)" } else { "" };
        lines.push(format!("Resolved:    {by} at {}{auto}", at.to_rfc3339()));
    }
    if let Some(ref notes) = e.resolution_notes {
        lines.push(format!("Resolution:  {notes}"));
    }
    lines.join("\n")
}

fn bulk_detail(b: &BulkAcknowledgement) -> String {
    let mut lines = vec![format!(
        "Acknowledged {} of {} events",
        b.acknowledged_count, b.total_events
    )];
    if !b.not_found.is_empty() {
        let missing: Vec<String> = b.not_found.iter().map(ToString::to_string).collect();
        lines.push(format!("Not found: {}", missing.join(", ")));
    }
    lines.join("\n")
}

fn build_filter(args: &EventListArgs) -> Result<EventFilter, CliError> {
    let mut filters = Vec::new();
    if args.active {
        filters.push(EventFilter::Active);
    }
    if args.unacknowledged {
        filters.push(EventFilter::Unacknowledged);
    }
    if let Some(ref s) = args.severity {
        filters.push(EventFilter::MinSeverity(util::parse_name::<EventSeverity>(
            "severity", s,
        )?));
    }
    if let Some(ref t) = args.event_type {
        filters.push(EventFilter::ByType(util::parse_name::<EventType>("type", t)?));
    }
    if let Some(ref d) = args.device {
        filters.push(EventFilter::Subject(EventSubject::Device(EntityId::from(
            d.as_str(),
        ))));
    }
    if let Some(ref l) = args.link {
        filters.push(EventFilter::Subject(EventSubject::Link(EntityId::from(
            l.as_str(),
        ))));
    }
    if let Some(hours) = args.within {
        filters.push(EventFilter::Since(
            Utc::now() - ChronoDuration::hours(i64::from(hours)),
        ));
    }
    Ok(match filters.len() {
        0 => EventFilter::All,
        _ => EventFilter::And(filters),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(session: &Session, args: EventsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = &session.monitor;

    match args.command {
        EventsCommand::List(list) => {
            let filter = build_filter(&list)?;
            let mut events = monitor.list_events(&filter).await?;
            events.sort_by(|a, b| b.last_occurred_at.cmp(&a.last_occurred_at));
            events.truncate(list.limit);

            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &events,
                |e| EventRow::new(e, color),
                |e| e.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EventsCommand::Ack { event, actor } => {
            let updated = monitor
                .acknowledge(&EntityId::from(event), &actor.by, actor.notes.as_deref())
                .await?;
            session.save()?;
            let out = output::render_single(&global.output, &updated, detail, |e| e.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EventsCommand::Resolve { event, actor } => {
            let updated = monitor
                .resolve(&EntityId::from(event), &actor.by, actor.notes.as_deref())
                .await?;
            session.save()?;
            let out = output::render_single(&global.output, &updated, detail, |e| e.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EventsCommand::BulkAck { events, actor } => {
            let prompt = format!("Acknowledge {} event(s)?", events.len());
            if !util::confirm(&prompt, "events bulk-ack", global.yes)? {
                return Ok(());
            }
            let ids: Vec<EntityId> = events.into_iter().map(EntityId::from).collect();
            let result = monitor
                .bulk_acknowledge(&ids, &actor.by, actor.notes.as_deref())
                .await?;
            session.save()?;
            let out = output::render_single(&global.output, &result, bulk_detail, |b| {
                b.acknowledged_count.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
