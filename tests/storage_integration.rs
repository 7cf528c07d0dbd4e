//! LibSQL store integration tests against a file-backed database

mod common;

use chrono::Duration;
use common::{create_test_store, test_now, TicketBuilder};
use slamon_core::types::{CustomerTier, DelayStatus, DelayType, EscalationStatus};
use slamon_core::{
    ConnectionMode, DelayPortion, EscalationRecord, LibsqlStore, Priority, SlaError, SlaStatus,
    TicketFilter, TicketId, TicketStatus, TicketStore,
};

fn delay(ticket: &str, status: DelayStatus, minutes: i64, impact: u8) -> DelayPortion {
    DelayPortion {
        id: None,
        ticket_id: TicketId::new(ticket),
        delay_type: DelayType::Internal,
        started_at: test_now() - Duration::hours(2),
        ended_at: None,
        duration_minutes: minutes,
        status,
        impact_score: impact,
        resolution_notes: String::new(),
    }
}

#[tokio::test]
async fn test_ticket_roundtrip_with_customer() {
    let (_dir, store) = create_test_store().await;

    let ticket = TicketBuilder::new("TKT-20260302-1000")
        .priority(Priority::P1)
        .sla(SlaStatus::Breached, 125)
        .service("Database Support")
        .customer("Acme Corp", CustomerTier::Platinum)
        .build();
    store.create_ticket(&ticket).await.unwrap();

    let loaded = store.get_ticket(&ticket.id).await.unwrap();
    assert_eq!(loaded, ticket);
}

#[tokio::test]
async fn test_missing_ticket_is_not_found() {
    let (_dir, store) = create_test_store().await;
    let err = store
        .get_ticket(&TicketId::new("TKT-NOPE"))
        .await
        .unwrap_err();
    assert!(matches!(err, SlaError::TicketNotFound(_)));
}

#[tokio::test]
async fn test_duplicate_ticket_rejected() {
    let (_dir, store) = create_test_store().await;
    let ticket = TicketBuilder::new("TKT-DUP").build();
    store.create_ticket(&ticket).await.unwrap();

    let err = store.create_ticket(&ticket).await.unwrap_err();
    assert!(matches!(err, SlaError::Validation(_)));
}

#[tokio::test]
async fn test_filters_and_priority_ordering() {
    let (_dir, store) = create_test_store().await;

    for ticket in [
        TicketBuilder::new("T-1").priority(Priority::P3).team("Team A").build(),
        TicketBuilder::new("T-2")
            .priority(Priority::P1)
            .sla(SlaStatus::Breached, 90)
            .team("Team B")
            .build(),
        TicketBuilder::new("T-3")
            .priority(Priority::P2)
            .sla(SlaStatus::AtRisk, 0)
            .team("Team A")
            .build(),
    ] {
        store.create_ticket(&ticket).await.unwrap();
    }

    let all = store.tickets(&TicketFilter::default(), 10).await.unwrap();
    let ids: Vec<&str> = all.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["T-2", "T-3", "T-1"]);

    let team_a = store
        .tickets(&TicketFilter::default().with_team("Team A"), 10)
        .await
        .unwrap();
    assert_eq!(team_a.len(), 2);

    let breached = store
        .tickets(
            &TicketFilter::default().with_sla_status(SlaStatus::Breached),
            10,
        )
        .await
        .unwrap();
    assert_eq!(breached.len(), 1);
    assert_eq!(breached[0].id.as_str(), "T-2");

    let limited = store.tickets(&TicketFilter::default(), 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn test_tickets_since_respects_window() {
    let (_dir, store) = create_test_store().await;
    store
        .create_ticket(&TicketBuilder::new("RECENT").created_hours_ago(3).build())
        .await
        .unwrap();
    store
        .create_ticket(&TicketBuilder::new("OLD").created_hours_ago(48).build())
        .await
        .unwrap();

    let recent = store
        .tickets_since(test_now() - Duration::hours(24))
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id.as_str(), "RECENT");
}

#[tokio::test]
async fn test_delays_grouped_by_requested_tickets() {
    let (_dir, store) = create_test_store().await;
    for id in ["D-1", "D-2", "D-3"] {
        store
            .create_ticket(&TicketBuilder::new(id).sla(SlaStatus::Delayed, 30).build())
            .await
            .unwrap();
    }

    store.add_delay(&delay("D-1", DelayStatus::Pending, 30, 4)).await.unwrap();
    store.add_delay(&delay("D-1", DelayStatus::Resolved, 15, 2)).await.unwrap();
    store.add_delay(&delay("D-3", DelayStatus::InProgress, 60, 7)).await.unwrap();

    let delays = store
        .delays_for(&[TicketId::new("D-1"), TicketId::new("D-2")])
        .await
        .unwrap();
    assert_eq!(delays.len(), 2);
    assert!(delays.iter().all(|d| d.ticket_id.as_str() == "D-1"));
    assert!(delays.iter().all(|d| d.id.is_some()));

    assert!(store.delays_for(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_delay_rejects_out_of_range_impact() {
    let (_dir, store) = create_test_store().await;
    store
        .create_ticket(&TicketBuilder::new("D-9").build())
        .await
        .unwrap();

    let err = store
        .add_delay(&delay("D-9", DelayStatus::Pending, 30, 11))
        .await
        .unwrap_err();
    assert!(matches!(err, SlaError::Validation(_)));
}

#[tokio::test]
async fn test_update_status() {
    let (_dir, store) = create_test_store().await;
    let ticket = TicketBuilder::new("U-1").build();
    store.create_ticket(&ticket).await.unwrap();

    store
        .update_ticket_status(&ticket.id, TicketStatus::InProgress, Some(SlaStatus::AtRisk))
        .await
        .unwrap();
    let loaded = store.get_ticket(&ticket.id).await.unwrap();
    assert_eq!(loaded.status, TicketStatus::InProgress);
    assert_eq!(loaded.sla_status, SlaStatus::AtRisk);

    let err = store
        .update_ticket_status(&TicketId::new("U-404"), TicketStatus::Closed, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SlaError::TicketNotFound(_)));
}

#[tokio::test]
async fn test_escalations_filter_by_status() {
    let (_dir, store) = create_test_store().await;
    store
        .create_ticket(&TicketBuilder::new("E-1").sla(SlaStatus::Breached, 200).build())
        .await
        .unwrap();

    for (level, status) in [(1, EscalationStatus::Resolved), (3, EscalationStatus::Active)] {
        store
            .record_escalation(&EscalationRecord {
                id: None,
                ticket_id: TicketId::new("E-1"),
                level,
                reason: "SLA breach".to_string(),
                escalated_at: test_now(),
                status,
                resolved_at: None,
            })
            .await
            .unwrap();
    }

    let all = store.escalations(None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].level, 3);

    let active = store
        .escalations(Some(EscalationStatus::Active))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].status, EscalationStatus::Active);
}

#[tokio::test]
async fn test_sla_metrics_aggregate() {
    let (_dir, store) = create_test_store().await;
    for ticket in [
        TicketBuilder::new("M-1").build(),
        TicketBuilder::new("M-2").build(),
        TicketBuilder::new("M-3").sla(SlaStatus::Delayed, 60).build(),
        TicketBuilder::new("M-4").sla(SlaStatus::Breached, 180).build(),
    ] {
        store.create_ticket(&ticket).await.unwrap();
    }

    let metrics = store
        .sla_metrics(test_now() - Duration::days(7))
        .await
        .unwrap();
    assert_eq!(metrics.total_tickets, 4);
    assert_eq!(metrics.within_sla, 2);
    assert_eq!(metrics.delayed, 1);
    assert_eq!(metrics.breached, 1);
    assert_eq!(metrics.compliance_rate, 50.0);
    assert_eq!(metrics.avg_delay_minutes, 60.0);
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let (dir, store) = create_test_store().await;
    store
        .create_ticket(&TicketBuilder::new("P-1").build())
        .await
        .unwrap();
    drop(store);

    let path = dir.path().join("sla_test.db").display().to_string();
    let reopened = LibsqlStore::new(ConnectionMode::Local(path)).await.unwrap();
    let ticket = reopened.get_ticket(&TicketId::new("P-1")).await.unwrap();
    assert_eq!(ticket.assigned_team, "Team A");
}
