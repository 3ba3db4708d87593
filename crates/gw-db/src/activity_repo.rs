use crate::util::{
    decode_json, encode_json, from_rfc3339, from_sql_count, map_err, to_rfc3339, to_sql_count,
};
use gw_core::GatewayError;
use gw_core::activity::ActivityRepository;
use gw_core::types::{
    ActivityEvent, ActivityId, ActivityStats, FeedEntry, NewActivity, NewTrace, RequestTrace,
    ServerId, TeamId, TraceRecordId,
};
use rusqlite::{Connection, OptionalExtension};

pub struct ActivityRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> ActivityRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

const SELECT_ENTRY: &str = "SELECT e.id, e.server_id, e.agent_name, e.tool_name, e.status, \
                            e.latency_ms, e.created_at, s.team_id, s.name \
                            FROM activity_events e JOIN servers s ON s.id = e.server_id";

impl ActivityRepository for ActivityRepo<'_> {
    fn insert_event(&self, event: NewActivity) -> Result<ActivityEvent, GatewayError> {
        let event = ActivityEvent {
            id: ActivityId::generate(),
            server_id: event.server_id,
            agent_name: event.agent_name,
            tool_name: event.tool_name,
            status: event.status,
            latency_ms: event.latency_ms,
            created_at: event.created_at,
        };
        let latency = event.latency_ms.map(to_sql_count).transpose()?;
        self.conn
            .execute(
                "INSERT INTO activity_events (id, server_id, agent_name, tool_name, status, \
                 latency_ms, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                (
                    event.id.as_str(),
                    event.server_id.as_str(),
                    event.agent_name.as_deref(),
                    &event.tool_name,
                    event.status.as_str(),
                    latency,
                    to_rfc3339(&event.created_at),
                ),
            )
            .map_err(map_err)?;
        Ok(event)
    }

    fn insert_trace(&self, trace: NewTrace) -> Result<RequestTrace, GatewayError> {
        let trace = RequestTrace {
            id: TraceRecordId::generate(),
            activity_id: trace.activity_id,
            request_payload: trace.request_payload,
            response_payload: trace.response_payload,
            trace_id: trace.trace_id,
            created_at: trace.created_at,
        };
        let request = trace.request_payload.as_ref().map(encode_json).transpose()?;
        let response = trace.response_payload.as_ref().map(encode_json).transpose()?;
        self.conn
            .execute(
                "INSERT INTO request_traces (id, activity_id, request_json, response_json, \
                 trace_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (
                    trace.id.as_str(),
                    trace.activity_id.as_str(),
                    request,
                    response,
                    &trace.trace_id,
                    to_rfc3339(&trace.created_at),
                ),
            )
            .map_err(map_err)?;
        Ok(trace)
    }

    fn recent_for_team(
        &self,
        team_id: &TeamId,
        limit: u32,
    ) -> Result<Vec<FeedEntry>, GatewayError> {
        let sql = format!(
            "{SELECT_ENTRY} WHERE s.team_id = ?1 ORDER BY e.created_at DESC, e.rowid DESC LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(map_err)?;
        let rows = stmt
            .query_map((team_id.as_str(), limit), read_entry_columns)
            .map_err(map_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_err)?;
        rows.into_iter().map(map_entry_row).collect()
    }

    fn get_event(&self, id: &ActivityId) -> Result<Option<FeedEntry>, GatewayError> {
        let sql = format!("{SELECT_ENTRY} WHERE e.id = ?1");
        let row = self
            .conn
            .query_row(&sql, [id.as_str()], read_entry_columns)
            .optional()
            .map_err(map_err)?;
        row.map(map_entry_row).transpose()
    }

    fn traces_for(&self, id: &ActivityId) -> Result<Vec<RequestTrace>, GatewayError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, activity_id, request_json, response_json, trace_id, created_at \
                 FROM request_traces WHERE activity_id = ?1 ORDER BY created_at ASC, rowid ASC",
            )
            .map_err(map_err)?;
        let rows = stmt
            .query_map([id.as_str()], read_trace_columns)
            .map_err(map_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_err)?;
        rows.into_iter().map(map_trace_row).collect()
    }

    fn stats(&self) -> Result<ActivityStats, GatewayError> {
        let (total, succeeded): (i64, i64) = self
            .conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = 'success' THEN 1 ELSE 0 END), 0) \
                 FROM activity_events",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(map_err)?;
        Ok(ActivityStats {
            total: from_sql_count(total)?,
            succeeded: from_sql_count(succeeded)?,
        })
    }
}

type EntryColumns = (
    String,
    String,
    Option<String>,
    String,
    String,
    Option<i64>,
    String,
    String,
    String,
);

fn read_entry_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn map_entry_row(columns: EntryColumns) -> Result<FeedEntry, GatewayError> {
    let (id, server_id, agent_name, tool_name, status, latency, created_at, team_id, server_name) =
        columns;
    Ok(FeedEntry {
        event: ActivityEvent {
            id: ActivityId::new(id).map_err(map_err)?,
            server_id: ServerId::new(server_id).map_err(map_err)?,
            agent_name,
            tool_name,
            status: status.parse().map_err(map_err)?,
            latency_ms: latency.map(from_sql_count).transpose()?,
            created_at: from_rfc3339(&created_at)?,
        },
        team_id: TeamId::new(team_id).map_err(map_err)?,
        server_name,
    })
}

type TraceColumns = (String, String, Option<String>, Option<String>, String, String);

fn read_trace_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<TraceColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn map_trace_row(columns: TraceColumns) -> Result<RequestTrace, GatewayError> {
    let (id, activity_id, request, response, trace_id, created_at) = columns;
    Ok(RequestTrace {
        id: TraceRecordId::new(id).map_err(map_err)?,
        activity_id: ActivityId::new(activity_id).map_err(map_err)?,
        request_payload: request.as_deref().map(decode_json).transpose()?,
        response_payload: response.as_deref().map(decode_json).transpose()?,
        trace_id,
        created_at: from_rfc3339(&created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::with_test_db;
    use crate::server_repo::ServerRepo;
    use crate::team_repo::TeamRepo;
    use chrono::{Duration, TimeZone, Utc};
    use gw_core::servers::ServerRepository;
    use gw_core::teams::TeamRepository;
    use gw_core::types::{
        ActivityStatus, CreateTeamInput, RegisterServerInput, ServerKind, TeamPlan,
    };
    use serde_json::json;

    fn team_with_server(conn: &Connection, name: &str) -> (TeamId, ServerId) {
        let team = TeamRepo::new(conn)
            .create(CreateTeamInput {
                name: name.to_string(),
                plan: TeamPlan::Free,
            })
            .unwrap();
        let server = ServerRepo::new(conn)
            .create(RegisterServerInput {
                team_id: team.id.clone(),
                name: format!("{name}-slack"),
                kind: ServerKind::Chat,
                config: json!({}),
            })
            .unwrap();
        (team.id, server.id)
    }

    fn event(server_id: &ServerId, offset_secs: i64, status: ActivityStatus) -> NewActivity {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        NewActivity {
            server_id: server_id.clone(),
            agent_name: Some("agent".to_string()),
            tool_name: "post_message".to_string(),
            status,
            latency_ms: Some(12),
            created_at: base + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn recent_is_team_scoped_and_newest_first() {
        let conn = with_test_db().unwrap();
        let (team_a, server_a) = team_with_server(&conn, "acme");
        let (_team_b, server_b) = team_with_server(&conn, "globex");
        let repo = ActivityRepo::new(&conn);
        for i in 0..12 {
            let server = if i % 2 == 0 || i == 11 { &server_a } else { &server_b };
            repo.insert_event(event(server, i, ActivityStatus::Success))
                .unwrap();
        }

        let entries = repo.recent_for_team(&team_a, 10).unwrap();
        assert_eq!(entries.len(), 7);
        assert!(entries.iter().all(|e| e.team_id == team_a));
        assert_eq!(entries[0].server_name, "acme-slack");
        assert!(
            entries
                .windows(2)
                .all(|pair| pair[0].event.created_at >= pair[1].event.created_at)
        );
        assert_eq!(repo.recent_for_team(&team_a, 3).unwrap().len(), 3);
    }

    #[test]
    fn traces_attach_to_their_event() {
        let conn = with_test_db().unwrap();
        let (_team, server) = team_with_server(&conn, "acme");
        let repo = ActivityRepo::new(&conn);
        let stored = repo
            .insert_event(event(&server, 0, ActivityStatus::Error))
            .unwrap();
        repo.insert_trace(NewTrace {
            activity_id: stored.id.clone(),
            request_payload: Some(json!({"channel": "C1"})),
            response_payload: None,
            trace_id: "trace_1714557600.000000".to_string(),
            created_at: stored.created_at,
        })
        .unwrap();

        let entry = repo.get_event(&stored.id).unwrap().unwrap();
        assert_eq!(entry.event, stored);
        let traces = repo.traces_for(&stored.id).unwrap();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].request_payload, Some(json!({"channel": "C1"})));
        assert_eq!(traces[0].response_payload, None);
        assert!(repo.get_event(&ActivityId::generate()).unwrap().is_none());
    }

    #[test]
    fn trace_for_missing_event_is_rejected() {
        let conn = with_test_db().unwrap();
        let repo = ActivityRepo::new(&conn);
        let result = repo.insert_trace(NewTrace {
            activity_id: ActivityId::generate(),
            request_payload: Some(json!({})),
            response_payload: None,
            trace_id: "trace_0.000000".to_string(),
            created_at: Utc::now(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn stats_count_successes() {
        let conn = with_test_db().unwrap();
        let repo = ActivityRepo::new(&conn);
        assert_eq!(repo.stats().unwrap(), ActivityStats::default());

        let (_team, server) = team_with_server(&conn, "acme");
        repo.insert_event(event(&server, 0, ActivityStatus::Success))
            .unwrap();
        repo.insert_event(event(&server, 1, ActivityStatus::Error))
            .unwrap();
        repo.insert_event(event(&server, 2, ActivityStatus::Pending))
            .unwrap();
        let stats = repo.stats().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.succeeded, 1);
    }
}
