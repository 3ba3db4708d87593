use crate::util::{
    decode_enum, decode_json, encode_enum, encode_json, from_rfc3339, from_sql_count, map_err,
    to_rfc3339,
};
use chrono::Utc;
use gw_core::GatewayError;
use gw_core::error::ServerError;
use gw_core::servers::ServerRepository;
use gw_core::types::{
    RegisterServerInput, Server, ServerId, ServerKind, ServerStatus, TeamId,
};
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;

pub struct ServerRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> ServerRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Server>, GatewayError> {
        let mut stmt = self.conn.prepare(sql).map_err(map_err)?;
        let rows = stmt
            .query_map(params, read_columns)
            .map_err(map_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_err)?;
        rows.into_iter().map(map_server_row).collect()
    }
}

const SELECT_SERVER: &str = "SELECT id, team_id, name, kind, status, config_json, created_at, \
                             updated_at FROM servers";

impl ServerRepository for ServerRepo<'_> {
    fn create(&self, input: RegisterServerInput) -> Result<Server, GatewayError> {
        let now = Utc::now();
        let config = if input.config.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            input.config
        };
        let server = Server {
            id: ServerId::generate(),
            team_id: input.team_id,
            name: input.name.trim().to_string(),
            kind: input.kind,
            status: ServerStatus::Active,
            config,
            created_at: now,
            updated_at: now,
        };
        self.conn
            .execute(
                "INSERT INTO servers (id, team_id, name, kind, status, config_json, created_at, \
                 updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                (
                    server.id.as_str(),
                    server.team_id.as_str(),
                    &server.name,
                    encode_enum(&server.kind)?,
                    encode_enum(&server.status)?,
                    encode_json(&server.config)?,
                    to_rfc3339(&server.created_at),
                    to_rfc3339(&server.updated_at),
                ),
            )
            .map_err(map_err)?;
        Ok(server)
    }

    fn get(&self, id: &ServerId) -> Result<Option<Server>, GatewayError> {
        let sql = format!("{SELECT_SERVER} WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, [id.as_str()], read_columns)
            .optional()
            .map_err(map_err)?;
        row.map(map_server_row).transpose()
    }

    fn list_for_team(&self, team_id: &TeamId) -> Result<Vec<Server>, GatewayError> {
        let sql = format!("{SELECT_SERVER} WHERE team_id = ?1 ORDER BY created_at ASC, rowid ASC");
        self.query(&sql, [team_id.as_str()])
    }

    fn find_active(
        &self,
        team_id: &TeamId,
        kind: ServerKind,
    ) -> Result<Option<Server>, GatewayError> {
        let sql = format!(
            "{SELECT_SERVER} WHERE team_id = ?1 AND kind = ?2 AND status = 'active' \
             ORDER BY created_at DESC, rowid DESC LIMIT 1"
        );
        let kind = encode_enum(&kind)?;
        Ok(self
            .query(&sql, (team_id.as_str(), kind.as_str()))?
            .into_iter()
            .next())
    }

    fn set_status(&self, id: &ServerId, status: ServerStatus) -> Result<Server, GatewayError> {
        let changed = self
            .conn
            .execute(
                "UPDATE servers SET status = ?1, updated_at = ?2 WHERE id = ?3",
                (encode_enum(&status)?, to_rfc3339(&Utc::now()), id.as_str()),
            )
            .map_err(map_err)?;
        if changed == 0 {
            return Err(ServerError::NotFound.into());
        }
        self.get(id)?.ok_or_else(|| ServerError::NotFound.into())
    }

    fn delete(&self, id: &ServerId) -> Result<bool, GatewayError> {
        let changed = self
            .conn
            .execute("DELETE FROM servers WHERE id = ?1", [id.as_str()])
            .map_err(map_err)?;
        Ok(changed > 0)
    }

    fn count_active(&self) -> Result<u64, GatewayError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM servers WHERE status = 'active'",
                [],
                |row| row.get(0),
            )
            .map_err(map_err)?;
        Ok(from_sql_count(count)?)
    }
}

type ServerColumns = (String, String, String, String, String, String, String, String);

fn read_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<ServerColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn map_server_row(columns: ServerColumns) -> Result<Server, GatewayError> {
    let (id, team_id, name, kind, status, config_json, created_at, updated_at) = columns;
    Ok(Server {
        id: ServerId::new(id).map_err(map_err)?,
        team_id: TeamId::new(team_id).map_err(map_err)?,
        name,
        kind: decode_enum(&kind)?,
        status: decode_enum(&status)?,
        config: decode_json(&config_json)?,
        created_at: from_rfc3339(&created_at)?,
        updated_at: from_rfc3339(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::with_test_db;
    use crate::team_repo::TeamRepo;
    use gw_core::teams::TeamRepository;
    use gw_core::types::{CreateTeamInput, TeamPlan};
    use serde_json::json;

    fn team(conn: &Connection) -> TeamId {
        TeamRepo::new(conn)
            .create(CreateTeamInput {
                name: "acme".to_string(),
                plan: TeamPlan::Free,
            })
            .unwrap()
            .id
    }

    fn register(repo: &ServerRepo<'_>, team_id: &TeamId, name: &str, kind: ServerKind) -> Server {
        repo.create(RegisterServerInput {
            team_id: team_id.clone(),
            name: name.to_string(),
            kind,
            config: json!({"base_url": "http://localhost:5678"}),
        })
        .unwrap()
    }

    #[test]
    fn config_survives_storage() {
        let conn = with_test_db().unwrap();
        let team_id = team(&conn);
        let repo = ServerRepo::new(&conn);
        let server = register(&repo, &team_id, "n8n", ServerKind::Workflow);

        let loaded = repo.get(&server.id).unwrap().unwrap();
        assert_eq!(loaded.config_str("base_url"), Some("http://localhost:5678"));
        assert_eq!(loaded.status, ServerStatus::Active);
        assert_eq!(repo.list_for_team(&team_id).unwrap().len(), 1);
    }

    #[test]
    fn find_active_prefers_newest_active() {
        let conn = with_test_db().unwrap();
        let team_id = team(&conn);
        let repo = ServerRepo::new(&conn);
        let first = register(&repo, &team_id, "slack-a", ServerKind::Chat);
        let second = register(&repo, &team_id, "slack-b", ServerKind::Chat);
        register(&repo, &team_id, "n8n", ServerKind::Workflow);

        let found = repo.find_active(&team_id, ServerKind::Chat).unwrap().unwrap();
        assert_eq!(found.id, second.id);

        repo.set_status(&second.id, ServerStatus::Inactive).unwrap();
        let found = repo.find_active(&team_id, ServerKind::Chat).unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(repo.find_active(&team_id, ServerKind::Store).unwrap().is_none());
        assert_eq!(repo.count_active().unwrap(), 2);
    }

    #[test]
    fn set_status_on_missing_server_is_not_found() {
        let conn = with_test_db().unwrap();
        let repo = ServerRepo::new(&conn);
        let err = repo
            .set_status(&ServerId::generate(), ServerStatus::Error)
            .unwrap_err();
        assert!(matches!(err, GatewayError::Server(ServerError::NotFound)));
    }

    #[test]
    fn unknown_team_is_rejected_by_foreign_key() {
        let conn = with_test_db().unwrap();
        let repo = ServerRepo::new(&conn);
        let result = repo.create(RegisterServerInput {
            team_id: TeamId::generate(),
            name: "slack".to_string(),
            kind: ServerKind::Chat,
            config: json!({}),
        });
        assert!(result.is_err());
    }
}
