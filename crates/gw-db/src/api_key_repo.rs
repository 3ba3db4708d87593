use crate::util::{from_rfc3339, map_err, to_rfc3339};
use chrono::Utc;
use gw_core::GatewayError;
use gw_core::api_keys::ApiKeyRepository;
use gw_core::types::{ApiKey, ApiKeyId, TeamId};
use rusqlite::{Connection, OptionalExtension};

pub struct ApiKeyRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> ApiKeyRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn find(&self, column: &str, value: &str) -> Result<Option<ApiKey>, GatewayError> {
        let sql = format!("{SELECT_KEY} WHERE {column} = ?1");
        let row = self
            .conn
            .query_row(&sql, [value], read_columns)
            .optional()
            .map_err(map_err)?;
        row.map(map_key_row).transpose()
    }
}

const SELECT_KEY: &str = "SELECT id, team_id, label, key_hash, created_at, revoked_at FROM api_keys";

impl ApiKeyRepository for ApiKeyRepo<'_> {
    fn insert(&self, key: ApiKey) -> Result<ApiKey, GatewayError> {
        self.conn
            .execute(
                "INSERT INTO api_keys (id, team_id, label, key_hash, created_at, revoked_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (
                    key.id.as_str(),
                    key.team_id.as_str(),
                    &key.label,
                    &key.key_hash,
                    to_rfc3339(&key.created_at),
                    key.revoked_at.as_ref().map(to_rfc3339),
                ),
            )
            .map_err(map_err)?;
        Ok(key)
    }

    fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, GatewayError> {
        self.find("key_hash", key_hash)
    }

    fn list_for_team(&self, team_id: &TeamId) -> Result<Vec<ApiKey>, GatewayError> {
        let sql = format!("{SELECT_KEY} WHERE team_id = ?1 ORDER BY created_at ASC, rowid ASC");
        let mut stmt = self.conn.prepare(&sql).map_err(map_err)?;
        let rows = stmt
            .query_map([team_id.as_str()], read_columns)
            .map_err(map_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_err)?;
        rows.into_iter().map(map_key_row).collect()
    }

    fn revoke(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, GatewayError> {
        self.conn
            .execute(
                "UPDATE api_keys SET revoked_at = ?1 WHERE id = ?2 AND revoked_at IS NULL",
                (to_rfc3339(&Utc::now()), id.as_str()),
            )
            .map_err(map_err)?;
        self.find("id", id.as_str())
    }
}

type KeyColumns = (String, String, String, String, String, Option<String>);

fn read_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<KeyColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn map_key_row(columns: KeyColumns) -> Result<ApiKey, GatewayError> {
    let (id, team_id, label, key_hash, created_at, revoked_at) = columns;
    Ok(ApiKey {
        id: ApiKeyId::new(id).map_err(map_err)?,
        team_id: TeamId::new(team_id).map_err(map_err)?,
        label,
        key_hash,
        created_at: from_rfc3339(&created_at)?,
        revoked_at: revoked_at.as_deref().map(from_rfc3339).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::with_test_db;
    use crate::team_repo::TeamRepo;
    use gw_core::teams::TeamRepository;
    use gw_core::types::{CreateTeamInput, TeamPlan};

    #[test]
    fn revoke_is_sticky() {
        let conn = with_test_db().unwrap();
        let team = TeamRepo::new(&conn)
            .create(CreateTeamInput {
                name: "acme".to_string(),
                plan: TeamPlan::Free,
            })
            .unwrap();
        let repo = ApiKeyRepo::new(&conn);
        let key = repo
            .insert(ApiKey {
                id: ApiKeyId::generate(),
                team_id: team.id.clone(),
                label: "ci".to_string(),
                key_hash: "abc123".to_string(),
                created_at: Utc::now(),
                revoked_at: None,
            })
            .unwrap();

        assert_eq!(repo.find_by_hash("abc123").unwrap().unwrap().id, key.id);
        assert!(repo.find_by_hash("nope").unwrap().is_none());

        let revoked = repo.revoke(&key.id).unwrap().unwrap();
        let first = revoked.revoked_at.unwrap();
        let again = repo.revoke(&key.id).unwrap().unwrap();
        assert_eq!(again.revoked_at, Some(first));
        assert_eq!(repo.list_for_team(&team.id).unwrap().len(), 1);
        assert!(repo.revoke(&ApiKeyId::generate()).unwrap().is_none());
    }
}
