use crate::util::{decode_enum, encode_enum, from_rfc3339, from_sql_count, map_err, to_rfc3339};
use chrono::Utc;
use gw_core::GatewayError;
use gw_core::teams::TeamRepository;
use gw_core::types::{CreateTeamInput, Team, TeamId};
use rusqlite::{Connection, OptionalExtension};

pub struct TeamRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> TeamRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

const SELECT_TEAM: &str = "SELECT id, name, plan, created_at FROM teams";

impl TeamRepository for TeamRepo<'_> {
    fn create(&self, input: CreateTeamInput) -> Result<Team, GatewayError> {
        let team = Team {
            id: TeamId::generate(),
            name: input.name,
            plan: input.plan,
            created_at: Utc::now(),
        };
        self.conn
            .execute(
                "INSERT INTO teams (id, name, plan, created_at) VALUES (?1, ?2, ?3, ?4)",
                (
                    team.id.as_str(),
                    &team.name,
                    encode_enum(&team.plan)?,
                    to_rfc3339(&team.created_at),
                ),
            )
            .map_err(map_err)?;
        Ok(team)
    }

    fn get(&self, id: &TeamId) -> Result<Option<Team>, GatewayError> {
        let sql = format!("{SELECT_TEAM} WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, [id.as_str()], read_columns)
            .optional()
            .map_err(map_err)?;
        row.map(map_team_row).transpose()
    }

    fn list(&self) -> Result<Vec<Team>, GatewayError> {
        let sql = format!("{SELECT_TEAM} ORDER BY created_at ASC, id ASC");
        let mut stmt = self.conn.prepare(&sql).map_err(map_err)?;
        let rows = stmt
            .query_map([], read_columns)
            .map_err(map_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_err)?;
        rows.into_iter().map(map_team_row).collect()
    }

    fn delete(&self, id: &TeamId) -> Result<bool, GatewayError> {
        let changed = self
            .conn
            .execute("DELETE FROM teams WHERE id = ?1", [id.as_str()])
            .map_err(map_err)?;
        Ok(changed > 0)
    }

    fn count(&self) -> Result<u64, GatewayError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM teams", [], |row| row.get(0))
            .map_err(map_err)?;
        Ok(from_sql_count(count)?)
    }
}

type TeamColumns = (String, String, String, String);

fn read_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<TeamColumns> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn map_team_row((id, name, plan, created_at): TeamColumns) -> Result<Team, GatewayError> {
    Ok(Team {
        id: TeamId::new(id).map_err(map_err)?,
        name,
        plan: decode_enum(&plan)?,
        created_at: from_rfc3339(&created_at)?,
    })
}
