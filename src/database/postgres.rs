use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Camp, Location, NewCamp, NewSpeaker, NewTalk, NewUser, Speaker, Talk, User,
};
use crate::database::repository::CampRepository;

const CAMP_COLUMNS: &str = "id, moniker, name, description, event_date, length, \
     address1, address2, address3, city_town, state_province, postal_code, country";

const SPEAKER_SELECT: &str = "SELECT s.id, s.camp_id, c.moniker AS camp_moniker, s.name, s.company_name, \
     s.phone_number, s.website_url, s.twitter_name, s.github_name, s.bio, s.head_shot_url, s.owner \
     FROM speakers s JOIN camps c ON c.id = s.camp_id";

const TALK_SELECT: &str = "SELECT t.id, t.speaker_id, c.moniker AS camp_moniker, t.title, t.abstract, \
     t.category, t.level, t.prerequisites, t.starting_time, t.room \
     FROM talks t JOIN speakers s ON s.id = t.speaker_id JOIN camps c ON c.id = s.camp_id";

/// sqlx-backed gateway over the tables in `migrations/`
#[derive(Clone)]
pub struct PgCampRepository {
    pool: PgPool,
}

impl PgCampRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn camp_where(&self, moniker: &str) -> Result<Option<Camp>, DatabaseError> {
        let sql = format!("SELECT {} FROM camps WHERE moniker = $1", CAMP_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(moniker)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(camp_from_row).transpose().map_err(Into::into)
    }

    async fn speakers_where_moniker(&self, moniker: &str) -> Result<Vec<Speaker>, DatabaseError> {
        let sql = format!("{} WHERE c.moniker = $1 ORDER BY s.id", SPEAKER_SELECT);
        let rows = sqlx::query(&sql).bind(moniker).fetch_all(&self.pool).await?;
        rows.iter().map(speaker_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    /// One query for the talks of every speaker, grouped back onto them
    async fn attach_talks(&self, speakers: &mut [Speaker]) -> Result<(), DatabaseError> {
        let ids: Vec<i32> = speakers.iter().map(|s| s.id).collect();
        let sql = format!("{} WHERE t.speaker_id = ANY($1) ORDER BY t.id", TALK_SELECT);
        let rows = sqlx::query(&sql).bind(&ids).fetch_all(&self.pool).await?;

        let mut by_speaker: HashMap<i32, Vec<Talk>> = HashMap::new();
        for row in &rows {
            let talk = talk_from_row(row)?;
            by_speaker.entry(talk.speaker_id).or_default().push(talk);
        }
        for speaker in speakers.iter_mut() {
            speaker.talks = Some(by_speaker.remove(&speaker.id).unwrap_or_default());
        }
        Ok(())
    }
}

fn camp_from_row(row: &PgRow) -> Result<Camp, sqlx::Error> {
    Ok(Camp {
        id: row.try_get("id")?,
        moniker: row.try_get("moniker")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        event_date: row.try_get("event_date")?,
        length: row.try_get("length")?,
        location: Location {
            address1: row.try_get("address1")?,
            address2: row.try_get("address2")?,
            address3: row.try_get("address3")?,
            city_town: row.try_get("city_town")?,
            state_province: row.try_get("state_province")?,
            postal_code: row.try_get("postal_code")?,
            country: row.try_get("country")?,
        },
        speakers: None,
    })
}

fn speaker_from_row(row: &PgRow) -> Result<Speaker, sqlx::Error> {
    Ok(Speaker {
        id: row.try_get("id")?,
        camp_id: row.try_get("camp_id")?,
        camp_moniker: row.try_get("camp_moniker")?,
        name: row.try_get("name")?,
        company_name: row.try_get("company_name")?,
        phone_number: row.try_get("phone_number")?,
        website_url: row.try_get("website_url")?,
        twitter_name: row.try_get("twitter_name")?,
        github_name: row.try_get("github_name")?,
        bio: row.try_get("bio")?,
        head_shot_url: row.try_get("head_shot_url")?,
        owner: row.try_get("owner")?,
        talks: None,
    })
}

fn talk_from_row(row: &PgRow) -> Result<Talk, sqlx::Error> {
    Ok(Talk {
        id: row.try_get("id")?,
        speaker_id: row.try_get("speaker_id")?,
        camp_moniker: row.try_get("camp_moniker")?,
        title: row.try_get("title")?,
        abstract_text: row.try_get("abstract")?,
        category: row.try_get("category")?,
        level: row.try_get("level")?,
        prerequisites: row.try_get("prerequisites")?,
        starting_time: row.try_get("starting_time")?,
        room: row.try_get("room")?,
    })
}

fn map_write_error(e: sqlx::Error, what: &str) -> DatabaseError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return DatabaseError::Duplicate(format!("{} already exists", what));
        }
        if db.is_foreign_key_violation() {
            return DatabaseError::MissingParent(format!("Parent of {} does not exist", what));
        }
    }
    DatabaseError::Sqlx(e)
}

#[async_trait]
impl CampRepository for PgCampRepository {
    async fn get_all_camps(&self) -> Result<Vec<Camp>, DatabaseError> {
        let sql = format!("SELECT {} FROM camps ORDER BY event_date DESC, id", CAMP_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(camp_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    async fn get_camp_by_moniker(&self, moniker: &str) -> Result<Option<Camp>, DatabaseError> {
        self.camp_where(moniker).await
    }

    async fn get_camp_by_moniker_with_speakers(&self, moniker: &str) -> Result<Option<Camp>, DatabaseError> {
        let Some(mut camp) = self.camp_where(moniker).await? else {
            return Ok(None);
        };
        camp.speakers = Some(self.speakers_where_moniker(moniker).await?);
        Ok(Some(camp))
    }

    async fn add_camp(&self, camp: NewCamp) -> Result<Camp, DatabaseError> {
        let row = sqlx::query(
            r#"INSERT INTO camps (moniker, name, description, event_date, length,
                   address1, address2, address3, city_town, state_province, postal_code, country)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
               RETURNING id"#,
        )
        .bind(&camp.moniker)
        .bind(&camp.name)
        .bind(&camp.description)
        .bind(camp.event_date)
        .bind(camp.length)
        .bind(&camp.location.address1)
        .bind(&camp.location.address2)
        .bind(&camp.location.address3)
        .bind(&camp.location.city_town)
        .bind(&camp.location.state_province)
        .bind(&camp.location.postal_code)
        .bind(&camp.location.country)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &format!("Camp moniker '{}'", camp.moniker)))?;

        let id: i32 = row.try_get("id")?;
        Ok(camp.into_camp(id))
    }

    async fn update_camp(&self, camp: &Camp) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"UPDATE camps SET name = $2, description = $3, event_date = $4, length = $5,
                   address1 = $6, address2 = $7, address3 = $8, city_town = $9,
                   state_province = $10, postal_code = $11, country = $12
               WHERE id = $1"#,
        )
        .bind(camp.id)
        .bind(&camp.name)
        .bind(&camp.description)
        .bind(camp.event_date)
        .bind(camp.length)
        .bind(&camp.location.address1)
        .bind(&camp.location.address2)
        .bind(&camp.location.address3)
        .bind(&camp.location.city_town)
        .bind(&camp.location.state_province)
        .bind(&camp.location.postal_code)
        .bind(&camp.location.country)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_camp(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM camps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_speakers_by_moniker(&self, moniker: &str) -> Result<Vec<Speaker>, DatabaseError> {
        self.speakers_where_moniker(moniker).await
    }

    async fn get_speakers_by_moniker_with_talks(&self, moniker: &str) -> Result<Vec<Speaker>, DatabaseError> {
        let mut speakers = self.speakers_where_moniker(moniker).await?;
        self.attach_talks(&mut speakers).await?;
        Ok(speakers)
    }

    async fn get_speaker(&self, id: i32) -> Result<Option<Speaker>, DatabaseError> {
        let sql = format!("{} WHERE s.id = $1", SPEAKER_SELECT);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(speaker_from_row).transpose().map_err(Into::into)
    }

    async fn get_speaker_with_talks(&self, id: i32) -> Result<Option<Speaker>, DatabaseError> {
        let Some(speaker) = self.get_speaker(id).await? else {
            return Ok(None);
        };
        let mut speakers = [speaker];
        self.attach_talks(&mut speakers).await?;
        let [speaker] = speakers;
        Ok(Some(speaker))
    }

    async fn add_speaker(&self, speaker: NewSpeaker) -> Result<Speaker, DatabaseError> {
        let row = sqlx::query(
            r#"INSERT INTO speakers (camp_id, name, company_name, phone_number, website_url,
                   twitter_name, github_name, bio, head_shot_url, owner)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING id"#,
        )
        .bind(speaker.camp_id)
        .bind(&speaker.name)
        .bind(&speaker.company_name)
        .bind(&speaker.phone_number)
        .bind(&speaker.website_url)
        .bind(&speaker.twitter_name)
        .bind(&speaker.github_name)
        .bind(&speaker.bio)
        .bind(&speaker.head_shot_url)
        .bind(&speaker.owner)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "speaker"))?;

        let id: i32 = row.try_get("id")?;
        self.get_speaker(id)
            .await?
            .ok_or_else(|| DatabaseError::QueryError(format!("speaker {} vanished after insert", id)))
    }

    async fn update_speaker(&self, speaker: &Speaker) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"UPDATE speakers SET name = $2, company_name = $3, phone_number = $4, website_url = $5,
                   twitter_name = $6, github_name = $7, bio = $8, head_shot_url = $9
               WHERE id = $1"#,
        )
        .bind(speaker.id)
        .bind(&speaker.name)
        .bind(&speaker.company_name)
        .bind(&speaker.phone_number)
        .bind(&speaker.website_url)
        .bind(&speaker.twitter_name)
        .bind(&speaker.github_name)
        .bind(&speaker.bio)
        .bind(&speaker.head_shot_url)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_speaker(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM speakers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_talks(&self, speaker_id: i32) -> Result<Vec<Talk>, DatabaseError> {
        let sql = format!("{} WHERE t.speaker_id = $1 ORDER BY t.id", TALK_SELECT);
        let rows = sqlx::query(&sql).bind(speaker_id).fetch_all(&self.pool).await?;
        rows.iter().map(talk_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    async fn get_talk(&self, id: i32) -> Result<Option<Talk>, DatabaseError> {
        let sql = format!("{} WHERE t.id = $1", TALK_SELECT);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(talk_from_row).transpose().map_err(Into::into)
    }

    async fn add_talk(&self, talk: NewTalk) -> Result<Talk, DatabaseError> {
        let row = sqlx::query(
            r#"INSERT INTO talks (speaker_id, title, abstract, category, level, prerequisites, starting_time, room)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING id"#,
        )
        .bind(talk.speaker_id)
        .bind(&talk.title)
        .bind(&talk.abstract_text)
        .bind(&talk.category)
        .bind(talk.level)
        .bind(&talk.prerequisites)
        .bind(talk.starting_time)
        .bind(&talk.room)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "talk"))?;

        let id: i32 = row.try_get("id")?;
        self.get_talk(id)
            .await?
            .ok_or_else(|| DatabaseError::QueryError(format!("talk {} vanished after insert", id)))
    }

    async fn update_talk(&self, talk: &Talk) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"UPDATE talks SET title = $2, abstract = $3, category = $4, level = $5,
                   prerequisites = $6, starting_time = $7, room = $8
               WHERE id = $1"#,
        )
        .bind(talk.id)
        .bind(&talk.title)
        .bind(&talk.abstract_text)
        .bind(&talk.category)
        .bind(talk.level)
        .bind(&talk.prerequisites)
        .bind(talk.starting_time)
        .bind(&talk.room)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_talk(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM talks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, first_name, last_name, claims
             FROM users
             WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn add_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let created = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, password_hash, first_name, last_name, claims)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, username, password_hash, first_name, last_name, claims"#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.claims)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &format!("User '{}'", user.username)))?;
        Ok(created)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
