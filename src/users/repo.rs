use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::roles::Role;

/// Full user row. Deliberately not `Serialize`: anything that goes over the
/// wire must pass through a DTO that has no hash field.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub father_name: String,
    pub educational_qualification: String,
    pub profession: String,
    pub village: String,
    pub union_name: String,
    pub upazila: String,
    pub district: String,
    pub election_seat_no: String,
    pub phone_number: String,
    pub favorite_party: String,
    pub facebook_id: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Field set for inserts. Optional profile fields default to empty strings,
/// never NULL.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub father_name: String,
    pub educational_qualification: String,
    pub profession: String,
    pub village: String,
    pub union_name: String,
    pub upazila: String,
    pub district: String,
    pub election_seat_no: String,
    pub phone_number: String,
    pub favorite_party: String,
    pub facebook_id: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

/// The fixed allow-list a user may change on their own profile. Email, role,
/// and the active flag are not representable here.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub father_name: Option<String>,
    pub educational_qualification: Option<String>,
    pub profession: Option<String>,
    pub village: Option<String>,
    pub union_name: Option<String>,
    pub upazila: Option<String>,
    pub district: Option<String>,
    pub election_seat_no: Option<String>,
    pub phone_number: Option<String>,
    pub favorite_party: Option<String>,
}

/// Admin-side update: any field, absent ones left untouched. The password
/// arrives already hashed.
#[derive(Debug, Default, Clone)]
pub struct AdminUpdate {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub profile: ProfileUpdate,
    pub facebook_id: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

const COLUMNS: &str = "id, email, password_hash, full_name, father_name, \
    educational_qualification, profession, village, union_name, upazila, \
    district, election_seat_no, phone_number, favorite_party, facebook_id, \
    role, is_active, created_at, updated_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(db: &PgPool, new: &NewUser) -> sqlx::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (
                email, password_hash, full_name, father_name,
                educational_qualification, profession, village, union_name,
                upazila, district, election_seat_no, phone_number,
                favorite_party, facebook_id, role, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.full_name)
        .bind(&new.father_name)
        .bind(&new.educational_qualification)
        .bind(&new.profession)
        .bind(&new.village)
        .bind(&new.union_name)
        .bind(&new.upazila)
        .bind(&new.district)
        .bind(&new.election_seat_no)
        .bind(&new.phone_number)
        .bind(&new.favorite_party)
        .bind(&new.facebook_id)
        .bind(new.role)
        .bind(new.is_active)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// All non-admin users, newest first.
    pub async fn list_non_admin(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE role <> 'admin' ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Total and active user counts in one pass.
    pub async fn count_by_activity(db: &PgPool) -> anyhow::Result<(i64, i64)> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM users",
        )
        .fetch_one(db)
        .await?;
        Ok(counts)
    }

    /// Most recently created users, newest first.
    pub async fn recent(db: &PgPool, limit: i64) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Apply the self-service allow-list. Absent fields keep their value.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> sqlx::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                father_name = COALESCE($3, father_name),
                educational_qualification = COALESCE($4, educational_qualification),
                profession = COALESCE($5, profession),
                village = COALESCE($6, village),
                union_name = COALESCE($7, union_name),
                upazila = COALESCE($8, upazila),
                district = COALESCE($9, district),
                election_seat_no = COALESCE($10, election_seat_no),
                phone_number = COALESCE($11, phone_number),
                favorite_party = COALESCE($12, favorite_party),
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.full_name)
        .bind(&update.father_name)
        .bind(&update.educational_qualification)
        .bind(&update.profession)
        .bind(&update.village)
        .bind(&update.union_name)
        .bind(&update.upazila)
        .bind(&update.district)
        .bind(&update.election_seat_no)
        .bind(&update.phone_number)
        .bind(&update.favorite_party)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Admin update: any column, absent ones untouched.
    pub async fn admin_update(db: &PgPool, id: Uuid, update: &AdminUpdate) -> sqlx::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                full_name = COALESCE($4, full_name),
                father_name = COALESCE($5, father_name),
                educational_qualification = COALESCE($6, educational_qualification),
                profession = COALESCE($7, profession),
                village = COALESCE($8, village),
                union_name = COALESCE($9, union_name),
                upazila = COALESCE($10, upazila),
                district = COALESCE($11, district),
                election_seat_no = COALESCE($12, election_seat_no),
                phone_number = COALESCE($13, phone_number),
                favorite_party = COALESCE($14, favorite_party),
                facebook_id = COALESCE($15, facebook_id),
                role = COALESCE($16, role),
                is_active = COALESCE($17, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.email)
        .bind(&update.password_hash)
        .bind(&update.profile.full_name)
        .bind(&update.profile.father_name)
        .bind(&update.profile.educational_qualification)
        .bind(&update.profile.profession)
        .bind(&update.profile.village)
        .bind(&update.profile.union_name)
        .bind(&update.profile.upazila)
        .bind(&update.profile.district)
        .bind(&update.profile.election_seat_no)
        .bind(&update.profile.phone_number)
        .bind(&update.profile.favorite_party)
        .bind(&update.facebook_id)
        .bind(update.role)
        .bind(update.is_active)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn set_active(db: &PgPool, id: Uuid, is_active: bool) -> sqlx::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = $2, updated_at = now() WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(is_active)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Irreversible hard delete. Returns the number of rows removed.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}
