use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::roles::Role;
use crate::users::repo::{AdminUpdate, ProfileUpdate, User};

/// Outward user projection. Built from a row, never carries the hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub father_name: String,
    pub educational_qualification: String,
    pub profession: String,
    pub village: String,
    #[serde(rename = "union")]
    pub union_name: String,
    pub upazila: String,
    pub district: String,
    pub election_seat_no: String,
    pub phone_number: String,
    pub favorite_party: String,
    pub facebook_id: Option<String>,
    pub role: Role,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            father_name: u.father_name,
            educational_qualification: u.educational_qualification,
            profession: u.profession,
            village: u.village,
            union_name: u.union_name,
            upazila: u.upazila,
            district: u.district,
            election_seat_no: u.election_seat_no,
            phone_number: u.phone_number,
            favorite_party: u.favorite_party,
            facebook_id: u.facebook_id,
            role: u.role,
            is_active: u.is_active,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Narrow projection used in the dashboard's recent-users list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for RecentUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            full_name: u.full_name,
            email: u.email,
            role: u.role,
            is_active: u.is_active,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: i64,
    pub active_users: i64,
    pub inactive_users: i64,
    pub recent_users: Vec<RecentUser>,
}

/// Admin-initiated creation: email/password/fullName required, everything
/// else defaulted, role selectable.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub educational_qualification: Option<String>,
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default, rename = "union")]
    pub union_name: Option<String>,
    #[serde(default)]
    pub upazila: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub election_seat_no: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub favorite_party: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Admin PATCH body: any field, absent ones untouched. A supplied password
/// is re-hashed before it reaches the datastore.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub father_name: Option<String>,
    pub educational_qualification: Option<String>,
    pub profession: Option<String>,
    pub village: Option<String>,
    #[serde(rename = "union")]
    pub union_name: Option<String>,
    pub upazila: Option<String>,
    pub district: Option<String>,
    pub election_seat_no: Option<String>,
    pub phone_number: Option<String>,
    pub favorite_party: Option<String>,
    pub facebook_id: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Self-service PUT body. Only the profile allow-list is representable;
/// role, email, and the active flag do not exist on this type, so they
/// cannot be changed through this path no matter what the client sends.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub father_name: Option<String>,
    pub educational_qualification: Option<String>,
    pub profession: Option<String>,
    pub village: Option<String>,
    #[serde(rename = "union")]
    pub union_name: Option<String>,
    pub upazila: Option<String>,
    pub district: Option<String>,
    pub election_seat_no: Option<String>,
    pub phone_number: Option<String>,
    pub favorite_party: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(r: UpdateProfileRequest) -> Self {
        Self {
            full_name: r.full_name,
            father_name: r.father_name,
            educational_qualification: r.educational_qualification,
            profession: r.profession,
            village: r.village,
            union_name: r.union_name,
            upazila: r.upazila,
            district: r.district,
            election_seat_no: r.election_seat_no,
            phone_number: r.phone_number,
            favorite_party: r.favorite_party,
        }
    }
}

impl UpdateUserRequest {
    /// Split into the repo-level update; the caller hashes the password.
    pub fn into_admin_update(self, password_hash: Option<String>) -> AdminUpdate {
        AdminUpdate {
            email: self.email,
            password_hash,
            profile: ProfileUpdate {
                full_name: self.full_name,
                father_name: self.father_name,
                educational_qualification: self.educational_qualification,
                profession: self.profession,
                village: self.village,
                union_name: self.union_name,
                upazila: self.upazila,
                district: self.district,
                election_seat_no: self.election_seat_no,
                phone_number: self.phone_number,
                favorite_party: self.favorite_party,
            },
            facebook_id: self.facebook_id,
            role: self.role,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleStatusRequest {
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "voter@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            full_name: "Rahim Uddin".into(),
            father_name: "Karim Uddin".into(),
            educational_qualification: "BA".into(),
            profession: "Teacher".into(),
            village: "Charpara".into(),
            union_name: "Sadar".into(),
            upazila: "Mymensingh Sadar".into(),
            district: "Mymensingh".into(),
            election_seat_no: "157".into(),
            phone_number: "01700000000".into(),
            favorite_party: "Independent".into(),
            facebook_id: None,
            role: Role::User,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn public_user_never_serializes_the_hash() {
        let public: PublicUser = sample_user().into();
        let json = serde_json::to_value(&public).unwrap();
        let text = json.to_string();
        assert!(!text.contains("password"));
        assert!(!text.contains("argon2"));
        assert_eq!(json["fullName"], "Rahim Uddin");
        assert_eq!(json["union"], "Sadar");
        assert_eq!(json["isActive"], true);
    }

    #[test]
    fn recent_user_projection_is_narrow() {
        let recent: RecentUser = sample_user().into();
        let json = serde_json::to_value(&recent).unwrap();
        assert!(json.get("district").is_none());
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn profile_update_ignores_privileged_fields() {
        // role/isActive/email are not part of the allow-list type; sending
        // them is harmless because serde drops unknown fields.
        let req: UpdateProfileRequest = serde_json::from_str(
            r#"{"fullName":"New Name","role":"admin","isActive":false,"email":"x@y.z"}"#,
        )
        .unwrap();
        let update: ProfileUpdate = req.into();
        assert_eq!(update.full_name.as_deref(), Some("New Name"));
    }

    #[test]
    fn stats_response_wire_shape() {
        let stats = StatsResponse {
            total_users: 7,
            active_users: 5,
            inactive_users: 2,
            recent_users: vec![sample_user().into()],
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalUsers"], 7);
        assert_eq!(json["activeUsers"], 5);
        assert_eq!(json["inactiveUsers"], 2);
        assert_eq!(json["recentUsers"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn update_user_request_accepts_partial_bodies() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"isActive":false,"role":"admin"}"#).unwrap();
        assert_eq!(req.is_active, Some(false));
        assert_eq!(req.role, Some(Role::Admin));
        assert!(req.email.is_none());
    }
}
